//! 日志输出
//!
//! 每个事件一行，带时间戳和级别。默认输出到 stderr；指定日志文件时以追加方式
//! 写入，不经缓冲，进程被信号终止时也不会丢行。
//!
//! 级别：默认 info，`-D` 为 debug；设置了 `RUST_LOG` 时以它为准。

use crate::error::StartupError;
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// 日志去向
#[derive(Debug)]
pub enum LogSink {
    Stderr,
    File(File),
}

impl LogSink {
    /// 打开日志文件（追加），未指定时使用 stderr
    pub fn open(path: Option<&Path>) -> Result<Self, StartupError> {
        let Some(path) = path else {
            return Ok(LogSink::Stderr);
        };

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(LogSink::File)
            .map_err(|source| StartupError::LogSink {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// 安装全局 subscriber（进程内只调用一次）
pub fn init(sink: LogSink, debug: bool) {
    let default_level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let (writer, ansi) = match sink {
        LogSink::Stderr => (
            BoxMakeWriter::new(std::io::stderr),
            std::io::stderr().is_terminal(),
        ),
        LogSink::File(file) => (BoxMakeWriter::new(Mutex::new(file)), false),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .init();
}
