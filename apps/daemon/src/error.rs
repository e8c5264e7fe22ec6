//! 启动期错误与进程退出码

use devusb_relay::{BackoffError, ChannelError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 进程退出码
pub mod exit_code {
    /// 选项错误 / 缺少设备 / 配置文件错误
    pub const USAGE: i32 = 1;
    /// 无法创建或打开输入 FIFO
    pub const CHANNEL: i32 = 2;
    /// 无法打开日志文件
    pub const LOG_SINK: i32 = 3;
    /// 另一个实例持有锁文件
    pub const LOCKED: i32 = 4;
}

/// 启动期致命错误
///
/// 进入事件循环之后不会再产生任何致命错误。
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("missing device file")]
    MissingDevice,

    #[error("{0:#}")]
    Config(anyhow::Error),

    #[error("invalid intervals: {0}")]
    Backoff(#[from] BackoffError),

    #[error("cannot open log file '{}': {source}", path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("cannot acquire lock file '{}': {source}", path.display())]
    Locked {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot start as a daemon: {0}")]
    Daemonize(#[source] io::Error),

    #[error("cannot install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::MissingDevice
            | StartupError::Config(_)
            | StartupError::Backoff(_)
            | StartupError::Daemonize(_)
            | StartupError::Signal(_) => exit_code::USAGE,
            StartupError::Channel(_) => exit_code::CHANNEL,
            StartupError::LogSink { .. } => exit_code::LOG_SINK,
            StartupError::Locked { .. } => exit_code::LOCKED,
        }
    }

    /// 是否应提示查看帮助
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            StartupError::MissingDevice | StartupError::Config(_) | StartupError::Backoff(_)
        )
    }
}
