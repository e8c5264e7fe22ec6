//! 中继层错误类型定义
//!
//! 循环运行期间的所有错误都会被吸收为 [`WriteOutcome`](crate::WriteOutcome)
//! 或一行日志，只有启动阶段的 [`ChannelError`] 会传播给调用方。

use nix::errno::Errno;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 单次设备写入的失败原因
#[derive(Error, Debug)]
pub enum DeviceError {
    /// 打开设备文件失败（设备拔出、权限不足等）
    #[error("cannot open device file: {0}")]
    Open(#[source] io::Error),

    /// 读取或应用 termios 属性失败（清除 HUPCL / 设置波特率）
    #[error("cannot clear HUPCL of device file: {0}")]
    ClearHupcl(#[source] Errno),

    /// 负载为空：只做了属性设置，不算一次发送
    #[error("empty payload, nothing written")]
    EmptyPayload,

    /// 写入失败
    #[error("write to device file: {0}")]
    Write(#[source] io::Error),

    /// 单次写入未写完全部字节
    #[error("short write to device file: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
}

/// 输入通道（FIFO）错误
#[derive(Error, Debug)]
pub enum ChannelError {
    /// mkfifo 失败
    #[error("unable to create server fifo '{}': {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: Errno,
    },

    /// 以读写方式打开 FIFO 失败（启动期致命错误）
    #[error("unable to open server fifo '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 通道已关闭
    #[error("server fifo already closed")]
    Closed,

    /// poll 失败（瞬时错误，循环继续）
    #[error("poll: {0}")]
    Poll(#[source] Errno),

    /// read 失败
    #[error("read from server fifo: {0}")]
    Read(#[source] io::Error),
}
