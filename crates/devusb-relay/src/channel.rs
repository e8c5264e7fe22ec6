//! 输入通道（命名管道）
//!
//! 中继自身以读写方式（`O_RDWR`）打开 FIFO：
//! - 打开时不会因为没有写端而阻塞
//! - 外部写端反复打开/关闭时，读端永远不会看到 EOF
//!
//! 可读等待使用单个描述符的 `poll(2)`。

use crate::error::ChannelError;
use crate::payload::{Payload, READ_BUFFER_SIZE};
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::os::fd::AsFd;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 一次可读等待的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// 有数据可读
    Ready,
    /// 超时，期间没有数据
    TimedOut,
}

/// 负载来源
///
/// [`EventLoop`](crate::EventLoop) 只通过这个 trait 访问输入通道。
pub trait PayloadSource {
    /// 等待可读，最多等待 `timeout`
    fn wait_readable(&mut self, timeout: Duration) -> Result<Readiness, ChannelError>;

    /// 读取一个负载（单次 read，最多 [`READ_BUFFER_SIZE`] 字节）
    fn read_payload(&mut self) -> Result<Payload, ChannelError>;

    /// 关闭通道；重复调用无副作用
    fn close(&mut self);
}

/// [`ensure_fifo`] 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FifoStatus {
    /// 新建了 FIFO
    Created,
    /// 路径已存在
    Existing,
}

/// 不存在时以 0600 权限创建 FIFO，已存在时什么都不做
///
/// 可重复调用。
pub fn ensure_fifo(path: &Path) -> Result<FifoStatus, ChannelError> {
    if fs::symlink_metadata(path).is_ok() {
        return Ok(FifoStatus::Existing);
    }

    match mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR) {
        Ok(()) => Ok(FifoStatus::Created),
        // 检查与创建之间被别人抢先创建
        Err(Errno::EEXIST) => Ok(FifoStatus::Existing),
        Err(source) => Err(ChannelError::Create {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// 输入 FIFO 句柄
///
/// 启动时打开一次，关闭哨兵到达（或进程退出）时关闭一次。
#[derive(Debug)]
pub struct InputChannel {
    path: PathBuf,
    file: Option<File>,
}

impl InputChannel {
    /// 创建（如不存在）并打开 FIFO
    ///
    /// 创建失败只记录警告，仍然尝试打开；只有打开失败才返回错误。
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ChannelError> {
        let path = path.as_ref();

        match ensure_fifo(path) {
            Ok(FifoStatus::Created) => info!("created server fifo '{}'", path.display()),
            Ok(FifoStatus::Existing) => {
                info!("server fifo '{}' already exists", path.display());
                if let Ok(meta) = fs::metadata(path)
                    && !meta.file_type().is_fifo()
                {
                    warn!("'{}' exists but is not a fifo", path.display());
                }
            },
            Err(e) => warn!("{}", e),
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| ChannelError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl PayloadSource for InputChannel {
    fn wait_readable(&mut self, timeout: Duration) -> Result<Readiness, ChannelError> {
        let file = self.file.as_ref().ok_or(ChannelError::Closed)?;

        let mut fds = [PollFd::new(file.as_fd(), PollFlags::POLLIN)];
        let timeout = poll_timeout(timeout);

        match poll(&mut fds, timeout) {
            Ok(0) => Ok(Readiness::TimedOut),
            Ok(_) => Ok(Readiness::Ready),
            Err(e) => Err(ChannelError::Poll(e)),
        }
    }

    fn read_payload(&mut self) -> Result<Payload, ChannelError> {
        let file = self.file.as_mut().ok_or(ChannelError::Closed)?;

        let mut buf = [0u8; READ_BUFFER_SIZE];
        let len = file.read(&mut buf).map_err(ChannelError::Read)?;
        Ok(Payload::new(&buf[..len]))
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            debug!("closed server fifo '{}'", self.path.display());
        }
    }
}

/// 换算成 `poll` 的毫秒超时
///
/// 不足 1ms 的非零超时向上取整，避免变成不等待；超过 i32 毫秒的按最大值处理。
fn poll_timeout(timeout: Duration) -> PollTimeout {
    let timeout = if timeout.is_zero() {
        timeout
    } else {
        timeout.max(Duration::from_millis(1))
    };
    PollTimeout::try_from(timeout).unwrap_or(PollTimeout::MAX)
}
