//! 测试公共设施
//!
//! - `MockSource` / `MockDevice`：按脚本驱动事件循环
//! - `LogCapture`：收集 tracing 输出
//! - `Pty`：用伪终端代替真实串口

#![allow(dead_code)]

use devusb_relay::{
    BackoffPolicy, ChannelError, Device, KeepaliveLogPolicy, Payload, PayloadSource, Readiness,
    RelayConfig, WriteOutcome,
};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::pty::{PtyMaster, grantpt, posix_openpt, unlockpt};
use nix::sys::termios::{self, SetArg};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

pub const LONG: Duration = Duration::from_secs(60);
pub const SHORT: Duration = Duration::from_secs(5);

pub fn test_config(policy: KeepaliveLogPolicy) -> RelayConfig {
    let mut config = RelayConfig::new("/dev/ttyMOCK0");
    config.keepalive_log = policy;
    config.backoff = BackoffPolicy::new(LONG, SHORT).unwrap();
    config
}

// ==================== Mock 输入通道 ====================

/// 输入通道脚本事件
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// 可读，随后 read 得到这些字节
    Payload(Vec<u8>),
    /// 可读，但 read 失败
    ReadError,
    /// 等待超时
    Timeout,
    /// poll 失败
    WaitError,
}

impl SourceEvent {
    pub fn payload(bytes: impl AsRef<[u8]>) -> Self {
        Self::Payload(bytes.as_ref().to_vec())
    }
}

/// 脚本耗尽后报告 `Closed`，循环随之结束
#[derive(Debug, Default)]
pub struct MockSource {
    script: VecDeque<SourceEvent>,
    pending: Option<SourceEvent>,
    /// 每次 wait_readable 收到的超时
    pub timeouts: Vec<Duration>,
    pub closed: bool,
}

impl MockSource {
    pub fn new(script: impl IntoIterator<Item = SourceEvent>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl PayloadSource for MockSource {
    fn wait_readable(&mut self, timeout: Duration) -> Result<Readiness, ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.timeouts.push(timeout);
        match self.script.pop_front() {
            None => Err(ChannelError::Closed),
            Some(SourceEvent::Timeout) => Ok(Readiness::TimedOut),
            Some(SourceEvent::WaitError) => Err(ChannelError::Poll(Errno::EINTR)),
            Some(event) => {
                self.pending = Some(event);
                Ok(Readiness::Ready)
            },
        }
    }

    fn read_payload(&mut self) -> Result<Payload, ChannelError> {
        match self.pending.take() {
            Some(SourceEvent::Payload(bytes)) => Ok(Payload::new(bytes)),
            _ => Err(ChannelError::Read(io::Error::from(io::ErrorKind::Interrupted))),
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

// ==================== Mock 设备 ====================

/// 记录每次写入；结果按脚本返回，脚本耗尽后一律成功
#[derive(Debug, Default)]
pub struct MockDevice {
    outcomes: VecDeque<WriteOutcome>,
    /// (字节, quiet)
    pub writes: Vec<(Vec<u8>, bool)>,
}

impl MockDevice {
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = WriteOutcome>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
            writes: Vec::new(),
        }
    }

    pub fn unreachable() -> Self {
        Self::with_outcomes(std::iter::repeat_n(WriteOutcome::Failure, 64))
    }

    pub fn written_bytes(&self) -> Vec<&[u8]> {
        self.writes.iter().map(|(bytes, _)| bytes.as_slice()).collect()
    }
}

impl Device for MockDevice {
    fn write_payload(&mut self, payload: &[u8], quiet: bool) -> WriteOutcome {
        self.writes.push((payload.to_vec(), quiet));
        self.outcomes.pop_front().unwrap_or(WriteOutcome::Success)
    }
}

// ==================== 日志收集 ====================

#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// 在当前线程收集 `f` 执行期间的日志
pub fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .without_time()
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, capture.contents())
}

// ==================== 伪终端 ====================

/// 伪终端：从设备端（slave）路径写入，在主端（master）读出
///
/// 测试自身一直持有一个 slave 句柄（raw 模式），
/// 这样被测代码关闭它的句柄后 pty 仍然存在，输出也不会被行规程改写。
pub struct Pty {
    pub master: PtyMaster,
    pub slave_path: PathBuf,
    pub slave: File,
}

impl Pty {
    pub fn open() -> Self {
        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).unwrap();
        grantpt(&master).unwrap();
        unlockpt(&master).unwrap();
        let slave_path = PathBuf::from(nix::pty::ptsname_r(&master).unwrap());

        let slave = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&slave_path)
            .unwrap();

        let mut attrs = termios::tcgetattr(&slave).unwrap();
        termios::cfmakeraw(&mut attrs);
        termios::tcsetattr(&slave, SetArg::TCSANOW, &attrs).unwrap();

        Self {
            master,
            slave_path,
            slave,
        }
    }

    /// 读取直到收到 `expected` 字节或 `timeout` 内再无数据
    pub fn read_master(&mut self, expected: usize, timeout: Duration) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 1024];
        let timeout = PollTimeout::try_from(timeout).unwrap();

        while out.len() < expected {
            let mut fds = [PollFd::new(self.master.as_fd(), PollFlags::POLLIN)];
            if poll(&mut fds, timeout).unwrap() == 0 {
                break;
            }
            let len = self.master.read(&mut buf).unwrap();
            if len == 0 {
                break;
            }
            out.extend_from_slice(&buf[..len]);
        }
        out
    }

    /// 在 `window` 内收到的全部数据
    pub fn drain_master(&mut self, window: Duration) -> Vec<u8> {
        self.read_master(usize::MAX, window)
    }
}
