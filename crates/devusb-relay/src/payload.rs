//! 负载定义
//!
//! 一次 `read` 得到的字节就是一个负载，不做分帧，也不跨读取拼接。

use std::borrow::Cow;
use std::fmt;

/// 单次读取的缓冲区上限（8 KiB）
pub const READ_BUFFER_SIZE: usize = 8192;

/// 关闭哨兵
pub const SHUTDOWN_SENTINEL: &[u8] = b"EOF()";

/// 保活负载：设备侧的空操作指令
pub const KEEPALIVE_PAYLOAD: &[u8] = b"noop\n";

/// 从输入通道读取到的一个负载
///
/// 字节在转发时保持原样；[`Payload::log_line`] 只影响日志输出。
#[derive(Clone, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 去掉行尾之后的内容（先去一个 `\n`，再去一个 `\r`）
    fn trimmed(&self) -> &[u8] {
        let mut bytes = self.0.as_slice();
        if let Some(rest) = bytes.strip_suffix(b"\n") {
            bytes = rest;
        }
        if let Some(rest) = bytes.strip_suffix(b"\r") {
            bytes = rest;
        }
        bytes
    }

    /// 是否为关闭哨兵
    ///
    /// 去掉行尾后必须与 `EOF()` 完全相等，`EOF()` 加其它字节的负载照常转发。
    pub fn is_shutdown_sentinel(&self) -> bool {
        self.trimmed() == SHUTDOWN_SENTINEL
    }

    /// 日志用的可读形式（行尾已去除，非 UTF-8 字节有损替换）
    pub fn log_line(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.trimmed())
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({:?})", self.log_line())
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}
