//! 中继配置
//!
//! 配置在循环启动前一次性构建，之后只以引用方式传入 [`EventLoop`](crate::EventLoop)，
//! 运行期间不可变。

use crate::backoff::BackoffPolicy;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 默认 FIFO 路径
pub const DEFAULT_FIFO_PATH: &str = "/tmp/arduino";

/// 保活日志策略
///
/// 只决定保活写入是否/何时记录日志，不改变写入行为本身。
///
/// - **Never**: 从不记录保活（连写入失败也不记）
/// - **OnError**: 只记录失败的保活
/// - **Always**: 记录每次保活尝试及其结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeepaliveLogPolicy {
    Never,
    #[serde(alias = "error")]
    OnError,
    #[default]
    Always,
}

impl KeepaliveLogPolicy {
    /// 写入失败时设备层是否应保持沉默
    pub fn suppress_device_errors(self) -> bool {
        self == Self::Never
    }

    /// 是否记录保活尝试（以及成功结果）
    pub fn logs_attempts(self) -> bool {
        self == Self::Always
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::OnError => "on-error",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for KeepaliveLogPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 无法识别的保活日志策略
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid keepalive log policy '{0}' (expected never, on-error or always)")]
pub struct ParsePolicyError(String);

impl FromStr for KeepaliveLogPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "on-error" | "error" => Ok(Self::OnError),
            "always" => Ok(Self::Always),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// 中继配置（已合并命令行、配置文件与默认值）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// 输入 FIFO 路径
    pub fifo_path: PathBuf,

    /// 串口设备路径
    pub device_path: PathBuf,

    /// 保活日志策略
    pub keepalive_log: KeepaliveLogPolicy,

    /// 等待超时策略
    pub backoff: BackoffPolicy,
}

impl RelayConfig {
    /// 以默认 FIFO 路径和默认超时策略创建配置
    pub fn new(device_path: impl Into<PathBuf>) -> Self {
        Self {
            fifo_path: PathBuf::from(DEFAULT_FIFO_PATH),
            device_path: device_path.into(),
            keepalive_log: KeepaliveLogPolicy::default(),
            backoff: BackoffPolicy::default(),
        }
    }
}
