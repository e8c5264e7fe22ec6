//! 配置合并
//!
//! 优先级：命令行 > 配置文件 > 内置默认值。合并结果在事件循环启动前
//! 一次性确定，之后不再修改。
//!
//! 配置文件示例：
//!
//! ```toml
//! device = "/dev/ttyUSB0"
//! fifo = "/tmp/arduino"
//! log_file = "/var/log/mapper-devusb.log"
//! keepalive_log = "on-error"
//! keepalive_interval_secs = 60
//! retry_interval_secs = 5
//! ```

use crate::args::Args;
use crate::error::StartupError;
use anyhow::Context;
use devusb_relay::backoff::{DEFAULT_KEEPALIVE_INTERVAL, DEFAULT_RETRY_INTERVAL};
use devusb_relay::config::DEFAULT_FIFO_PATH;
use devusb_relay::{BackoffPolicy, KeepaliveLogPolicy, RelayConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// 配置文件内容（所有键可选）
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    pub device: Option<PathBuf>,
    pub fifo: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub debug: Option<bool>,
    pub daemon: Option<bool>,
    pub keepalive_log: Option<KeepaliveLogPolicy>,
    pub keepalive_interval_secs: Option<u64>,
    pub retry_interval_secs: Option<u64>,
    pub lock_file: Option<PathBuf>,
}

impl FileSettings {
    /// 读取并解析 TOML 配置文件
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file '{}'", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("invalid config file '{}'", path.display()))
    }
}

/// 合并后的进程配置
#[derive(Debug, Clone)]
pub struct Settings {
    /// 交给核心的部分
    pub relay: RelayConfig,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
    pub daemon: bool,
    pub lock_file: Option<PathBuf>,
}

impl Settings {
    /// 读取 `--config` 指定的文件（如有）并与命令行合并
    pub fn resolve(args: Args) -> Result<Self, StartupError> {
        let file = match args.config.as_deref() {
            Some(path) => FileSettings::load(path).map_err(StartupError::Config)?,
            None => FileSettings::default(),
        };
        Self::merge(args, file)
    }

    pub fn merge(args: Args, file: FileSettings) -> Result<Self, StartupError> {
        let device_path = args
            .device
            .or(file.device)
            .ok_or(StartupError::MissingDevice)?;

        let keepalive = file
            .keepalive_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_KEEPALIVE_INTERVAL);
        let retry = file
            .retry_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RETRY_INTERVAL);

        let relay = RelayConfig {
            fifo_path: args
                .fifo
                .or(file.fifo)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FIFO_PATH)),
            device_path,
            keepalive_log: args
                .keepalive_log
                .or(file.keepalive_log)
                .unwrap_or_default(),
            backoff: BackoffPolicy::new(keepalive, retry)?,
        };

        Ok(Self {
            relay,
            log_file: args.log_file.or(file.log_file),
            debug: args.debug || file.debug.unwrap_or(false),
            daemon: args.daemon || file.daemon.unwrap_or(false),
            lock_file: args.lock_file.or(file.lock_file),
        })
    }

    /// 以 debug 级别输出合并结果
    pub fn log_debug(&self) {
        debug!("device file:    [{}]", self.relay.device_path.display());
        debug!("fifo file name: [{}]", self.relay.fifo_path.display());
        match &self.log_file {
            Some(path) => debug!("log file name:  [{}]", path.display()),
            None => debug!("log file name:  <stderr>"),
        }
        debug!("daemon mode:    [{}]", if self.daemon { "yes" } else { "no" });
        debug!("keepalive log:  [{}]", self.relay.keepalive_log);
        debug!(
            "intervals:      [keepalive {:?}, retry {:?}]",
            self.relay.backoff.keepalive_interval(),
            self.relay.backoff.retry_interval()
        );
        if let Some(path) = &self.lock_file {
            debug!("lock file:      [{}]", path.display());
        }
    }
}
