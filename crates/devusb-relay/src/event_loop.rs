//! 事件循环
//!
//! 单线程状态机：
//!
//! ```text
//!            ┌──────────── 超时 ───────────► Keepalive ──┐
//! WaitForEvent                                          ├──► WaitForEvent
//!   ▲   │    └──────────── 可读 ───────────► Forward ────┘
//!   │   │                                      │
//!   └───┘ poll 错误（不更新写入结果）             └── 哨兵 ──► Shutdown
//! ```
//!
//! 迭代之间只保留上一次的 [`WriteOutcome`]，它决定下一次等待的超时。
//! 同一时刻最多只有一个设备操作，负载严格按到达顺序转发。

use crate::channel::{PayloadSource, Readiness};
use crate::config::RelayConfig;
use crate::device::{Device, WriteOutcome};
use crate::error::ChannelError;
use crate::payload::KEEPALIVE_PAYLOAD;
use std::time::Duration;
use tracing::{error, info, warn};

/// 单步执行后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// 回到 WaitForEvent
    Continue,
    /// 进入终态
    Shutdown,
}

/// 中继事件循环
pub struct EventLoop<'a, S, D> {
    config: &'a RelayConfig,
    source: S,
    device: D,
    /// `None` 表示尚未发生任何写入
    last_outcome: Option<WriteOutcome>,
}

impl<'a, S: PayloadSource, D: Device> EventLoop<'a, S, D> {
    pub fn new(config: &'a RelayConfig, source: S, device: D) -> Self {
        Self {
            config,
            source,
            device,
            last_outcome: None,
        }
    }

    /// 下一次 WaitForEvent 将使用的超时
    pub fn next_timeout(&self) -> Duration {
        self.config.backoff.next_timeout(self.last_outcome)
    }

    pub fn last_outcome(&self) -> Option<WriteOutcome> {
        self.last_outcome
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// 运行直到收到关闭哨兵，然后关闭输入通道
    pub fn run(&mut self) {
        while self.step() == Step::Continue {}
        self.source.close();
    }

    /// 执行一次 WaitForEvent → Dispatch
    pub fn step(&mut self) -> Step {
        match self.source.wait_readable(self.next_timeout()) {
            Ok(Readiness::TimedOut) => {
                self.send_keepalive();
                Step::Continue
            },
            Ok(Readiness::Ready) => self.forward(),
            Err(ChannelError::Closed) => Step::Shutdown,
            // 瞬时错误：不是超时，不更新写入结果
            Err(e) => {
                error!("{}", e);
                Step::Continue
            },
        }
    }

    fn send_keepalive(&mut self) {
        let policy = self.config.keepalive_log;

        if policy.logs_attempts() {
            info!("sending noop()");
        }

        let outcome = self
            .device
            .write_payload(KEEPALIVE_PAYLOAD, policy.suppress_device_errors());

        match outcome {
            WriteOutcome::Success if policy.logs_attempts() => info!("noop() sent"),
            WriteOutcome::Failure if !policy.suppress_device_errors() => {
                warn!("noop() failed, retrying in {:?}", self.config.backoff.retry_interval())
            },
            _ => {},
        }

        self.last_outcome = Some(outcome);
    }

    fn forward(&mut self) -> Step {
        let payload = match self.source.read_payload() {
            Ok(payload) => payload,
            Err(e) => {
                error!("{}", e);
                return Step::Continue;
            },
        };

        if payload.is_empty() {
            return Step::Continue;
        }

        info!("received: [{}]", payload.log_line());

        if payload.is_shutdown_sentinel() {
            info!("quitting");
            return Step::Shutdown;
        }

        let outcome = self.device.write_payload(payload.as_bytes(), false);
        if outcome == WriteOutcome::Success {
            info!("forwarded {} bytes", payload.len());
        }
        self.last_outcome = Some(outcome);
        Step::Continue
    }
}
