//! 等待超时策略
//!
//! 两态策略而不是指数退避：上一次写入成功（或刚启动）时使用长间隔，
//! 失败后使用短间隔，连续失败也不会继续缩短。
//!
//! 短间隔让设备重新插上后能被很快发现，长间隔减少对设备的无谓打扰。

use crate::device::WriteOutcome;
use std::time::Duration;
use thiserror::Error;

/// 默认保活间隔（上一次写入成功后）
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(60);

/// 默认重试间隔（上一次写入失败后）
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// 间隔下限：`poll` 的超时精度是毫秒，更短的间隔会变成不等待
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// 非法的间隔组合
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackoffError {
    #[error("keepalive interval ({0:?}) must be at least 1ms")]
    KeepaliveTooShort(Duration),

    #[error("retry interval ({0:?}) must be at least 1ms")]
    RetryTooShort(Duration),

    #[error("retry interval ({retry:?}) must not exceed keepalive interval ({keepalive:?})")]
    RetryExceedsKeepalive {
        retry: Duration,
        keepalive: Duration,
    },
}

/// 根据上一次写入结果选择下一次等待超时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    keepalive: Duration,
    retry: Duration,
}

impl BackoffPolicy {
    /// 创建策略
    ///
    /// # 参数
    /// - `keepalive`: 成功后（及首次等待）使用的长间隔
    /// - `retry`: 失败后使用的短间隔
    ///
    /// # 错误
    /// 两个间隔都不能小于 [`MIN_INTERVAL`]，且 `retry <= keepalive`。
    pub fn new(keepalive: Duration, retry: Duration) -> Result<Self, BackoffError> {
        if keepalive < MIN_INTERVAL {
            return Err(BackoffError::KeepaliveTooShort(keepalive));
        }
        if retry < MIN_INTERVAL {
            return Err(BackoffError::RetryTooShort(retry));
        }
        if retry > keepalive {
            return Err(BackoffError::RetryExceedsKeepalive { retry, keepalive });
        }
        Ok(Self { keepalive, retry })
    }

    /// 下一次等待的超时
    ///
    /// `None` 表示还没有任何写入（首次迭代），按成功处理。
    pub fn next_timeout(&self, last_outcome: Option<WriteOutcome>) -> Duration {
        match last_outcome {
            Some(WriteOutcome::Failure) => self.retry,
            Some(WriteOutcome::Success) | None => self.keepalive,
        }
    }

    pub fn keepalive_interval(&self) -> Duration {
        self.keepalive
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            keepalive: DEFAULT_KEEPALIVE_INTERVAL,
            retry: DEFAULT_RETRY_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_iteration_uses_long_interval() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.next_timeout(None), Duration::from_secs(60));
    }

    #[test]
    fn test_toggles_between_two_values() {
        let policy =
            BackoffPolicy::new(Duration::from_millis(500), Duration::from_millis(20)).unwrap();

        assert_eq!(
            policy.next_timeout(Some(WriteOutcome::Failure)),
            Duration::from_millis(20)
        );
        // 连续失败不再缩短
        assert_eq!(
            policy.next_timeout(Some(WriteOutcome::Failure)),
            Duration::from_millis(20)
        );
        assert_eq!(
            policy.next_timeout(Some(WriteOutcome::Success)),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_rejects_invalid_intervals() {
        assert_eq!(
            BackoffPolicy::new(Duration::ZERO, Duration::ZERO),
            Err(BackoffError::KeepaliveTooShort(Duration::ZERO))
        );
        assert_eq!(
            BackoffPolicy::new(Duration::from_secs(1), Duration::ZERO),
            Err(BackoffError::RetryTooShort(Duration::ZERO))
        );
        assert!(matches!(
            BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(2)),
            Err(BackoffError::RetryExceedsKeepalive { .. })
        ));
        // 相等是允许的（退化为固定间隔）
        assert!(BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_rejects_sub_millisecond_intervals() {
        let short = Duration::from_micros(500);
        assert_eq!(
            BackoffPolicy::new(short, short),
            Err(BackoffError::KeepaliveTooShort(short))
        );
        assert_eq!(
            BackoffPolicy::new(Duration::from_secs(1), short),
            Err(BackoffError::RetryTooShort(short))
        );
        assert!(BackoffPolicy::new(MIN_INTERVAL, MIN_INTERVAL).is_ok());
    }

    #[test]
    fn test_accessors() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.keepalive_interval(), DEFAULT_KEEPALIVE_INTERVAL);
        assert_eq!(policy.retry_interval(), DEFAULT_RETRY_INTERVAL);
    }
}
