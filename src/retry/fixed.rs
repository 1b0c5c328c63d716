use super::RetryPolicy;
use crate::error::ResolverError;
use std::time::Duration;

/// 固定延迟重试策略
///
/// 监听解析器用它描述打开失败后的重连等待。
#[derive(Debug, Clone)]
pub struct FixedRetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl FixedRetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// 不限次数的固定延迟
    pub fn unbounded(delay: Duration) -> Self {
        Self::new(usize::MAX, delay)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl RetryPolicy for FixedRetryPolicy {
    fn should_retry(&self, attempt: usize, error: &ResolverError) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }

        error.is_retryable()
    }

    fn backoff_duration(&self, _attempt: usize) -> Duration {
        self.delay
    }

    fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}
