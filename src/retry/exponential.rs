use super::RetryPolicy;
use crate::error::ResolverError;
use rand::Rng;
use std::time::Duration;

/// 指数退避重试策略（带抖动）
///
/// 第 i 次失败后等待 `base_delay * 2^i + random[0, base_delay * 2^i / 2)`，
/// 避免多个实例同时重试。
#[derive(Debug, Clone)]
pub struct ExponentialBackoffPolicy {
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl ExponentialBackoffPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: Duration::MAX,
        }
    }

    /// 设置退避上限（抖动之前的基础延迟）
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// 不含抖动的基础延迟，溢出时饱和为 `Duration::MAX`
    pub fn base_backoff(&self, attempt: usize) -> Duration {
        let backoff = u32::try_from(attempt)
            .ok()
            .and_then(|exp| 2u32.checked_pow(exp))
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX);
        backoff.min(self.max_delay)
    }
}

impl Default for ExponentialBackoffPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl RetryPolicy for ExponentialBackoffPolicy {
    fn should_retry(&self, attempt: usize, error: &ResolverError) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }

        // 只对地址源不可用进行重试
        error.is_retryable()
    }

    fn backoff_duration(&self, attempt: usize) -> Duration {
        let backoff = self.base_backoff(attempt);
        let half = (backoff / 2).as_nanos().min(u64::MAX as u128) as u64;
        let jitter = if half == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..half)
        };
        backoff.saturating_add(Duration::from_nanos(jitter))
    }

    fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}
