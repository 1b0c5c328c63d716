//! 重试策略模块
//!
//! 轮询解析器使用带抖动的指数退避；监听解析器的重连等待使用固定延迟策略。

pub mod exponential;
pub mod fixed;

pub use exponential::ExponentialBackoffPolicy;
pub use fixed::FixedRetryPolicy;

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{ResolverError, Result};

/// 重试策略 trait
pub trait RetryPolicy: Send + Sync {
    /// 已经失败 `attempt` 次后是否继续重试
    fn should_retry(&self, attempt: usize, error: &ResolverError) -> bool;
    /// 第 `attempt` 次（从 0 开始）失败后的等待时间
    fn backoff_duration(&self, attempt: usize) -> Duration;
    fn max_attempts(&self) -> usize;
}

/// 按策略执行可取消的重试
///
/// `op` 接收从 0 开始的尝试序号。每次尝试和每次退避等待都会与取消信号竞争，
/// 一旦取消立即返回 [`ResolverError::Cancelled`]。最后一次失败后不再等待。
///
/// # 返回
/// * `Ok(T)` - 某次尝试成功
/// * `Err(ResolverError::RetryExhausted)` - 所有尝试都失败
/// * `Err(ResolverError::Cancelled)` - 重试过程中收到取消信号
/// * 其它错误 - 策略判定不可重试的错误原样返回
pub async fn retry_with_policy<P, F, Fut, T>(
    policy: &P,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T>
where
    P: RetryPolicy + ?Sized,
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        let error = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ResolverError::Cancelled),
            result = op(attempt) => match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            },
        };

        attempt += 1;

        if !policy.should_retry(attempt, &error) {
            if error.is_retryable() && attempt >= policy.max_attempts() {
                return Err(ResolverError::RetryExhausted {
                    attempts: attempt,
                    last_error: error.to_string(),
                });
            }
            return Err(error);
        }

        let delay = policy.backoff_duration(attempt - 1);
        warn!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "Attempt failed, retrying after backoff");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ResolverError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
