//! 解析器构建器
//!
//! 每次 `build` 产生一个独立的引擎实例和一个后台任务；同一构建器产生的实例之间不共享状态。

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::config::ResolverConfig;
use crate::error::{ResolverError, Result};
use crate::resolver::engine::{self, ResolverHandle};
use crate::resolver::poll::PollFeed;
use crate::resolver::sink::StateSink;
use crate::resolver::source::{Puller, Watcher};
use crate::resolver::target::Target;
use crate::resolver::watch::WatchFeed;
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};

/// 拉取式解析器的 scheme
pub const SCHEME: &str = "simplelb";

/// 推送式解析器的 scheme
pub const WATCHER_SCHEME: &str = "simplelb_watcher";

/// 解析器构建器 trait
pub trait ResolverBuilder: Send + Sync {
    /// 构建器负责的 scheme
    fn scheme(&self) -> &str;

    /// 为目标构建解析器并启动后台任务
    ///
    /// 服务名为空时返回 [`ResolverError::EmptyServiceName`]，不会启动任何任务。
    /// 必须在 tokio 运行时内调用。
    fn build(&self, target: &Target, sink: Arc<dyn StateSink>) -> Result<ResolverHandle>;
}

fn service_name_of(scheme: &str, target: &Target) -> Result<String> {
    let service_name = target.service_name();
    if service_name.is_empty() {
        error!(scheme, target = %target, "Empty service name");
        return Err(ResolverError::EmptyServiceName);
    }
    Ok(service_name.to_string())
}

/// 拉取式解析器构建器
pub struct PollResolverBuilder {
    puller: Arc<dyn Puller>,
    interval: Duration,
    retry: ExponentialBackoffPolicy,
}

impl PollResolverBuilder {
    /// 创建构建器，重试策略默认 3 次、初始延迟 1 秒
    pub fn new(puller: Arc<dyn Puller>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(ResolverError::config("poll interval must be greater than zero"));
        }
        Ok(Self {
            puller,
            interval,
            retry: ExponentialBackoffPolicy::default(),
        })
    }

    /// 从配置创建构建器
    pub fn from_config(puller: Arc<dyn Puller>, config: &ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            puller,
            interval: config.poll_interval(),
            retry: config.retry.policy(),
        })
    }

    /// 设置重试策略
    pub fn with_retry(mut self, retry: ExponentialBackoffPolicy) -> Result<Self> {
        if retry.max_attempts() == 0 {
            return Err(ResolverError::config("retry attempts must be at least 1"));
        }
        if retry.base_delay().is_zero() {
            return Err(ResolverError::config("retry initial delay must be greater than zero"));
        }
        self.retry = retry;
        Ok(self)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl ResolverBuilder for PollResolverBuilder {
    fn scheme(&self) -> &str {
        SCHEME
    }

    fn build(&self, target: &Target, sink: Arc<dyn StateSink>) -> Result<ResolverHandle> {
        let service_name = service_name_of(SCHEME, target)?;
        let feed = PollFeed::new(self.puller.clone(), self.interval, self.retry.clone());
        let handle = engine::spawn(service_name, feed, sink)?;

        info!(
            service_name = %handle.service_name(),
            interval_ms = self.interval.as_millis() as u64,
            "Poll resolver started"
        );
        Ok(handle)
    }
}

/// 推送式解析器构建器
pub struct WatchResolverBuilder {
    watcher: Arc<dyn Watcher>,
    reconnect_delay: Duration,
    settle_delay: Duration,
}

impl WatchResolverBuilder {
    /// 创建构建器，重连延迟和稳定延迟默认均为 1 秒
    pub fn new(watcher: Arc<dyn Watcher>) -> Self {
        Self {
            watcher,
            reconnect_delay: Duration::from_secs(1),
            settle_delay: Duration::from_secs(1),
        }
    }

    /// 从配置创建构建器
    pub fn from_config(watcher: Arc<dyn Watcher>, config: &ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            watcher,
            reconnect_delay: config.watch.reconnect_delay(),
            settle_delay: config.watch.settle_delay(),
        })
    }

    /// 设置打开失败或流出错后的重连延迟
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Result<Self> {
        if delay.is_zero() {
            return Err(ResolverError::config("reconnect delay must be greater than zero"));
        }
        self.reconnect_delay = delay;
        Ok(self)
    }

    /// 设置流正常结束后的稳定延迟
    pub fn with_settle_delay(mut self, delay: Duration) -> Result<Self> {
        if delay.is_zero() {
            return Err(ResolverError::config("settle delay must be greater than zero"));
        }
        self.settle_delay = delay;
        Ok(self)
    }
}

impl ResolverBuilder for WatchResolverBuilder {
    fn scheme(&self) -> &str {
        WATCHER_SCHEME
    }

    fn build(&self, target: &Target, sink: Arc<dyn StateSink>) -> Result<ResolverHandle> {
        let service_name = service_name_of(WATCHER_SCHEME, target)?;
        let feed = WatchFeed::new(self.watcher.clone(), self.reconnect_delay, self.settle_delay);
        let handle = engine::spawn(service_name, feed, sink)?;

        info!(service_name = %handle.service_name(), "Watch resolver started");
        Ok(handle)
    }
}
