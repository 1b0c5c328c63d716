//! 解析器配置
//!
//! 支持从 TOML 文件加载，缺省字段使用默认值，并可通过环境变量覆盖：
//! - `SIMPLELB_POLL_INTERVAL_MS`
//! - `SIMPLELB_RETRY_ATTEMPTS`
//! - `SIMPLELB_RETRY_INITIAL_DELAY_MS`
//! - `SIMPLELB_WATCH_RECONNECT_DELAY_MS`
//! - `SIMPLELB_WATCH_SETTLE_DELAY_MS`

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::error::{ResolverError, Result};
use crate::retry::ExponentialBackoffPolicy;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// 轮询间隔（毫秒）
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// 每个周期最多尝试次数（至少 1）
    #[serde(default = "default_retry_attempts")]
    pub attempts: usize,
    /// 初始退避延迟（毫秒）
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// 退避上限（毫秒），不设置则不封顶
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// 打开更新流失败后的重连延迟（毫秒）
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// 更新流正常结束后重新打开前的稳定延迟（毫秒）
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    30_000
}

fn default_retry_attempts() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_reconnect_delay_ms() -> u64 {
    1_000
}

fn default_settle_delay_ms() -> u64 {
    1_000
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            retry: RetryConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: None,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl ResolverConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ResolverError::config(format!("failed to read {}: {}", path, e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ResolverConfig =
            toml::from_str(content).map_err(|e| ResolverError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 使用环境变量覆盖配置，无法解析的值会被忽略
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(v) = env_override("SIMPLELB_POLL_INTERVAL_MS") {
            self.poll_interval_ms = v;
        }
        if let Some(v) = env_override("SIMPLELB_RETRY_ATTEMPTS") {
            self.retry.attempts = v;
        }
        if let Some(v) = env_override("SIMPLELB_RETRY_INITIAL_DELAY_MS") {
            self.retry.initial_delay_ms = v;
        }
        if let Some(v) = env_override("SIMPLELB_WATCH_RECONNECT_DELAY_MS") {
            self.watch.reconnect_delay_ms = v;
        }
        if let Some(v) = env_override("SIMPLELB_WATCH_SETTLE_DELAY_MS") {
            self.watch.settle_delay_ms = v;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(ResolverError::config("poll_interval_ms must be greater than zero"));
        }
        if self.retry.attempts == 0 {
            return Err(ResolverError::config("retry.attempts must be at least 1"));
        }
        if self.retry.initial_delay_ms == 0 {
            return Err(ResolverError::config("retry.initial_delay_ms must be greater than zero"));
        }
        if self.watch.reconnect_delay_ms == 0 {
            return Err(ResolverError::config("watch.reconnect_delay_ms must be greater than zero"));
        }
        if self.watch.settle_delay_ms == 0 {
            return Err(ResolverError::config("watch.settle_delay_ms must be greater than zero"));
        }
        if let Some(max) = self.retry.max_delay_ms {
            if max < self.retry.initial_delay_ms {
                return Err(ResolverError::config(
                    "retry.max_delay_ms must not be smaller than retry.initial_delay_ms",
                ));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl RetryConfig {
    /// 转换为指数退避策略
    pub fn policy(&self) -> ExponentialBackoffPolicy {
        let policy = ExponentialBackoffPolicy::new(
            self.attempts,
            Duration::from_millis(self.initial_delay_ms),
        );
        match self.max_delay_ms {
            Some(max) => policy.with_max_delay(Duration::from_millis(max)),
            None => policy,
        }
    }
}

impl WatchConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

fn env_override<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}
