//! Flare SimpleLB
//!
//! 持续服务发现解析器：通过定期拉取或持续监听外部地址源，保持 RPC 客户端的后端地址列表最新，
//! 抑制重复更新，并以有界退避重试失败。

pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod resolver;
pub mod retry;
pub mod types;

// Re-exports
pub use config::{ResolverConfig, RetryConfig, WatchConfig};
pub use discovery::{AddressDiscover, DiscoverSink, discover_channel};
pub use error::{BoxError, ResolverError, Result};
pub use resolver::{
    AddressStream, PollResolverBuilder, Puller, ResolverBuilder, ResolverHandle,
    ResolverRegistry, SCHEME, StateSink, Target, WATCHER_SCHEME, WatchResolverBuilder, Watcher,
};
pub use retry::{ExponentialBackoffPolicy, FixedRetryPolicy, RetryPolicy, retry_with_policy};
pub use types::{Address, AddressSet, Phase};
