//! 持续服务发现解析器
//!
//! 通过定期拉取（[`PollResolverBuilder`]）或持续监听（[`WatchResolverBuilder`]）外部地址源，
//! 保持 RPC 客户端的后端地址列表最新：
//! - 基于集合差异抑制重复更新
//! - 拉取失败按带抖动的指数退避重试
//! - 一个引擎实例对应一个后台任务，`close` 返回后不再有任何下游调用
//!
//! # 使用示例
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use flare_simplelb::{
//!     AddressSet, BoxError, PollResolverBuilder, Puller, ResolverRegistry, discover_channel,
//! };
//!
//! struct StaticPuller;
//!
//! #[async_trait::async_trait]
//! impl Puller for StaticPuller {
//!     async fn pull(&self, _service_name: &str) -> Result<AddressSet, BoxError> {
//!         Ok(["localhost:8080", "localhost:8081"].into_iter().collect())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ResolverRegistry::new();
//! registry.register(Arc::new(PollResolverBuilder::new(
//!     Arc::new(StaticPuller),
//!     Duration::from_secs(10),
//! )?));
//!
//! let (sink, _discover) = discover_channel(16);
//! let resolver = registry.build("simplelb://sampleserver", Arc::new(sink))?;
//!
//! // ...
//! resolver.close().await;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod differ;
mod engine;
mod poll;
pub mod registry;
pub mod sink;
pub mod source;
pub mod target;
mod watch;

pub use builder::{PollResolverBuilder, ResolverBuilder, SCHEME, WATCHER_SCHEME, WatchResolverBuilder};
pub use engine::ResolverHandle;
pub use registry::ResolverRegistry;
pub use sink::StateSink;
pub use source::{AddressStream, Puller, Watcher};
pub use target::Target;
