//! 地址源抽象
//!
//! 具体的地址发现方式（编排系统 API、DNS 等）由外部实现，解析器只依赖这两个 trait。
//! 由于需要动态分发（dyn），使用 async-trait。

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::BoxError;
use crate::types::AddressSet;

/// 监听流：每一项是一批完整的地址集合
///
/// 流正常结束表示"地址源需要重新打开"，而不是"解析器应当停止"。
pub type AddressStream = Pin<Box<dyn Stream<Item = Result<AddressSet, BoxError>> + Send>>;

/// 拉取式地址源
#[async_trait]
pub trait Puller: Send + Sync {
    /// 拉取服务当前的全部地址
    ///
    /// 可能较慢；重试策略由调用方（轮询解析器）负责，实现方不应自行重试。
    async fn pull(&self, service_name: &str) -> Result<AddressSet, BoxError>;
}

/// 推送式地址源
#[async_trait]
pub trait Watcher: Send + Sync {
    /// 打开服务地址的更新流
    async fn watch(&self, service_name: &str) -> Result<AddressStream, BoxError>;
}
