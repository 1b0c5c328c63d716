//! 解析结果的下游接收方

use async_trait::async_trait;

use crate::error::{BoxError, ResolverError};
use crate::types::AddressSet;

/// 解析结果接收方（RPC 客户端的连接管理 / 负载均衡层）
///
/// 同一解析器实例对 `update_state` 的调用是串行的，且按决策顺序送达。
#[async_trait]
pub trait StateSink: Send + Sync {
    /// 推送新的地址集合
    async fn update_state(&self, addresses: AddressSet) -> Result<(), BoxError>;

    /// 上报运行期错误（不等待结果）
    fn report_error(&self, error: ResolverError);
}
