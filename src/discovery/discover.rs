//! Tower Discover 适配
//!
//! 把解析器发布的完整地址集合转换为 `tower::discover::Change` 增量事件，
//! 可直接交给 `tower::balance` 等组件使用。

use std::collections::HashSet;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::{Mutex, mpsc};
use tower::discover::Change;
use tracing::{debug, warn};

use crate::error::{BoxError, ResolverError};
use crate::resolver::StateSink;
use crate::types::{Address, AddressSet};

/// 创建一对 (sink, discover)
///
/// - `DiscoverSink`: 交给解析器作为下游
/// - `AddressDiscover`: 实现 `tower::discover::Discover`，产出增量变化
pub fn discover_channel(buffer: usize) -> (DiscoverSink, AddressDiscover) {
    let (tx, rx) = mpsc::channel(buffer);
    (
        DiscoverSink {
            tx,
            current: Mutex::new(HashSet::new()),
        },
        AddressDiscover { rx },
    )
}

/// 把地址集合转换为增量事件的下游
pub struct DiscoverSink {
    tx: mpsc::Sender<Change<Address, Address>>,
    // 已经对外发布过的地址
    current: Mutex<HashSet<Address>>,
}

#[async_trait]
impl StateSink for DiscoverSink {
    async fn update_state(&self, addresses: AddressSet) -> Result<(), BoxError> {
        let mut current = self.current.lock().await;
        let next: HashSet<Address> = addresses.iter().cloned().collect();

        let removed: Vec<Address> = current.difference(&next).cloned().collect();
        for address in removed {
            self.tx
                .send(Change::Remove(address.clone()))
                .await
                .map_err(|_| "discover receiver dropped")?;
            current.remove(&address);
            debug!(address = %address, "Endpoint removed");
        }

        for address in addresses.iter() {
            if current.contains(address) {
                continue;
            }
            self.tx
                .send(Change::Insert(address.clone(), address.clone()))
                .await
                .map_err(|_| "discover receiver dropped")?;
            current.insert(address.clone());
            debug!(address = %address, "Endpoint inserted");
        }

        Ok(())
    }

    fn report_error(&self, error: ResolverError) {
        warn!(error = %error, "Resolver reported error");
    }
}

/// 地址增量事件流
///
/// tower 0.5 的 Discover trait 通过 TryStream 自动实现，
/// 这里实现 `Stream<Item = Result<Change<..>, Infallible>>` 即可。
pub struct AddressDiscover {
    rx: mpsc::Receiver<Change<Address, Address>>,
}

impl Stream for AddressDiscover {
    type Item = Result<Change<Address, Address>, std::convert::Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|change| change.map(Ok))
    }
}
