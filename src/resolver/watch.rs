//! 推送式解析器
//!
//! 外层循环负责打开（和重新打开）更新流，内层循环逐批比较并发布。
//! 流正常结束不算错误：等待一个短暂的稳定延迟后重新打开，不向下游上报。

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{error, warn};

use crate::error::ResolverError;
use crate::resolver::engine::{AddressFeed, EngineContext};
use crate::resolver::source::{AddressStream, Watcher};
use crate::retry::FixedRetryPolicy;
use crate::types::Phase;

pub(crate) struct WatchFeed {
    watcher: Arc<dyn Watcher>,
    reconnect: FixedRetryPolicy,
    settle_delay: Duration,
}

/// 内层循环结束的原因
enum StreamExit {
    Cancelled,
    /// 流正常结束
    Ended,
    /// 流产生了错误
    Failed(ResolverError),
}

impl WatchFeed {
    pub(crate) fn new(
        watcher: Arc<dyn Watcher>,
        reconnect_delay: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            watcher,
            reconnect: FixedRetryPolicy::unbounded(reconnect_delay),
            settle_delay,
        }
    }

    async fn consume(
        &self,
        ctx: &mut EngineContext,
        mut stream: AddressStream,
    ) -> StreamExit {
        loop {
            let next = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => return StreamExit::Cancelled,
                next = stream.next() => next,
            };

            match next {
                Some(Ok(addresses)) => {
                    ctx.publisher.apply(addresses).await;
                }
                Some(Err(e)) => return StreamExit::Failed(ResolverError::source_unavailable(e)),
                None => return StreamExit::Ended,
            }
        }
    }
}

impl AddressFeed for WatchFeed {
    async fn drive(self, mut ctx: EngineContext) {
        loop {
            if ctx.is_cancelled() {
                return;
            }

            let service_name = ctx.service_name().to_string();
            let opened = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => return,
                opened = self.watcher.watch(&service_name) => opened,
            };

            let stream = match opened {
                Ok(stream) => stream,
                Err(e) => {
                    let err = ResolverError::source_unavailable(e);
                    error!(service_name = %service_name, error = %err, "Failed to start watching addresses");
                    ctx.publisher.report(err);
                    ctx.set_phase(Phase::Reconnecting);

                    if !ctx.pause(self.reconnect.delay()).await {
                        return;
                    }
                    continue;
                }
            };

            ctx.set_phase(Phase::Running);

            let delay = match self.consume(&mut ctx, stream).await {
                StreamExit::Cancelled => return,
                StreamExit::Ended => {
                    warn!(service_name = %service_name, "Address stream closed, attempting to reconnect");
                    self.settle_delay
                }
                StreamExit::Failed(err) => {
                    error!(service_name = %service_name, error = %err, "Address stream failed, attempting to reconnect");
                    ctx.publisher.report(err);
                    self.reconnect.delay()
                }
            };

            ctx.set_phase(Phase::Reconnecting);
            if !ctx.pause(delay).await {
                return;
            }
        }
    }
}
