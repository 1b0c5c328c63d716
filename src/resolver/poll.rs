//! 拉取式解析器
//!
//! 启动时立即拉取一次，此后按固定间隔（或 `resolve_now` 请求）拉取：
//! 1. 拉取失败按指数退避重试，全部失败则上报错误并跳过本周期
//! 2. 与上次发布的集合比较，没有变化则什么都不做
//! 3. 有变化则在锁内替换 `last_published` 并推送给下游

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use crate::error::ResolverError;
use crate::resolver::engine::{AddressFeed, EngineContext};
use crate::resolver::source::Puller;
use crate::retry::{ExponentialBackoffPolicy, retry_with_policy};
use crate::types::Phase;

pub(crate) struct PollFeed {
    puller: Arc<dyn Puller>,
    interval: Duration,
    retry: ExponentialBackoffPolicy,
}

impl PollFeed {
    pub(crate) fn new(
        puller: Arc<dyn Puller>,
        interval: Duration,
        retry: ExponentialBackoffPolicy,
    ) -> Self {
        Self {
            puller,
            interval,
            retry,
        }
    }

    /// 执行一个完整的 获取 → 比较 → 发布 周期
    async fn poll_once(&self, ctx: &mut EngineContext) {
        let service_name = ctx.service_name().to_string();
        let result = retry_with_policy(&self.retry, &ctx.cancel, |_attempt| {
            let puller = self.puller.clone();
            let service_name = service_name.clone();
            async move {
                puller
                    .pull(&service_name)
                    .await
                    .map_err(ResolverError::source_unavailable)
            }
        })
        .await;

        match result {
            Ok(addresses) => {
                if ctx.is_cancelled() {
                    return;
                }
                ctx.publisher.apply(addresses).await;
            }
            Err(ResolverError::Cancelled) => {
                debug!(service_name = %service_name, "Pull cancelled during shutdown");
            }
            Err(e) => {
                error!(service_name = %service_name, error = %e, "Can not pull addresses");
                ctx.publisher.report(e);
            }
        }
    }
}

impl AddressFeed for PollFeed {
    async fn drive(self, mut ctx: EngineContext) {
        ctx.set_phase(Phase::Running);

        // 第一次 tick 立即完成，即启动时的首次拉取
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let resolve_now = ctx.resolve_now.clone();

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = resolve_now.notified() => {
                    debug!(service_name = %ctx.service_name(), "Resolve now requested");
                }
            }

            self.poll_once(&mut ctx).await;
        }
    }
}
