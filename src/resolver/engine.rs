//! 通用解析引擎
//!
//! 拉取式与推送式解析器共用同一条"比较 → 发布"路径和同一套生命周期：
//! - 每个引擎实例只有一个后台任务，它是 `last_published` 的唯一写者
//! - 每个引擎实例持有一把互斥锁，保证同一时刻最多一个 `update_state` 调用
//! - 关闭时通过 `CancellationToken` 通知后台任务，再等待阶段通道变为 `Closed`

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{ResolverError, Result};
use crate::resolver::differ;
use crate::resolver::sink::StateSink;
use crate::types::{AddressSet, Phase};

/// 地址获取方式（拉取 / 推送）
///
/// 实现方在后台任务中运行，直到取消信号触发后返回。
pub(crate) trait AddressFeed: Send + 'static {
    fn drive(self, ctx: EngineContext) -> impl Future<Output = ()> + Send;
}

/// 比较并发布地址集合
pub(crate) struct Publisher {
    service_name: String,
    last_published: AddressSet,
    sink: Arc<dyn StateSink>,
    update_lock: Mutex<()>,
    cancel: CancellationToken,
}

impl Publisher {
    fn new(service_name: String, sink: Arc<dyn StateSink>, cancel: CancellationToken) -> Self {
        Self {
            service_name,
            last_published: AddressSet::new(),
            sink,
            update_lock: Mutex::new(()),
            cancel,
        }
    }

    /// 与上次发布的集合比较，有变化时发布
    ///
    /// 先替换 `last_published` 再调用下游；下游失败只上报错误，不回滚。
    /// 下游调用与取消信号竞争，关闭时直接放弃在途的发布。
    /// 返回是否发生了发布。
    pub(crate) async fn apply(&mut self, addresses: AddressSet) -> bool {
        if !differ::changed(&self.last_published, &addresses) {
            debug!(service_name = %self.service_name, "Address set unchanged, skipping update");
            return false;
        }

        let _guard = self.update_lock.lock().await;
        self.last_published = addresses.clone();

        let count = addresses.len();
        let logged = addresses.to_strings();
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(service_name = %self.service_name, "Update abandoned during shutdown");
                return true;
            }
            result = self.sink.update_state(addresses) => result,
        };

        match result {
            Ok(()) => {
                info!(
                    service_name = %self.service_name,
                    addresses = ?logged,
                    count,
                    "Successfully updated resolver state"
                );
            }
            Err(e) => {
                error!(service_name = %self.service_name, error = %e, "Failed to update resolver state");
                self.sink.report_error(ResolverError::sink_rejected(e));
            }
        }
        true
    }

    /// 向下游上报错误；取消不属于用户可见错误，直接忽略
    pub(crate) fn report(&self, err: ResolverError) {
        if err.is_cancelled() {
            return;
        }
        self.sink.report_error(err);
    }

    pub(crate) fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// 后台任务持有的引擎状态
pub(crate) struct EngineContext {
    pub(crate) publisher: Publisher,
    pub(crate) cancel: CancellationToken,
    pub(crate) resolve_now: Arc<Notify>,
    phase: Arc<watch::Sender<Phase>>,
}

impl EngineContext {
    pub(crate) fn service_name(&self) -> &str {
        self.publisher.service_name()
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        transition(&self.phase, self.publisher.service_name(), phase);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 可取消的等待；被取消时返回 `false`
    pub(crate) async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

fn transition(tx: &watch::Sender<Phase>, service_name: &str, phase: Phase) {
    tx.send_if_modified(|current| {
        // 进入 Closing 之后只能由退出标记写入 Closed
        if *current == phase || *current == Phase::Closing {
            return false;
        }
        debug!(service_name, from = %current, to = %phase, "Resolver phase changed");
        *current = phase;
        true
    });
}

/// 后台任务退出时把阶段置为 `Closed`，只触发一次（panic 时同样触发）
struct ExitSignal(Arc<watch::Sender<Phase>>);

impl Drop for ExitSignal {
    fn drop(&mut self) {
        self.0.send_replace(Phase::Closed);
    }
}

/// 启动引擎后台任务
///
/// 调用方负责事先校验服务名；必须在 tokio 运行时内调用。
pub(crate) fn spawn<F: AddressFeed>(
    service_name: String,
    feed: F,
    sink: Arc<dyn StateSink>,
) -> Result<ResolverHandle> {
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| ResolverError::Runtime(e.to_string()))?;

    let cancel = CancellationToken::new();
    let resolve_now = Arc::new(Notify::new());
    let (phase_tx, phase_rx) = watch::channel(Phase::Starting);
    let phase_tx = Arc::new(phase_tx);

    let ctx = EngineContext {
        publisher: Publisher::new(service_name.clone(), sink, cancel.clone()),
        cancel: cancel.clone(),
        resolve_now: resolve_now.clone(),
        phase: phase_tx.clone(),
    };

    let shutdown = cancel.clone();
    let task_service_name = service_name.clone();
    runtime.spawn(async move {
        let exit = ExitSignal(phase_tx);
        let drive = feed.drive(ctx);
        tokio::pin!(drive);

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                // 取消后 feed 在下一个检查点退出
                transition(&exit.0, &task_service_name, Phase::Closing);
                drive.await;
            }
            _ = &mut drive => {}
        }
    });

    Ok(ResolverHandle {
        service_name,
        cancel,
        resolve_now,
        phase: phase_rx,
    })
}

/// 解析器句柄
///
/// 由构建器返回，持有后台任务的取消信号和完成标记。
/// 丢弃句柄会取消后台任务但不等待其退出；需要"关闭后不再有下游调用"的保证时请调用 [`close`](Self::close)。
#[derive(Debug)]
pub struct ResolverHandle {
    service_name: String,
    cancel: CancellationToken,
    resolve_now: Arc<Notify>,
    phase: watch::Receiver<Phase>,
}

impl ResolverHandle {
    /// 绑定的服务名
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// 当前生命周期阶段
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// 请求立即执行一次解析
    ///
    /// 由后台任务自己执行，不会破坏"最多一个发布在途"的约束。监听解析器忽略该请求。
    pub fn resolve_now(&self) {
        self.resolve_now.notify_one();
    }

    /// 关闭解析器
    ///
    /// 发出取消信号并等待后台任务退出。返回之后不会再有任何 `update_state` / `report_error` 调用。
    /// 可以重复调用，每次都会等到后台任务退出。
    pub async fn close(&self) {
        info!(service_name = %self.service_name, "Resolver is closing");
        self.cancel.cancel();

        let mut phase = self.phase.clone();
        // 发送端只会在写入 Closed 之后被丢弃
        let _ = phase.wait_for(|p| *p == Phase::Closed).await;

        info!(service_name = %self.service_name, "Resolver is closed");
    }

    /// 后台任务是否已经退出
    pub fn is_closed(&self) -> bool {
        self.phase() == Phase::Closed
    }
}

impl Drop for ResolverHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
