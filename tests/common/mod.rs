//! 测试共用的地址源与下游替身

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flare_simplelb::{AddressSet, AddressStream, BoxError, Puller, ResolverError, StateSink, Watcher};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub fn set(addresses: &[&str]) -> AddressSet {
    addresses.iter().copied().collect()
}

/// 记录所有下游调用的 sink
#[derive(Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<AddressSet>>,
    errors: Mutex<Vec<ResolverError>>,
    fail_updates: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let sink = Self::default();
        sink.fail_updates.store(true, Ordering::SeqCst);
        Arc::new(sink)
    }

    pub fn updates(&self) -> Vec<AddressSet> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn errors(&self) -> Vec<ResolverError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateSink for RecordingSink {
    async fn update_state(&self, addresses: AddressSet) -> Result<(), BoxError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;

        self.updates.lock().unwrap().push(addresses);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err("connection manager rejected state".into());
        }
        Ok(())
    }

    fn report_error(&self, error: ResolverError) {
        self.errors.lock().unwrap().push(error);
    }
}

/// 返回可随时替换的地址集合，也可切换为持续失败
pub struct ScriptedPuller {
    addresses: Mutex<AddressSet>,
    failing: AtomicBool,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedPuller {
    pub fn new(addresses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            addresses: Mutex::new(set(addresses)),
            failing: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        let puller = Self::new(&[]);
        puller.set_failing(true);
        puller
    }

    pub fn set_addresses(&self, addresses: &[&str]) {
        *self.addresses.lock().unwrap() = set(addresses);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Puller for ScriptedPuller {
    async fn pull(&self, _service_name: &str) -> Result<AddressSet, BoxError> {
        self.calls.lock().unwrap().push(Instant::now());
        if self.failing.load(Ordering::SeqCst) {
            return Err("endpoints api unavailable".into());
        }
        Ok(self.addresses.lock().unwrap().clone())
    }
}

/// 每次拉取返回不同地址的 puller，用于制造持续的更新
#[derive(Default)]
pub struct ChangingPuller {
    calls: AtomicUsize,
}

#[async_trait]
impl Puller for ChangingPuller {
    async fn pull(&self, _service_name: &str) -> Result<AddressSet, BoxError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(set(&[format!("10.0.0.{}:8080", n % 250).as_str()]))
    }
}

pub type BatchSender = mpsc::UnboundedSender<Result<Vec<&'static str>, String>>;

/// 每次 watch 从队列中取出一个预先准备的流；队列为空时返回永不产出的流
#[derive(Default)]
pub struct ChannelWatcher {
    streams: Mutex<VecDeque<mpsc::UnboundedReceiver<Result<Vec<&'static str>, String>>>>,
    open_failures: AtomicUsize,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ChannelWatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 准备下一次 watch 返回的流
    pub fn push_stream(&self) -> BatchSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.streams.lock().unwrap().push_back(rx);
        tx
    }

    /// 接下来 `n` 次 watch 直接失败
    pub fn fail_next_opens(&self, n: usize) {
        self.open_failures.store(n, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Watcher for ChannelWatcher {
    async fn watch(&self, service_name: &str) -> Result<AddressStream, BoxError> {
        self.calls
            .lock()
            .unwrap()
            .push((service_name.to_string(), Instant::now()));

        let failures = self.open_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.open_failures.store(failures - 1, Ordering::SeqCst);
            return Err("failed to start watching endpoints".into());
        }

        let Some(rx) = self.streams.lock().unwrap().pop_front() else {
            return Ok(Box::pin(futures::stream::pending::<Result<AddressSet, BoxError>>()));
        };

        let stream = UnboundedReceiverStream::new(rx).map(|batch| {
            batch
                .map(|addresses| addresses.into_iter().collect::<AddressSet>())
                .map_err(BoxError::from)
        });
        Ok(Box::pin(stream))
    }
}
