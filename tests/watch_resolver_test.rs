//! 推送式解析器集成测试

mod common;

use std::time::Duration;

use common::{ChannelWatcher, RecordingSink, set};
use flare_simplelb::{
    Phase, ResolverBuilder, ResolverConfig, ResolverError, Target, WATCHER_SCHEME,
    WatchResolverBuilder,
};
use tokio::time::sleep;

fn target(service: &str) -> Target {
    Target::new(WATCHER_SCHEME, service)
}

fn builder(watcher: std::sync::Arc<ChannelWatcher>) -> WatchResolverBuilder {
    WatchResolverBuilder::new(watcher)
        .with_reconnect_delay(Duration::from_millis(100))
        .unwrap()
        .with_settle_delay(Duration::from_millis(200))
        .unwrap()
}

/// 测试：逐批比较，只有变化时发布
#[tokio::test(start_paused = true)]
async fn test_watch_publishes_only_on_change() {
    let watcher = ChannelWatcher::new();
    let tx = watcher.push_stream();
    let sink = RecordingSink::new();
    let resolver = builder(watcher.clone())
        .build(&target("test-service"), sink.clone())
        .unwrap();

    tx.send(Ok(vec!["127.0.0.1:8080", "127.0.0.1:8081"])).unwrap();
    sleep(Duration::from_millis(10)).await;
    tx.send(Ok(vec!["127.0.0.1:8081", "127.0.0.1:8080"])).unwrap();
    sleep(Duration::from_millis(10)).await;
    tx.send(Ok(vec!["127.0.0.1:8080", "127.0.0.1:8081", "127.0.0.1:8082"]))
        .unwrap();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(resolver.phase(), Phase::Running);
    resolver.close().await;

    let updates = sink.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0], set(&["127.0.0.1:8080", "127.0.0.1:8081"]));
    assert_eq!(
        updates[1].to_strings(),
        vec!["127.0.0.1:8080", "127.0.0.1:8081", "127.0.0.1:8082"]
    );
    assert_eq!(sink.error_count(), 0);

    let calls = watcher.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "test-service");
}

/// 测试：流正常结束后等待稳定延迟再重新打开，不上报错误
#[tokio::test(start_paused = true)]
async fn test_watch_reconnects_after_graceful_end() {
    let watcher = ChannelWatcher::new();
    let first = watcher.push_stream();
    let second = watcher.push_stream();
    let sink = RecordingSink::new();
    let resolver = builder(watcher.clone())
        .build(&target("svc"), sink.clone())
        .unwrap();

    first.send(Ok(vec!["a:1"])).unwrap();
    sleep(Duration::from_millis(10)).await;
    drop(first);

    sleep(Duration::from_millis(50)).await;
    assert_eq!(watcher.call_count(), 1);
    assert_eq!(resolver.phase(), Phase::Reconnecting);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(watcher.call_count(), 2);
    assert_eq!(resolver.phase(), Phase::Running);

    let calls = watcher.calls();
    let gap = calls[1].1 - calls[0].1;
    assert!(gap >= Duration::from_millis(200), "reopened too early: {gap:?}");
    assert!(gap < Duration::from_millis(300), "reopened too late: {gap:?}");

    // 新流上的相同集合不会重复发布
    second.send(Ok(vec!["a:1"])).unwrap();
    sleep(Duration::from_millis(10)).await;
    second.send(Ok(vec!["a:1", "b:1"])).unwrap();
    sleep(Duration::from_millis(10)).await;

    resolver.close().await;
    assert_eq!(sink.update_count(), 2);
    assert_eq!(sink.error_count(), 0);
}

/// 测试：打开失败时上报错误并按固定延迟重试
#[tokio::test(start_paused = true)]
async fn test_watch_open_failure_is_reported_and_retried() {
    let watcher = ChannelWatcher::new();
    watcher.fail_next_opens(2);
    let tx = watcher.push_stream();
    let sink = RecordingSink::new();
    let resolver = builder(watcher.clone())
        .build(&target("svc"), sink.clone())
        .unwrap();

    sleep(Duration::from_millis(250)).await;
    assert_eq!(watcher.call_count(), 3);

    let errors = sink.errors();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| matches!(e, ResolverError::SourceUnavailable(_))));

    let calls = watcher.calls();
    for pair in calls.windows(2) {
        let gap = pair[1].1 - pair[0].1;
        assert!(gap >= Duration::from_millis(100));
        assert!(gap < Duration::from_millis(150));
    }

    tx.send(Ok(vec!["a:1"])).unwrap();
    sleep(Duration::from_millis(10)).await;
    resolver.close().await;
    assert_eq!(sink.update_count(), 1);
}

/// 测试：流中的错误项会被上报，然后重新打开
#[tokio::test(start_paused = true)]
async fn test_watch_stream_error_triggers_reconnect() {
    let watcher = ChannelWatcher::new();
    let first = watcher.push_stream();
    let second = watcher.push_stream();
    let sink = RecordingSink::new();
    let resolver = builder(watcher.clone())
        .build(&target("svc"), sink.clone())
        .unwrap();

    first.send(Ok(vec!["a:1"])).unwrap();
    first.send(Err("watch channel broken".to_string())).unwrap();
    sleep(Duration::from_millis(150)).await;

    assert_eq!(watcher.call_count(), 2);
    let errors = sink.errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], ResolverError::SourceUnavailable(msg) if msg.contains("broken")));

    second.send(Ok(vec!["b:1"])).unwrap();
    sleep(Duration::from_millis(10)).await;
    resolver.close().await;

    let updates = sink.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[1], set(&["b:1"]));
}

/// 测试：close 返回后即使流上还有数据也不会再发布
#[tokio::test(start_paused = true)]
async fn test_watch_close_stops_all_sink_calls() {
    let watcher = ChannelWatcher::new();
    let tx = watcher.push_stream();
    let sink = RecordingSink::new();
    let resolver = builder(watcher.clone())
        .build(&target("svc"), sink.clone())
        .unwrap();

    tx.send(Ok(vec!["a:1"])).unwrap();
    sleep(Duration::from_millis(10)).await;

    resolver.close().await;
    assert_eq!(resolver.phase(), Phase::Closed);

    let _ = tx.send(Ok(vec!["a:1", "b:1"]));
    sleep(Duration::from_millis(500)).await;

    assert_eq!(sink.update_count(), 1);
    assert_eq!(sink.error_count(), 0);
    assert_eq!(watcher.call_count(), 1);
}

/// 测试：重连等待期间关闭立即返回
#[tokio::test(start_paused = true)]
async fn test_watch_close_during_reconnect_wait() {
    let watcher = ChannelWatcher::new();
    watcher.fail_next_opens(usize::MAX);
    let sink = RecordingSink::new();
    let resolver = WatchResolverBuilder::new(watcher.clone())
        .with_reconnect_delay(Duration::from_secs(30))
        .unwrap()
        .build(&target("svc"), sink.clone())
        .unwrap();

    sleep(Duration::from_millis(10)).await;
    assert_eq!(resolver.phase(), Phase::Reconnecting);

    let started = tokio::time::Instant::now();
    resolver.close().await;
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(watcher.call_count(), 1);
    assert_eq!(sink.error_count(), 1);
}

/// 测试：resolve_now 对推送式解析器没有影响
#[tokio::test(start_paused = true)]
async fn test_watch_resolve_now_is_noop() {
    let watcher = ChannelWatcher::new();
    let _tx = watcher.push_stream();
    let sink = RecordingSink::new();
    let resolver = builder(watcher.clone())
        .build(&target("svc"), sink.clone())
        .unwrap();

    sleep(Duration::from_millis(10)).await;
    resolver.resolve_now();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(watcher.call_count(), 1);
    resolver.close().await;
}

/// 测试：从配置构建时使用配置中的延迟
#[tokio::test(start_paused = true)]
async fn test_watch_builder_from_config() {
    let config = ResolverConfig::from_toml_str(
        r#"
        [watch]
        reconnect_delay_ms = 40
        settle_delay_ms = 70
        "#,
    )
    .unwrap();

    let watcher = ChannelWatcher::new();
    let first = watcher.push_stream();
    let sink = RecordingSink::new();
    let resolver = WatchResolverBuilder::from_config(watcher.clone(), &config)
        .unwrap()
        .build(&target("svc"), sink)
        .unwrap();

    sleep(Duration::from_millis(5)).await;
    drop(first);
    sleep(Duration::from_millis(100)).await;

    let calls = watcher.calls();
    assert_eq!(calls.len(), 2);
    let gap = calls[1].1 - calls[0].1;
    assert!(gap >= Duration::from_millis(70));

    resolver.close().await;
}
