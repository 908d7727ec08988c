// tests/status_poller_tests.rs
//
// Schedule tests run on tokio's paused clock, so the 30 second interval
// elapses instantly once every task is idle.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use groupcast_core::models::{GatewayStatus, Instance, InstanceStatus};
use groupcast_core::services::InstanceStatusReconciler;
use groupcast_core::tasks::status_polling::{InstanceStatusPoller, DEFAULT_POLL_INTERVAL};
use groupcast_core::test_utils::helpers::{
    sample_instance, InMemoryInstanceRepository, ScriptedGateway, ScriptedReply,
};

fn online() -> ScriptedReply {
    ScriptedReply::Status(GatewayStatus {
        connected: true,
        logged_in: true,
        phone_number: Some("+5511900000000".into()),
        ..Default::default()
    })
}

fn build(instances: &[Instance]) -> (Arc<ScriptedGateway>, Arc<InMemoryInstanceRepository>, Arc<InstanceStatusPoller>) {
    let gateway = Arc::new(ScriptedGateway::new());
    let repo = Arc::new(InMemoryInstanceRepository::with_instances(instances.to_vec()));
    let reconciler = Arc::new(InstanceStatusReconciler::new(gateway.clone(), repo.clone()));
    let poller = Arc::new(InstanceStatusPoller::new(reconciler, DEFAULT_POLL_INTERVAL));
    (gateway, repo, poller)
}

#[tokio::test(start_paused = true)]
async fn test_cold_start_then_every_interval_until_shutdown() {
    let instances = vec![sample_instance(1, Some("a")), sample_instance(2, Some("b"))];
    let (gateway, _repo, poller) = build(&instances);
    gateway.set_reply("a", online());
    gateway.set_reply("b", online());
    poller.set_instances(instances).await;

    let handle = poller.spawn();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(gateway.status_calls(), 2, "cold start checks every instance once");
    assert!(handle.is_running());

    sleep(Duration::from_secs(30)).await;
    assert_eq!(gateway.status_calls(), 4, "one more round after the interval");

    handle.shutdown().await;
    sleep(Duration::from_secs(120)).await;
    assert_eq!(gateway.status_calls(), 4, "no polling after shutdown");
}

#[tokio::test(start_paused = true)]
async fn test_idle_while_empty_then_cold_start() {
    let inst = sample_instance(3, Some("c"));
    let (gateway, _repo, poller) = build(std::slice::from_ref(&inst));
    gateway.set_reply("c", online());

    let handle = poller.spawn();
    sleep(Duration::from_secs(65)).await;
    assert_eq!(gateway.status_calls(), 0, "empty list must not be polled");

    poller.set_instances(vec![inst]).await;
    sleep(Duration::from_secs(1)).await;
    assert_eq!(gateway.status_calls(), 1, "cold start as soon as the list is non-empty");

    sleep(Duration::from_secs(28)).await;
    assert_eq!(gateway.status_calls(), 1);
    sleep(Duration::from_secs(3)).await;
    assert_eq!(gateway.status_calls(), 2, "next poll one interval after the cold start");

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_polling() {
    let inst = sample_instance(4, Some("d"));
    let (gateway, _repo, poller) = build(std::slice::from_ref(&inst));
    gateway.set_reply("d", online());
    poller.set_instances(vec![inst]).await;

    let handle = poller.spawn();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(gateway.status_calls(), 1);

    drop(handle);
    sleep(Duration::from_secs(300)).await;
    assert_eq!(gateway.status_calls(), 1);
}

#[tokio::test]
async fn test_manual_refresh_updates_view_and_primary_instance() {
    let mut first = sample_instance(1, Some("down"));
    first.status = Some("conectado".into());
    let second = sample_instance(2, Some("up"));
    let no_key = sample_instance(3, None);
    let (gateway, repo, poller) = build(&[first.clone(), second.clone(), no_key.clone()]);
    gateway.set_reply(
        "down",
        ScriptedReply::Status(GatewayStatus { connected: false, logged_in: false, ..Default::default() }),
    );
    gateway.set_reply("up", online());
    poller.set_instances(vec![first, second, no_key]).await;

    let before = poller.primary_instance().await.expect("list is not empty");
    assert_eq!(before.instance.id, 1, "first connected instance wins");
    assert!(poller.snapshot().await.last_check.is_none());

    let refreshed = poller.refresh().await;

    assert_eq!(refreshed.len(), 3);
    assert_eq!(refreshed[0].instance.connection_status(), InstanceStatus::Disconnected);
    assert_eq!(refreshed[1].instance.connection_status(), InstanceStatus::Connected);
    assert_eq!(refreshed[2].instance.status, None);
    assert!(refreshed.iter().all(|t| !t.is_checking));

    let after = poller.primary_instance().await.expect("list is not empty");
    assert_eq!(after.instance.id, 2);

    let snap = poller.snapshot().await;
    assert!(snap.last_check.is_some());
    assert!(!snap.is_refreshing);
    assert_eq!(repo.recorded_updates().len(), 2);
    assert_eq!(gateway.status_calls(), 2);
}

#[tokio::test]
async fn test_refresh_on_empty_list_is_noop() {
    let (gateway, _repo, poller) = build(&[]);

    let out = poller.refresh().await;

    assert!(out.is_empty());
    assert!(poller.primary_instance().await.is_none());
    assert!(poller.snapshot().await.last_check.is_none());
    assert_eq!(gateway.status_calls(), 0);
}

#[tokio::test]
async fn test_overlapping_refreshes_both_complete() {
    let inst = sample_instance(9, Some("z"));
    let (gateway, repo, poller) = build(std::slice::from_ref(&inst));
    gateway.set_reply("z", online());
    poller.set_instances(vec![inst]).await;

    let (a, b) = tokio::join!(poller.refresh(), poller.refresh());

    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);
    assert_eq!(gateway.status_calls(), 2);
    assert!(!repo.recorded_updates().is_empty());
    assert!(!poller.snapshot().await.is_refreshing);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_refresh_releases_refreshing_state() {
    let inst = sample_instance(5, Some("slow"));
    let (gateway, _repo, poller) = build(std::slice::from_ref(&inst));
    gateway.set_reply("slow", online());
    gateway.set_delay(Duration::from_secs(5));
    poller.set_instances(vec![inst]).await;

    let res = timeout(Duration::from_secs(1), poller.refresh()).await;
    assert!(res.is_err(), "refresh should still be waiting on the gateway");

    sleep(Duration::from_secs(60)).await;
    let snap = poller.snapshot().await;
    assert!(!snap.is_refreshing);
    assert!(snap.instances.iter().all(|t| !t.is_checking));

    let out = poller.refresh().await;
    assert_eq!(out[0].instance.connection_status(), InstanceStatus::Connected);
    assert!(!poller.snapshot().await.is_refreshing);
}

#[tokio::test(start_paused = true)]
async fn test_list_reloaded_during_poll_keeps_new_rows() {
    let old = sample_instance(1, Some("old"));
    let (gateway, repo, poller) = build(std::slice::from_ref(&old));
    gateway.set_reply("old", online());
    gateway.set_delay(Duration::from_secs(5));
    poller.set_instances(vec![old]).await;

    let poll = {
        let poller = poller.clone();
        tokio::spawn(async move { poller.check_all().await })
    };
    sleep(Duration::from_secs(1)).await;
    assert!(poller.snapshot().await.is_refreshing);

    let mut rotated = sample_instance(1, Some("rotated-key"));
    rotated.name = "renamed".into();
    poller.set_instances(vec![rotated]).await;
    poll.await.expect("poll task panicked");

    let snap = poller.snapshot().await;
    assert_eq!(snap.instances.len(), 1);
    assert_eq!(snap.instances[0].instance.api_key.as_deref(), Some("rotated-key"));
    assert_eq!(snap.instances[0].instance.name, "renamed");
    assert!(!snap.instances[0].is_checking);
    assert!(!snap.is_refreshing);
    assert!(snap.last_check.is_some());
    // The write made for the old row still reached the store.
    assert_eq!(repo.recorded_updates().len(), 1);
}
