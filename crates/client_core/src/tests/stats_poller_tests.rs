use super::*;
use crate::test_support::{settle, stats_with_users, ScriptedGateway};
use tokio::time::sleep;

const PERIOD: Duration = Duration::from_secs(60);

fn poller(gateway: &Arc<ScriptedGateway>) -> (StatsPoller, broadcast::Receiver<AdminEvent>) {
    let (events, rx) = broadcast::channel(64);
    let gateway: Arc<dyn AdminGateway> = gateway.clone();
    (StatsPoller::new(gateway, AdminId(9), events, PERIOD), rx)
}

/// Lets the poller task run its pending work without crossing a tick.
async fn let_run() {
    sleep(Duration::from_millis(1)).await;
}

fn users(handle: &StatsHandle) -> Option<u64> {
    handle.snapshot().map(|snapshot| snapshot.stats.users)
}

#[tokio::test(start_paused = true)]
async fn activation_fetches_immediately_then_on_every_tick() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.stats.always_ok(stats_with_users(3));
    let (poller, _events) = poller(&gateway);
    let handle = poller.handle();

    poller.activate();
    let_run().await;
    assert_eq!(gateway.stats.calls(), 1);
    assert_eq!(users(&handle), Some(3));
    assert!(poller.is_active());

    sleep(PERIOD).await;
    assert_eq!(gateway.stats.calls(), 2);
    sleep(PERIOD).await;
    assert_eq!(gateway.stats.calls(), 3);
    assert_eq!(gateway.calls()[0], "stats 9");
}

#[tokio::test(start_paused = true)]
async fn activate_twice_keeps_a_single_timer() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.stats.always_ok(stats_with_users(1));
    let (poller, _events) = poller(&gateway);

    poller.activate();
    poller.activate();
    let_run().await;
    sleep(PERIOD).await;

    assert_eq!(gateway.stats.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn first_failure_sets_error_and_timer_keeps_running() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.stats.always_reject("summary unavailable");
    let (poller, mut events) = poller(&gateway);
    let handle = poller.handle();

    poller.activate();
    let_run().await;

    let state = handle.current();
    assert!(state.data().is_none());
    assert_eq!(
        state.error(),
        Some("An error occurred while fetching dashboard data: summary unavailable")
    );
    match events.try_recv() {
        Ok(AdminEvent::Notice(notice)) => assert!(notice.is_error()),
        other => panic!("expected an error notice, got {other:?}"),
    }

    sleep(PERIOD).await;
    assert_eq!(gateway.stats.calls(), 2);
    assert!(poller.is_active());
}

#[tokio::test(start_paused = true)]
async fn failure_after_success_keeps_last_snapshot() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.stats.push_ok(stats_with_users(11));
    gateway.stats.always_reject("flaky");
    let (poller, _events) = poller(&gateway);
    let handle = poller.handle();

    poller.activate();
    let_run().await;
    let first_fetch = handle.snapshot().expect("snapshot").fetched_at;

    sleep(PERIOD).await;
    let state = handle.current();
    assert_eq!(state.label(), "failed");
    assert_eq!(users(&handle), Some(11));
    assert_eq!(handle.snapshot().expect("kept").fetched_at, first_fetch);
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_does_not_shift_the_cadence() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.stats.push_ok(stats_with_users(1));
    gateway.stats.push_ok(stats_with_users(2));
    gateway.stats.always_ok(stats_with_users(3));
    let (poller, _events) = poller(&gateway);
    let handle = poller.handle();

    poller.activate();
    let_run().await;
    sleep(Duration::from_secs(40)).await;

    assert_eq!(handle.refresh().await, FetchOutcome::Applied);
    assert_eq!(users(&handle), Some(2));
    assert_eq!(gateway.stats.calls(), 2);

    // Tick still due at the 60s mark from activation.
    sleep(Duration::from_secs(21)).await;
    assert_eq!(gateway.stats.calls(), 3);
    assert_eq!(users(&handle), Some(3));
}

#[tokio::test(start_paused = true)]
async fn deactivate_stops_ticks_but_keeps_state() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.stats.always_ok(stats_with_users(5));
    let (poller, _events) = poller(&gateway);
    let handle = poller.handle();

    poller.activate();
    let_run().await;
    poller.deactivate();
    let_run().await;
    assert!(!poller.is_active());

    sleep(PERIOD * 3).await;
    assert_eq!(gateway.stats.calls(), 1);
    assert_eq!(users(&handle), Some(5));

    poller.activate();
    let_run().await;
    assert_eq!(gateway.stats.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn deactivate_mid_fetch_restores_last_snapshot() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.stats.push_ok(stats_with_users(4));
    let _held = gateway.stats.hold();
    let (poller, _events) = poller(&gateway);
    let handle = poller.handle();

    assert_eq!(poller.refresh().await, FetchOutcome::Applied);
    poller.activate();
    let_run().await;
    assert_eq!(gateway.stats.calls(), 2);
    assert!(handle.current().is_loading());

    poller.deactivate();

    let state = handle.current();
    assert!(!state.is_loading());
    assert_eq!(state.label(), "loaded");
    assert_eq!(users(&handle), Some(4));
}

#[tokio::test(start_paused = true)]
async fn deactivate_before_first_snapshot_returns_to_idle() {
    let gateway = Arc::new(ScriptedGateway::new());
    let _held = gateway.stats.hold();
    let (poller, _events) = poller(&gateway);
    let handle = poller.handle();

    poller.activate();
    let_run().await;
    assert!(handle.current().is_loading());

    drop(poller);

    assert_eq!(handle.current().label(), "idle");
    assert!(handle.snapshot().is_none());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_poller_cancels_the_timer() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.stats.always_ok(stats_with_users(5));
    let (poller, _events) = poller(&gateway);
    let handle = poller.handle();

    poller.activate();
    let_run().await;
    drop(poller);

    sleep(PERIOD * 2).await;
    assert_eq!(gateway.stats.calls(), 1);
    assert_eq!(users(&handle), Some(5));
}

#[tokio::test]
async fn late_refresh_result_is_discarded() {
    let gateway = Arc::new(ScriptedGateway::new());
    let slow = gateway.stats.hold();
    gateway.stats.push_ok(stats_with_users(20));
    let (poller, _events) = poller(&gateway);
    let handle = poller.handle();

    let first = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refresh().await }
    });
    settle(|| gateway.stats.calls() == 1).await;

    assert_eq!(poller.refresh().await, FetchOutcome::Applied);
    slow.send(Ok(stats_with_users(10)))
        .expect("first refresh still waiting");
    assert_eq!(first.await.expect("join"), FetchOutcome::Superseded);

    assert_eq!(users(&handle), Some(20));
    assert!(!poller.is_active());
}

#[tokio::test]
async fn handle_observes_changes() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.stats.push_ok(stats_with_users(8));
    let (poller, _events) = poller(&gateway);
    let mut handle = poller.handle();

    let waiter = tokio::spawn(async move {
        loop {
            handle.changed().await;
            if let Some(snapshot) = handle.snapshot() {
                return snapshot.stats.users;
            }
        }
    });
    tokio::task::yield_now().await;

    poller.refresh().await;
    assert_eq!(waiter.await.expect("join"), 8);
}

#[test]
fn zero_interval_falls_back_to_default() {
    let gateway: Arc<dyn AdminGateway> = Arc::new(ScriptedGateway::new());
    let (events, _rx) = broadcast::channel(4);
    let poller = StatsPoller::new(gateway, AdminId(1), events, Duration::ZERO);
    assert_eq!(poller.interval(), DEFAULT_POLL_INTERVAL);
}
