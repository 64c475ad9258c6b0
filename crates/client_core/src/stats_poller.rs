//! Single writer of the dashboard stats snapshot.
//!
//! The poller fetches once on activation, then again on a fixed cadence.
//! Consumers hold a [`StatsHandle`], which can read the current state, wait
//! for changes and request an out-of-band refresh, but never write.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{domain::AdminId, protocol::DashboardStats};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    events::{AdminEvent, Notice},
    fetch_status::{FetchOutcome, FetchStatus},
    gateway::AdminGateway,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub stats: DashboardStats,
    pub fetched_at: DateTime<Utc>,
}

pub type StatsState = FetchStatus<StatsSnapshot>;

struct PollerShared {
    gateway: Arc<dyn AdminGateway>,
    admin_id: AdminId,
    events: broadcast::Sender<AdminEvent>,
    state: watch::Sender<StatsState>,
    issued: AtomicU64,
}

impl PollerShared {
    async fn fetch(&self) -> FetchOutcome {
        let request_id = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| state.begin_loading());
        debug!(admin_id = self.admin_id.0, request_id, "stats: fetching summary");

        let result = self.gateway.dashboard_stats(self.admin_id).await;

        let mut outcome = FetchOutcome::Superseded;
        let mut failure = None;
        self.state.send_if_modified(|state| {
            if self.issued.load(Ordering::SeqCst) != request_id {
                return false;
            }
            match result {
                Ok(stats) => {
                    state.complete(StatsSnapshot {
                        stats,
                        fetched_at: Utc::now(),
                    });
                    outcome = FetchOutcome::Applied;
                }
                Err(err) => {
                    let notice =
                        Notice::failure("An error occurred while fetching dashboard data", &err);
                    state.fail(notice.description.clone());
                    outcome = FetchOutcome::Failed {
                        reason: notice.description.clone(),
                    };
                    failure = Some(notice);
                }
            }
            true
        });

        match &outcome {
            FetchOutcome::Applied => {
                let fetched_at = self
                    .state
                    .borrow()
                    .data()
                    .map(|snapshot| snapshot.fetched_at)
                    .unwrap_or_else(Utc::now);
                info!(admin_id = self.admin_id.0, request_id, "stats: snapshot refreshed");
                let _ = self.events.send(AdminEvent::StatsRefreshed { fetched_at });
            }
            FetchOutcome::Failed { reason } => {
                warn!(admin_id = self.admin_id.0, request_id, "stats: {reason}");
                if let Some(notice) = failure {
                    let _ = self.events.send(AdminEvent::Notice(notice));
                }
            }
            FetchOutcome::Superseded | FetchOutcome::Skipped => {
                debug!(request_id, "stats: discarding stale summary");
            }
        }
        outcome
    }
}

/// Read-only view of the poller's state handed to consumers.
#[derive(Clone)]
pub struct StatsHandle {
    shared: Arc<PollerShared>,
    rx: watch::Receiver<StatsState>,
}

impl StatsHandle {
    pub fn current(&self) -> StatsState {
        self.rx.borrow().clone()
    }

    pub fn snapshot(&self) -> Option<Arc<StatsSnapshot>> {
        self.rx.borrow().data().cloned()
    }

    /// Waits for the next state change.
    pub async fn changed(&mut self) {
        // The handle keeps the sender alive, so this cannot observe a closed channel.
        let _ = self.rx.changed().await;
    }

    pub async fn refresh(&self) -> FetchOutcome {
        self.shared.fetch().await
    }
}

pub struct StatsPoller {
    shared: Arc<PollerShared>,
    interval: Duration,
    timer: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl StatsPoller {
    pub fn new(
        gateway: Arc<dyn AdminGateway>,
        admin_id: AdminId,
        events: broadcast::Sender<AdminEvent>,
        interval: Duration,
    ) -> Self {
        let interval = if interval.is_zero() {
            warn!("stats: zero poll interval, using the default");
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        let (state, _) = watch::channel(StatsState::Idle);
        Self {
            shared: Arc::new(PollerShared {
                gateway,
                admin_id,
                events,
                state,
                issued: AtomicU64::new(0),
            }),
            interval,
            timer: std::sync::Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn handle(&self) -> StatsHandle {
        StatsHandle {
            shared: Arc::clone(&self.shared),
            rx: self.shared.state.subscribe(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.timer
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|task| !task.is_finished()))
            .unwrap_or(false)
    }

    /// Starts polling: one fetch now, then one every `interval`.
    ///
    /// The cadence is fixed at activation; manual refreshes do not shift it.
    /// Calling this on an active poller does nothing.
    pub fn activate(&self) {
        let Ok(mut slot) = self.timer.lock() else {
            warn!("stats: timer slot poisoned; poller not activated");
            return;
        };
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("stats: poller already active");
            return;
        }

        let shared = Arc::clone(&self.shared);
        let period = self.interval;
        info!(
            admin_id = shared.admin_id.0,
            interval_secs = period.as_secs(),
            "stats: poller activated"
        );
        *slot = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            shared.fetch().await;
            loop {
                ticker.tick().await;
                shared.fetch().await;
            }
        }));
    }

    /// Immediate fetch outside the timer cadence.
    pub async fn refresh(&self) -> FetchOutcome {
        self.shared.fetch().await
    }

    /// Cancels the repeating timer. The last state stays readable.
    ///
    /// A fetch still in flight is discarded and the state falls back to the
    /// last snapshot, or `Idle` if there is none.
    pub fn deactivate(&self) {
        let task = self.timer.lock().ok().and_then(|mut slot| slot.take());
        if let Some(task) = task {
            task.abort();
            self.shared.issued.fetch_add(1, Ordering::SeqCst);
            self.shared.state.send_if_modified(|state| state.cancel_loading());
            info!(admin_id = self.shared.admin_id.0, "stats: poller deactivated");
        }
    }
}

impl Drop for StatsPoller {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
#[path = "tests/stats_poller_tests.rs"]
mod tests;
