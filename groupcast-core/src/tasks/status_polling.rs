// groupcast-core/src/tasks/status_polling.rs

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use groupcast_common::models::{Instance, InstanceStatus, TrackedInstance};
use crate::services::InstanceStatusReconciler;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Default)]
struct PollerState {
    instances: Vec<TrackedInstance>,
    last_check: Option<DateTime<Utc>>,
    in_flight: usize,
    has_checked: bool,
    /// Bumped by every `set_instances`; a poll only merges back into the
    /// list it started from.
    generation: u64,
}

/// A point-in-time copy of what the poller knows, for display.
#[derive(Debug, Clone)]
pub struct PollerSnapshot {
    pub instances: Vec<TrackedInstance>,
    pub last_check: Option<DateTime<Utc>>,
    pub is_refreshing: bool,
}

/// Owns the list of tracked instances and re-checks their status on a fixed
/// interval. Whoever owns the instance list owns the poller; the recurring
/// work only exists between [`InstanceStatusPoller::spawn`] and
/// [`PollerHandle::shutdown`] (or the handle being dropped).
pub struct InstanceStatusPoller {
    reconciler: Arc<InstanceStatusReconciler>,
    interval: Duration,
    state: Mutex<PollerState>,
    list_changed: Notify,
}

impl InstanceStatusPoller {
    pub fn new(reconciler: Arc<InstanceStatusReconciler>, interval: Duration) -> Self {
        Self {
            reconciler,
            interval,
            state: Mutex::new(PollerState::default()),
            list_changed: Notify::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Replaces the tracked list, e.g. after (re)loading it from the store.
    pub async fn set_instances(&self, instances: Vec<Instance>) {
        {
            let mut st = self.lock_state();
            st.instances = instances.into_iter().map(TrackedInstance::from).collect();
            st.generation += 1;
        }
        self.list_changed.notify_one();
    }

    pub async fn snapshot(&self) -> PollerSnapshot {
        let st = self.lock_state();
        PollerSnapshot {
            instances: st.instances.clone(),
            last_check: st.last_check,
            is_refreshing: st.in_flight > 0,
        }
    }

    /// The instance the dashboard shows first: the first connected one,
    /// otherwise the first in the list.
    pub async fn primary_instance(&self) -> Option<TrackedInstance> {
        let st = self.lock_state();
        st.instances
            .iter()
            .find(|t| t.instance.connection_status() == InstanceStatus::Connected)
            .or_else(|| st.instances.first())
            .cloned()
    }

    /// Manual refresh. Safe to call while a timed poll is running; both
    /// complete and the later store write wins.
    pub async fn refresh(&self) -> Vec<TrackedInstance> {
        self.check_all().await;
        self.lock_state().instances.clone()
    }

    /// Reconciles every tracked instance once. Does nothing for an empty list.
    ///
    /// Cancel-safe: if the future is dropped mid-poll the in-flight count and
    /// the `is_checking` marks are released anyway. Store writes already made
    /// stay made.
    pub async fn check_all(&self) {
        let (batch, generation) = {
            let mut st = self.lock_state();
            if st.instances.is_empty() {
                return;
            }
            st.in_flight += 1;
            st.has_checked = true;
            for t in st.instances.iter_mut() {
                t.is_checking = t.instance.credential().is_some();
            }
            (st.instances.clone(), st.generation)
        };
        let _in_flight = InFlightGuard { state: &self.state };

        debug!("Checking status of {} instance(s)...", batch.len());
        let results = self.reconciler.reconcile_all(batch).await;

        let mut st = self.lock_state();
        if st.generation == generation {
            for result in results {
                if let Some(slot) = st
                    .instances
                    .iter_mut()
                    .find(|t| t.instance.id == result.instance.id)
                {
                    *slot = result;
                }
            }
        } else {
            // Rows reloaded mid-poll are newer than the batch; keep them.
            debug!("Instance list replaced during poll; discarding {} result(s).", results.len());
        }
        st.last_check = Some(Utc::now());
    }

    async fn needs_cold_start(&self) -> bool {
        let st = self.lock_state();
        !st.has_checked && !st.instances.is_empty()
    }

    fn lock_state(&self) -> MutexGuard<'_, PollerState> {
        lock(&self.state)
    }

    /// Starts the recurring poll: once as soon as the list is non-empty, then
    /// every `interval`.
    pub fn spawn(self: &Arc<Self>) -> PollerHandle {
        let cancel = CancellationToken::new();
        let poller = Arc::clone(self);
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poller.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Instance status poller started (interval={:?}).", poller.interval);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        poller.check_all().await;
                    }
                    _ = poller.list_changed.notified() => {
                        if poller.needs_cold_start().await {
                            poller.check_all().await;
                            ticker.reset();
                        }
                    }
                }
            }
            info!("Instance status poller stopped.");
        });

        PollerHandle { cancel, join: Some(join) }
    }
}

/// Releases one poll's claim on the state, whether the poll finished or its
/// future was dropped.
struct InFlightGuard<'a> {
    state: &'a Mutex<PollerState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut st = lock(self.state);
        st.in_flight = st.in_flight.saturating_sub(1);
        if st.in_flight == 0 {
            for t in st.instances.iter_mut() {
                t.is_checking = false;
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a running poller. Dropping it stops the poller too.
pub struct PollerHandle {
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished())
    }

    /// Stops the poller and waits for an in-progress poll to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
