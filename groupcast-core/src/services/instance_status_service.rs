// File: groupcast-core/src/services/instance_status_service.rs
//
// Keeps the persisted connection status of WhatsApp instances in line with
// what the gateway reports.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use chrono::Utc;
use futures_util::future::join_all;
use tracing::{debug, error, info, warn};

use groupcast_common::models::{ConnectionSnapshot, InstanceStatus, TrackedInstance};
use groupcast_common::traits::repository_traits::InstanceRepository;
use crate::platforms::WhatsAppGateway;

/// Queries the gateway for each instance and writes the store only when the
/// derived status differs from the last known one.
///
/// Nothing here ever returns an error. A failed gateway query or a failed
/// store write is logged and the instance comes back as it went in (minus
/// its `is_checking` flag), so a previously connected instance never flips
/// to disconnected just because a query failed.
pub struct InstanceStatusReconciler {
    gateway: Arc<dyn WhatsAppGateway>,
    instance_repo: Arc<dyn InstanceRepository>,
    all_offline: AtomicBool,
}

impl InstanceStatusReconciler {
    pub fn new(
        gateway: Arc<dyn WhatsAppGateway>,
        instance_repo: Arc<dyn InstanceRepository>,
    ) -> Self {
        Self {
            gateway,
            instance_repo,
            all_offline: AtomicBool::new(false),
        }
    }

    /// True when the last non-empty batch had no connected instance.
    pub fn all_offline(&self) -> bool {
        self.all_offline.load(Ordering::SeqCst)
    }

    pub async fn reconcile_one(&self, tracked: TrackedInstance) -> TrackedInstance {
        let Some(token) = tracked.instance.credential().map(str::to_owned) else {
            debug!("Instance id={} has no API key; skipping status check.", tracked.instance.id);
            return tracked;
        };
        let id = tracked.instance.id;

        let live = match self.gateway.instance_status(&token).await {
            Ok(Some(live)) => live,
            Ok(None) => {
                debug!("Gateway returned no usable status for instance id={}", id);
                return tracked.finished_checking();
            }
            Err(e) => {
                error!("Error checking status of instance id={}: {:?}", id, e);
                return tracked.finished_checking();
            }
        };

        let previous = tracked.instance.connection_status();
        let new_status = live.derived_status();

        if new_status != previous {
            let snapshot = ConnectionSnapshot::from_gateway(&live, Utc::now());
            if let Err(e) = self.instance_repo.update_connection_snapshot(id, &snapshot).await {
                error!(
                    "Failed to persist status change {} -> {} for instance id={}: {:?}",
                    previous, new_status, id, e
                );
                return tracked.finished_checking();
            }
            info!("Instance id={} changed status {} -> {}", id, previous, new_status);

            let mut updated = tracked.apply_live_status(live);
            updated.instance.updated_at = Some(snapshot.updated_at);
            return updated;
        }

        tracked.apply_live_status(live)
    }

    /// Reconciles every instance concurrently and returns the results in
    /// input order. One instance failing has no effect on the others.
    pub async fn reconcile_all(&self, instances: Vec<TrackedInstance>) -> Vec<TrackedInstance> {
        let total = instances.len();
        let results = join_all(instances.into_iter().map(|t| self.reconcile_one(t))).await;

        let connected = results
            .iter()
            .filter(|t| t.instance.connection_status() == InstanceStatus::Connected)
            .count();
        if total > 0 {
            let offline = connected == 0;
            let was_offline = self.all_offline.swap(offline, Ordering::SeqCst);
            if offline && !was_offline {
                warn!("No connected WhatsApp instance among {} checked.", total);
            } else if !offline && was_offline {
                info!("{} WhatsApp instance(s) connected again.", connected);
            }
        }
        debug!("Reconciled {} instance(s); {} connected.", total, connected);
        results
    }
}
