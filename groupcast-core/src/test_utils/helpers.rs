// File: groupcast-core/src/test_utils/helpers.rs
//
// In-memory stand-ins for the instance store and the gateway, shared by unit
// tests and the integration tests under `groupcast-core/tests/`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use groupcast_common::models::{ConnectionSnapshot, GatewayStatus, Instance, WhatsAppGroup};
use groupcast_common::traits::repository_traits::InstanceRepository;
use crate::platforms::WhatsAppGateway;
use crate::Error;

/// A bare instance row in organization 1, status unset.
pub fn sample_instance(id: i64, api_key: Option<&str>) -> Instance {
    Instance {
        id,
        organization_id: 1,
        name: format!("instance-{id}"),
        api_key: api_key.map(str::to_string),
        api_url: None,
        status: None,
        phone_number: None,
        profile_name: None,
        profile_pic_url: None,
        is_business: None,
        webhook_url: None,
        active: Some(true),
        created_at: Utc.timestamp_opt(1_700_000_000 + id, 0).single(),
        updated_at: None,
    }
}

/// Stores instances in a map and records every snapshot write in order.
#[derive(Default)]
pub struct InMemoryInstanceRepository {
    rows: Mutex<HashMap<i64, Instance>>,
    updates: Mutex<Vec<(i64, ConnectionSnapshot)>>,
    fail_updates: AtomicBool,
}

impl InMemoryInstanceRepository {
    pub fn with_instances(instances: Vec<Instance>) -> Self {
        let repo = Self::default();
        {
            let mut rows = lock(&repo.rows);
            for inst in instances {
                rows.insert(inst.id, inst);
            }
        }
        repo
    }

    /// When set, every `update_connection_snapshot` call fails without recording.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn recorded_updates(&self) -> Vec<(i64, ConnectionSnapshot)> {
        lock(&self.updates).clone()
    }
}

#[async_trait]
impl InstanceRepository for InMemoryInstanceRepository {
    async fn list_instances(&self, organization_id: Option<i64>) -> Result<Vec<Instance>, Error> {
        let mut out: Vec<Instance> = lock(&self.rows)
            .values()
            .filter(|i| organization_id.is_none_or(|org| i.organization_id == org))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    async fn get_instance(&self, id: i64) -> Result<Option<Instance>, Error> {
        Ok(lock(&self.rows).get(&id).cloned())
    }

    async fn update_connection_snapshot(
        &self,
        id: i64,
        snapshot: &ConnectionSnapshot,
    ) -> Result<(), Error> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::Parse("simulated store failure".into()));
        }
        let mut rows = lock(&self.rows);
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("whatsapp instance id={}", id)))?;
        row.status = Some(snapshot.status.as_str().to_string());
        row.phone_number = snapshot.phone_number.clone();
        row.profile_name = snapshot.profile_name.clone();
        row.profile_pic_url = snapshot.profile_pic_url.clone();
        row.is_business = snapshot.is_business;
        row.updated_at = Some(snapshot.updated_at);
        lock(&self.updates).push((id, snapshot.clone()));
        Ok(())
    }
}

/// What [`ScriptedGateway`] answers for one token.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Status(GatewayStatus),
    NoStatus,
    Fail(String),
}

/// A gateway whose status replies are set per token. Unknown tokens fail;
/// every account has no groups.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<HashMap<String, ScriptedReply>>,
    status_calls: AtomicUsize,
    delay: Mutex<Duration>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reply(&self, token: &str, reply: ScriptedReply) {
        lock(&self.replies).insert(token.to_string(), reply);
    }

    /// Every status query sleeps this long (on tokio's clock) before answering.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WhatsAppGateway for ScriptedGateway {
    async fn instance_status(&self, token: &str) -> Result<Option<GatewayStatus>, Error> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let reply = lock(&self.replies).get(token).cloned();
        match reply {
            Some(ScriptedReply::Status(s)) => Ok(Some(s)),
            Some(ScriptedReply::NoStatus) => Ok(None),
            Some(ScriptedReply::Fail(msg)) => Err(Error::Gateway(msg)),
            None => Err(Error::Gateway(format!("no scripted reply for token '{token}'"))),
        }
    }

    async fn list_groups(&self, _token: &str) -> Result<Vec<WhatsAppGroup>, Error> {
        Ok(Vec::new())
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
