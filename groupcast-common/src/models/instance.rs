// File: groupcast-common/src/models/instance.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection state of a WhatsApp instance as persisted in `whatsapp_instances.status`.
///
/// Only two states are distinguished. Anything else stored in the column
/// (including NULL) is read back as `Disconnected`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
pub enum InstanceStatus {
    #[serde(rename = "conectado")]
    Connected,
    #[serde(rename = "desconectado")]
    Disconnected,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Connected => "conectado",
            InstanceStatus::Disconnected => "desconectado",
        }
    }

    /// Maps a raw column value onto a status; absent or unknown means disconnected.
    pub fn from_persisted(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok())
            .unwrap_or(InstanceStatus::Disconnected)
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conectado" => Ok(InstanceStatus::Connected),
            "desconectado" => Ok(InstanceStatus::Disconnected),
            _ => Err(format!("Unknown instance status: {}", s)),
        }
    }
}

/// A row of `whatsapp_instances`. Provisioning happens elsewhere; this
/// workspace only reads rows and overwrites their connection snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Instance {
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub status: Option<String>,
    pub phone_number: Option<String>,
    pub profile_name: Option<String>,
    pub profile_pic_url: Option<String>,
    pub is_business: Option<bool>,
    pub webhook_url: Option<String>,
    pub active: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Instance {
    /// The gateway credential exactly as stored, if it is set and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
    }

    pub fn connection_status(&self) -> InstanceStatus {
        InstanceStatus::from_persisted(self.status.as_deref())
    }
}

/// What the gateway reported for one instance on one successful query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    pub connected: bool,
    pub logged_in: bool,
    pub phone_number: Option<String>,
    pub profile_name: Option<String>,
    pub profile_pic_url: Option<String>,
    pub is_business: Option<bool>,
}

impl GatewayStatus {
    pub fn derived_status(&self) -> InstanceStatus {
        if self.connected && self.logged_in {
            InstanceStatus::Connected
        } else {
            InstanceStatus::Disconnected
        }
    }
}

/// The partial record written back to the store when an instance's status changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSnapshot {
    pub status: InstanceStatus,
    pub phone_number: Option<String>,
    pub profile_name: Option<String>,
    pub profile_pic_url: Option<String>,
    pub is_business: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectionSnapshot {
    pub fn from_gateway(live: &GatewayStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            status: live.derived_status(),
            phone_number: live.phone_number.clone(),
            profile_name: live.profile_name.clone(),
            profile_pic_url: live.profile_pic_url.clone(),
            is_business: live.is_business,
            updated_at,
        }
    }
}

/// An instance as the dashboard sees it: the stored row plus the last live
/// snapshot and a transient "checking" flag while a poll is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedInstance {
    #[serde(flatten)]
    pub instance: Instance,
    pub live_status: Option<GatewayStatus>,
    pub is_checking: bool,
}

impl TrackedInstance {
    /// Overwrites the snapshot fields with a live gateway reading.
    /// `updated_at` is left alone; it only moves when the store is written.
    pub fn apply_live_status(mut self, live: GatewayStatus) -> Self {
        self.instance.status = Some(live.derived_status().as_str().to_string());
        self.instance.phone_number = live.phone_number.clone();
        self.instance.profile_name = live.profile_name.clone();
        self.instance.profile_pic_url = live.profile_pic_url.clone();
        self.instance.is_business = live.is_business;
        self.live_status = Some(live);
        self.is_checking = false;
        self
    }

    pub fn finished_checking(mut self) -> Self {
        self.is_checking = false;
        self
    }
}

impl From<Instance> for TrackedInstance {
    fn from(instance: Instance) -> Self {
        Self {
            instance,
            live_status: None,
            is_checking: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_or_missing_status_reads_as_disconnected() {
        assert_eq!(InstanceStatus::from_persisted(None), InstanceStatus::Disconnected);
        assert_eq!(InstanceStatus::from_persisted(Some("pending")), InstanceStatus::Disconnected);
        assert_eq!(InstanceStatus::from_persisted(Some("Conectado")), InstanceStatus::Connected);
    }

    #[test]
    fn connected_requires_both_flags() {
        let mut live = GatewayStatus { connected: true, logged_in: false, ..Default::default() };
        assert_eq!(live.derived_status(), InstanceStatus::Disconnected);
        live.logged_in = true;
        assert_eq!(live.derived_status(), InstanceStatus::Connected);
        live.connected = false;
        assert_eq!(live.derived_status(), InstanceStatus::Disconnected);
    }

    #[test]
    fn blank_api_key_is_no_credential() {
        let mut inst = Instance {
            id: 1,
            organization_id: 1,
            name: "main".into(),
            api_key: Some("   ".into()),
            api_url: None,
            status: None,
            phone_number: None,
            profile_name: None,
            profile_pic_url: None,
            is_business: None,
            webhook_url: None,
            active: Some(true),
            created_at: None,
            updated_at: None,
        };
        assert!(inst.credential().is_none());
        inst.api_key = Some("abc".into());
        assert_eq!(inst.credential(), Some("abc"));
        inst.api_key = Some(" abc\n".into());
        assert_eq!(inst.credential(), Some(" abc\n"), "sent as stored");
    }
}
