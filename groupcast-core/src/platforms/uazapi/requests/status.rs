//! `GET /instance/status`: the live connection state of one instance.
//!
//! The reply carries two objects. `status` has the connection flags and
//! `instance` has the WhatsApp profile:
//!
//! ```text
//! {
//!   "instance": { "owner": "5511999999999", "profileName": "Acme", "profilePicUrl": "...", "isBusiness": true },
//!   "status":   { "connected": true, "loggedIn": true, "jid": "5511999999999:12@s.whatsapp.net" }
//! }
//! ```

use serde::Deserialize;
use tracing::debug;
use groupcast_common::models::GatewayStatus;
use crate::Error;
use crate::platforms::uazapi::client::UazapiClient;

#[derive(Debug, Deserialize)]
pub struct InstanceStatusResponse {
    pub instance: Option<InstanceProfile>,
    pub status: Option<ConnectionFlags>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InstanceProfile {
    pub owner: Option<String>,
    pub profile_name: Option<String>,
    pub profile_pic_url: Option<String>,
    pub is_business: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionFlags {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub logged_in: bool,
    pub jid: Option<serde_json::Value>,
}

impl UazapiClient {
    /// Queries the gateway for the instance owning `token`.
    ///
    /// Transport failures, non-2xx replies and non-JSON bodies are errors.
    /// A JSON reply that doesn't carry a `status` object yields `Ok(None)`.
    pub async fn get_instance_status(&self, token: &str) -> Result<Option<GatewayStatus>, Error> {
        let body = self
            .get_authorized(token, "instance/status", "get_instance_status")
            .await?;
        extract_status(&body)
    }
}

/// Pulls a [`GatewayStatus`] out of a raw `/instance/status` body.
pub fn extract_status(body: &str) -> Result<Option<GatewayStatus>, Error> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::Gateway(format!("get_instance_status parse error: {e}")))?;

    let parsed: InstanceStatusResponse = match serde_json::from_value(value) {
        Ok(p) => p,
        Err(e) => {
            debug!("get_instance_status => unexpected reply shape: {}", e);
            return Ok(None);
        }
    };

    let Some(flags) = parsed.status else {
        debug!("get_instance_status => reply has no status object");
        return Ok(None);
    };
    let profile = parsed.instance.unwrap_or_default();

    let phone_number = non_empty(profile.owner)
        .or_else(|| flags.jid.as_ref().and_then(|j| j.as_str()).and_then(phone_from_jid));

    Ok(Some(GatewayStatus {
        connected: flags.connected,
        logged_in: flags.logged_in,
        phone_number,
        profile_name: non_empty(profile.profile_name),
        profile_pic_url: non_empty(profile.profile_pic_url),
        is_business: profile.is_business,
    }))
}

/// `5511999999999:12@s.whatsapp.net` => `5511999999999`
fn phone_from_jid(jid: &str) -> Option<String> {
    let user = jid.split('@').next()?;
    let number = user.split(':').next()?;
    if number.is_empty() {
        None
    } else {
        Some(number.to_string())
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}
