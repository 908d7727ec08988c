// File: groupcast-common/src/models/group.rs

use serde::{Deserialize, Serialize};

/// A WhatsApp group as listed by the gateway for one instance.
///
/// The gateway is inconsistent about casing (`JID`/`Name` on some
/// versions, camelCase on others), so both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatsAppGroup {
    #[serde(alias = "JID", alias = "jid")]
    pub id: String,
    #[serde(alias = "Name", alias = "subject", default)]
    pub name: String,
    #[serde(alias = "Picture", alias = "profilePicUrl", default)]
    pub picture: Option<String>,
    #[serde(alias = "ParticipantCount", default)]
    pub participants: Option<u32>,
    #[serde(alias = "Topic", alias = "desc", default)]
    pub description: Option<String>,
}
