//! `GET /group/list`: the groups an instance's WhatsApp account belongs to.

use serde::Deserialize;
use tracing::debug;
use groupcast_common::models::WhatsAppGroup;
use crate::Error;
use crate::platforms::uazapi::client::UazapiClient;

/// Depending on the gateway version the list is either wrapped in
/// `{ "groups": [...] }` or returned bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GroupListResponse {
    Wrapped { groups: Vec<WhatsAppGroup> },
    Bare(Vec<WhatsAppGroup>),
}

impl GroupListResponse {
    pub fn into_groups(self) -> Vec<WhatsAppGroup> {
        match self {
            GroupListResponse::Wrapped { groups } => groups,
            GroupListResponse::Bare(groups) => groups,
        }
    }
}

impl UazapiClient {
    /// Lists groups without their participant lists.
    pub async fn get_groups(&self, token: &str) -> Result<Vec<WhatsAppGroup>, Error> {
        let body = self
            .get_authorized(token, "group/list?noparticipants=true", "get_groups")
            .await?;

        let parsed: GroupListResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Gateway(format!("get_groups parse error: {e}")))?;
        let groups = parsed.into_groups();
        debug!("get_groups => {} group(s)", groups.len());
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_reply_shapes_parse() {
        let wrapped: GroupListResponse = serde_json::from_str(
            r#"{"groups": [{"JID": "1203@g.us", "Name": "Vendas", "ParticipantCount": 12}]}"#,
        )
        .unwrap();
        let groups = wrapped.into_groups();
        assert_eq!(groups[0].id, "1203@g.us");
        assert_eq!(groups[0].name, "Vendas");
        assert_eq!(groups[0].participants, Some(12));

        let bare: GroupListResponse =
            serde_json::from_str(r#"[{"id": "99@g.us", "name": "Suporte"}]"#).unwrap();
        assert_eq!(bare.into_groups()[0].name, "Suporte");
    }
}
