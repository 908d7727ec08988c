// File: src/platforms/mod.rs

use async_trait::async_trait;
use groupcast_common::models::{GatewayStatus, WhatsAppGroup};
use crate::Error;

/// The third-party WhatsApp gateway, addressed per instance by its credential.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WhatsAppGateway: Send + Sync {
    /// Live connection snapshot for the instance owning `token`.
    ///
    /// `Ok(None)` means the gateway answered but no status could be
    /// extracted from the reply; callers treat that as "nothing to update".
    async fn instance_status(&self, token: &str) -> Result<Option<GatewayStatus>, Error>;

    async fn list_groups(&self, token: &str) -> Result<Vec<WhatsAppGroup>, Error>;
}

pub mod uazapi;
