// File: src/platforms/uazapi/mod.rs

pub mod client;
pub mod requests;

pub use client::UazapiClient;

use async_trait::async_trait;
use groupcast_common::models::{GatewayStatus, WhatsAppGroup};
use crate::Error;
use super::WhatsAppGateway;

#[async_trait]
impl WhatsAppGateway for UazapiClient {
    async fn instance_status(&self, token: &str) -> Result<Option<GatewayStatus>, Error> {
        self.get_instance_status(token).await
    }

    async fn list_groups(&self, token: &str) -> Result<Vec<WhatsAppGroup>, Error> {
        self.get_groups(token).await
    }
}
