//! groupcast-server/src/context.rs
//!
//! Wires the database, gateway client and reconciler together for every run mode.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use groupcast_common::traits::repository_traits::InstanceRepository;
use groupcast_core::db::Database;
use groupcast_core::http::DefaultHttpClient;
use groupcast_core::platforms::WhatsAppGateway;
use groupcast_core::platforms::uazapi::UazapiClient;
use groupcast_core::repositories::PostgresInstanceRepository;
use groupcast_core::services::InstanceStatusReconciler;
use groupcast_core::Error;

use crate::Args;

pub struct ServerContext {
    pub instance_repo: Arc<dyn InstanceRepository>,
    pub gateway: Arc<dyn WhatsAppGateway>,
    pub reconciler: Arc<InstanceStatusReconciler>,
}

impl ServerContext {
    pub async fn new(args: &Args) -> Result<Self, Error> {
        if args.gateway_url.trim().is_empty() {
            return Err(Error::Config("gateway URL must not be empty".into()));
        }

        let db = Database::new(&args.db_url).await?;
        db.migrate().await?;

        let http = DefaultHttpClient::with_timeout(Duration::from_secs(args.gateway_timeout_secs))?;
        let gateway: Arc<dyn WhatsAppGateway> =
            Arc::new(UazapiClient::new(&args.gateway_url, Arc::new(http)));
        info!(
            "Using UAZAPI gateway at {} (timeout={}s)",
            args.gateway_url, args.gateway_timeout_secs
        );

        let instance_repo: Arc<dyn InstanceRepository> =
            Arc::new(PostgresInstanceRepository::new(db.pool().clone()));
        let reconciler = Arc::new(InstanceStatusReconciler::new(
            gateway.clone(),
            instance_repo.clone(),
        ));

        Ok(Self {
            instance_repo,
            gateway,
            reconciler,
        })
    }
}
