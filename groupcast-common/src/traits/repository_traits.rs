use async_trait::async_trait;
use crate::error::Error;
use crate::models::{ConnectionSnapshot, Instance};

#[async_trait]
pub trait InstanceRepository: Send + Sync {
    /// All instances, newest first. `organization_id = None` lists every organization.
    async fn list_instances(&self, organization_id: Option<i64>) -> Result<Vec<Instance>, Error>;

    async fn get_instance(&self, id: i64) -> Result<Option<Instance>, Error>;

    /// Overwrites the connection snapshot columns of one instance.
    /// Returns `Error::NotFound` if no row has that id.
    async fn update_connection_snapshot(
        &self,
        id: i64,
        snapshot: &ConnectionSnapshot,
    ) -> Result<(), Error>;
}
