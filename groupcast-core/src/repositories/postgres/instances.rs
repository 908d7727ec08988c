use sqlx::{Pool, Postgres};
use async_trait::async_trait;
use groupcast_common::models::{ConnectionSnapshot, Instance};
use groupcast_common::traits::repository_traits::InstanceRepository;
use crate::Error;

#[derive(Clone)]
pub struct PostgresInstanceRepository {
    pool: Pool<Postgres>,
}

impl PostgresInstanceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstanceRepository for PostgresInstanceRepository {
    async fn list_instances(&self, organization_id: Option<i64>) -> Result<Vec<Instance>, Error> {
        let rows = sqlx::query_as::<_, Instance>(
            r#"
            SELECT id, organization_id, name, api_key, api_url, status,
                   phone_number, profile_name, profile_pic_url, is_business,
                   webhook_url, active, created_at, updated_at
            FROM whatsapp_instances
            WHERE ($1::BIGINT IS NULL OR organization_id = $1)
            ORDER BY created_at DESC NULLS LAST, id DESC
            "#
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_instance(&self, id: i64) -> Result<Option<Instance>, Error> {
        let row = sqlx::query_as::<_, Instance>(
            r#"
            SELECT id, organization_id, name, api_key, api_url, status,
                   phone_number, profile_name, profile_pic_url, is_business,
                   webhook_url, active, created_at, updated_at
            FROM whatsapp_instances
            WHERE id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_connection_snapshot(
        &self,
        id: i64,
        snapshot: &ConnectionSnapshot,
    ) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE whatsapp_instances
            SET status = $2,
                phone_number = $3,
                profile_name = $4,
                profile_pic_url = $5,
                is_business = $6,
                updated_at = $7
            WHERE id = $1
            "#
        )
        .bind(id)
        .bind(snapshot.status.as_str())
        .bind(&snapshot.phone_number)
        .bind(&snapshot.profile_name)
        .bind(&snapshot.profile_pic_url)
        .bind(snapshot.is_business)
        .bind(snapshot.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("whatsapp instance id={}", id)));
        }
        Ok(())
    }
}
