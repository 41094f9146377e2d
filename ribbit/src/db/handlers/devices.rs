//! Database repository for devices.

use crate::db::{
    errors::Result,
    models::devices::{DeviceCreateDBRequest, DeviceDBResponse},
};
use sqlx::PgConnection;
use tracing::instrument;

const DEVICE_COLUMNS: &str = "device_id, device_name, preshared_key, owner_email, project_id, created_at";

pub struct Devices<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Devices<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(device_id = %request.device_id, owner = %request.owner_email), err)]
    pub async fn create(&mut self, request: &DeviceCreateDBRequest) -> Result<DeviceDBResponse> {
        let device = sqlx::query_as::<_, DeviceDBResponse>(&format!(
            "INSERT INTO devices ({DEVICE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {DEVICE_COLUMNS}"
        ))
        .bind(&request.device_id)
        .bind(&request.device_name)
        .bind(&request.preshared_key)
        .bind(&request.owner_email)
        .bind(&request.project_id)
        .bind(request.created_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(device)
    }

    #[instrument(skip(self), err)]
    pub async fn list_by_owner(&mut self, owner_email: &str) -> Result<Vec<DeviceDBResponse>> {
        let devices = sqlx::query_as::<_, DeviceDBResponse>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE owner_email = $1 ORDER BY created_at ASC"
        ))
        .bind(owner_email)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(devices)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_by_owner(&mut self, owner_email: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM devices WHERE owner_email = $1")
            .bind(owner_email)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
