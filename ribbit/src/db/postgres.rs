//! [`Store`] backed by a PostgreSQL pool.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::{
    errors::{DbError, Result},
    handlers::{Devices, Users},
    models::{
        devices::{DeviceCreateDBRequest, DeviceDBResponse},
        users::{UserCreateDBRequest, UserDBResponse},
    },
    store::Store,
};

/// Acquires one pooled connection per operation and hands it to the table repository.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>> {
        self.pool.acquire().await.map_err(DbError::from)
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut conn = self.acquire().await?;
        Users::new(&mut conn).create(request).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<UserDBResponse> {
        let mut conn = self.acquire().await?;
        Users::new(&mut conn).get_user_by_email(email).await
    }

    async fn delete_user_by_email(&self, email: &str) -> Result<()> {
        let mut conn = self.acquire().await?;
        Users::new(&mut conn).delete_by_email(email).await
    }

    async fn list_users(&self) -> Result<Vec<UserDBResponse>> {
        let mut conn = self.acquire().await?;
        Users::new(&mut conn).list().await
    }

    async fn create_device(&self, request: &DeviceCreateDBRequest) -> Result<DeviceDBResponse> {
        let mut conn = self.acquire().await?;
        Devices::new(&mut conn).create(request).await
    }

    async fn list_devices_by_owner(&self, email: &str) -> Result<Vec<DeviceDBResponse>> {
        let mut conn = self.acquire().await?;
        Devices::new(&mut conn).list_by_owner(email).await
    }

    async fn delete_devices_by_owner(&self, email: &str) -> Result<u64> {
        let mut conn = self.acquire().await?;
        Devices::new(&mut conn).delete_by_owner(email).await
    }
}
