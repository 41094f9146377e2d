//! The persistence handle the application is built around.

use async_trait::async_trait;

use crate::db::{
    errors::Result,
    models::{
        devices::{DeviceCreateDBRequest, DeviceDBResponse},
        users::{UserCreateDBRequest, UserDBResponse},
    },
};

/// Owner of the `users` and `devices` tables.
///
/// No other component writes rows. Each method is one auto-committing operation; there are no
/// multi-statement transactions. Errors use [`DbError`](crate::db::errors::DbError):
/// `NotFound` for a missing row and `UniqueViolation` for a duplicate key.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a user. Fails with `UniqueViolation` if the email is taken; the existing row is
    /// left untouched.
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;

    /// Fetch a user by email, `NotFound` if there is none.
    async fn get_user_by_email(&self, email: &str) -> Result<UserDBResponse>;

    /// Delete a user by email, `NotFound` if there is none. Devices are not touched.
    async fn delete_user_by_email(&self, email: &str) -> Result<()>;

    /// All users, oldest first.
    async fn list_users(&self) -> Result<Vec<UserDBResponse>>;

    /// Record a provisioned device. The device id is the uniqueness key.
    async fn create_device(&self, request: &DeviceCreateDBRequest) -> Result<DeviceDBResponse>;

    /// Devices owned by `email`, oldest first.
    async fn list_devices_by_owner(&self, email: &str) -> Result<Vec<DeviceDBResponse>>;

    /// Remove every device owned by `email`, returning how many rows went.
    async fn delete_devices_by_owner(&self, email: &str) -> Result<u64>;
}
