//! In-memory [`Store`] implementation.
//!
//! Rows live in concurrent maps keyed the same way the tables are (users by email, devices by
//! device id). Suitable for tests and `--in-memory` runs; everything is lost on restart.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    models::{
        devices::{DeviceCreateDBRequest, DeviceDBResponse},
        users::{UserCreateDBRequest, UserDBResponse},
    },
    store::Store,
};

#[derive(Clone, Default)]
pub struct InMemoryStore {
    users: Arc<DashMap<String, UserDBResponse>>,
    devices: Arc<DashMap<String, DeviceDBResponse>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of device rows, regardless of owner.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        match self.users.entry(request.email.clone()) {
            Entry::Occupied(_) => Err(DbError::duplicate("users", "users_email_unique")),
            Entry::Vacant(slot) => {
                let user = UserDBResponse {
                    id: Uuid::new_v4(),
                    email: request.email.clone(),
                    password_hash: request.password_hash.clone(),
                    created_at: Utc::now(),
                };
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<UserDBResponse> {
        self.users.get(email).map(|user| user.value().clone()).ok_or(DbError::NotFound)
    }

    async fn delete_user_by_email(&self, email: &str) -> Result<()> {
        self.users.remove(email).map(|_| ()).ok_or(DbError::NotFound)
    }

    async fn list_users(&self) -> Result<Vec<UserDBResponse>> {
        let mut users: Vec<_> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.email.cmp(&b.email)));
        Ok(users)
    }

    async fn create_device(&self, request: &DeviceCreateDBRequest) -> Result<DeviceDBResponse> {
        match self.devices.entry(request.device_id.clone()) {
            Entry::Occupied(_) => Err(DbError::duplicate("devices", "devices_pkey")),
            Entry::Vacant(slot) => {
                let device = DeviceDBResponse {
                    device_id: request.device_id.clone(),
                    device_name: request.device_name.clone(),
                    preshared_key: request.preshared_key.clone(),
                    owner_email: request.owner_email.clone(),
                    project_id: request.project_id.clone(),
                    created_at: request.created_at,
                };
                slot.insert(device.clone());
                Ok(device)
            }
        }
    }

    async fn list_devices_by_owner(&self, email: &str) -> Result<Vec<DeviceDBResponse>> {
        let mut devices: Vec<_> = self
            .devices
            .iter()
            .filter(|entry| entry.value().owner_email == email)
            .map(|entry| entry.value().clone())
            .collect();
        devices.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(devices)
    }

    async fn delete_devices_by_owner(&self, email: &str) -> Result<u64> {
        let mut removed = 0;
        self.devices.retain(|_, device| {
            let keep = device.owner_email != email;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
