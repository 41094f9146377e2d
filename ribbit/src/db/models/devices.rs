//! Database models for devices.

use crate::types::DeviceId;
use chrono::{DateTime, Utc};

/// Database request for recording a device the provider has already created.
#[derive(Debug, Clone)]
pub struct DeviceCreateDBRequest {
    pub device_id: DeviceId,
    pub device_name: String,
    pub preshared_key: String,
    pub owner_email: String,
    pub project_id: String,
    /// Credential creation time reported by the provider
    pub created_at: DateTime<Utc>,
}

/// Database response for a device
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeviceDBResponse {
    pub device_id: DeviceId,
    pub device_name: String,
    pub preshared_key: String,
    pub owner_email: String,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
}
