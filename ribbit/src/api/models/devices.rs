//! API request/response models for devices.

use crate::db::models::devices::DeviceDBResponse;
use crate::registration::{ProvisionedDevice, RegisteredDevice};
use crate::types::DeviceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Returned once, at registration. The PSK is not retrievable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDeviceResponse {
    #[serde(rename = "deviceID")]
    pub device_id: DeviceId,
    pub psk: String,
}

impl From<RegisteredDevice> for AddDeviceResponse {
    fn from(device: RegisteredDevice) -> Self {
        Self {
            device_id: device.device_id,
            psk: device.preshared_key,
        }
    }
}

impl From<ProvisionedDevice> for AddDeviceResponse {
    fn from(provisioned: ProvisionedDevice) -> Self {
        Self {
            device_id: provisioned.device.id,
            psk: provisioned.credential.preshared_key,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceResponse {
    #[serde(rename = "deviceID")]
    pub device_id: DeviceId,
    pub device_name: String,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<DeviceDBResponse> for DeviceResponse {
    fn from(db: DeviceDBResponse) -> Self {
        Self {
            device_id: db.device_id,
            device_name: db.device_name,
            project_id: db.project_id,
            created_at: db.created_at,
        }
    }
}
