//! Client side of the third-party device-management API.
//!
//! The rest of the crate talks to a [`DeviceProvider`]; [`GoliothClient`] is the HTTP
//! implementation used in production, and tests substitute a mock server behind it.

mod golioth;

pub use golioth::GoliothClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures talking to the provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider answered with something other than 200
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// A 200 response whose body could not be understood
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Connection, TLS or timeout failure
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// A device as the provider created it.
#[derive(Debug, Clone)]
pub struct ProviderDevice {
    /// Provider-assigned id; authoritative over any id hint we sent
    pub id: String,
    pub name: String,
    pub hardware_ids: Vec<String>,
}

/// A pre-shared-key credential issued for a device.
#[derive(Debug, Clone)]
pub struct ProviderCredential {
    pub id: String,
    pub kind: String,
    pub identity: String,
    pub created_at: DateTime<Utc>,
    pub preshared_key: String,
}

#[async_trait]
pub trait DeviceProvider: Send + Sync {
    /// Create a device. `id_hint` is sent along but the provider may assign a different id.
    async fn create_device(&self, name: &str, id_hint: &str) -> Result<ProviderDevice>;

    /// Issue a PSK credential for an existing device.
    async fn create_credential(&self, device_id: &str, preshared_key: &str) -> Result<ProviderCredential>;

    /// Remove a device. Only used to undo a half-finished registration.
    async fn delete_device(&self, device_id: &str) -> Result<()>;
}
