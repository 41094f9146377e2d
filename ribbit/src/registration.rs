//! Device registration: provider device, provider credential, local row.
//!
//! Registration is a small saga across two systems that share no transaction:
//!
//! ```text
//! Requested ──create_device──▶ DeviceCreated ──create_credential──▶ CredentialCreated ──store──▶ Persisted
//! ```
//!
//! A failure reports the last [`RegistrationPhase`] reached. Once the provider holds a device,
//! a later failure leaves it there without a local row unless compensation is switched on
//! (`provider.compensate_on_failure`), in which case the device is deleted from the provider
//! before the original error is returned.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    AppState,
    auth::password,
    db::{Store, errors::DbError, models::devices::DeviceCreateDBRequest},
    provider::{DeviceProvider, ProviderCredential, ProviderDevice, ProviderError},
    types::DeviceId,
};

/// How far a registration got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPhase {
    Requested,
    DeviceCreated,
    CredentialCreated,
    Persisted,
}

impl fmt::Display for RegistrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistrationPhase::Requested => "requested",
            RegistrationPhase::DeviceCreated => "device_created",
            RegistrationPhase::CredentialCreated => "credential_created",
            RegistrationPhase::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("owner {email} does not exist")]
    UserNotFound { email: String },

    #[error("provider call failed after phase {phase}: {source}")]
    Provider {
        phase: RegistrationPhase,
        #[source]
        source: ProviderError,
    },

    #[error("storing device failed after phase {phase}: {source}")]
    Persistence {
        phase: RegistrationPhase,
        #[source]
        source: DbError,
    },
}

impl RegistrationError {
    /// Last phase that completed before the failure.
    pub fn phase(&self) -> RegistrationPhase {
        match self {
            RegistrationError::UserNotFound { .. } => RegistrationPhase::Requested,
            RegistrationError::Provider { phase, .. } | RegistrationError::Persistence { phase, .. } => *phase,
        }
    }
}

/// Result of a persisted registration. The PSK is handed out here and nowhere else.
#[derive(Debug, Clone)]
pub struct RegisteredDevice {
    pub device_id: DeviceId,
    pub preshared_key: String,
}

/// A device that exists on the provider with a credential, but has no local row.
#[derive(Debug, Clone)]
pub struct ProvisionedDevice {
    pub device: ProviderDevice,
    pub credential: ProviderCredential,
}

pub struct DeviceRegistrar {
    store: Arc<dyn Store>,
    provider: Arc<dyn DeviceProvider>,
    project_id: String,
    compensate: bool,
}

impl DeviceRegistrar {
    pub fn new(store: Arc<dyn Store>, provider: Arc<dyn DeviceProvider>, project_id: impl Into<String>, compensate: bool) -> Self {
        Self {
            store,
            provider,
            project_id: project_id.into(),
            compensate,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.store.clone(),
            state.provider.clone(),
            state.config.project_id(),
            state.config.provider.compensate_on_failure,
        )
    }

    /// Provision a device on the provider and record it for `owner_email`.
    #[instrument(skip(self), err)]
    pub async fn register_device(&self, owner_email: &str) -> Result<RegisteredDevice, RegistrationError> {
        let owner = self.store.get_user_by_email(owner_email).await.map_err(|e| match e {
            DbError::NotFound => RegistrationError::UserNotFound {
                email: owner_email.to_string(),
            },
            other => RegistrationError::Persistence {
                phase: RegistrationPhase::Requested,
                source: other,
            },
        })?;

        let ProvisionedDevice { device, credential } = self.provision().await?;

        let request = DeviceCreateDBRequest {
            device_id: device.id.clone(),
            device_name: device.name,
            preshared_key: credential.preshared_key,
            owner_email: owner.email,
            project_id: self.project_id.clone(),
            created_at: credential.created_at,
        };

        let stored = match self.store.create_device(&request).await {
            Ok(stored) => stored,
            Err(source) => {
                self.compensate(&device.id).await;
                return Err(RegistrationError::Persistence {
                    phase: RegistrationPhase::CredentialCreated,
                    source,
                });
            }
        };

        info!(device_id = %stored.device_id, phase = %RegistrationPhase::Persisted, "Registered device");
        Ok(RegisteredDevice {
            device_id: stored.device_id,
            preshared_key: stored.preshared_key,
        })
    }

    /// Provision a device and credential without storing anything. Used to check that the
    /// provider is reachable and accepts our key.
    #[instrument(skip(self), err)]
    pub async fn register_device_ephemeral(&self) -> Result<ProvisionedDevice, RegistrationError> {
        self.provision().await
    }

    async fn provision(&self) -> Result<ProvisionedDevice, RegistrationError> {
        let name = password::generate_device_name();
        let id_hint = Uuid::new_v4().to_string();

        let device = self
            .provider
            .create_device(&name, &id_hint)
            .await
            .map_err(|source| RegistrationError::Provider {
                phase: RegistrationPhase::Requested,
                source,
            })?;

        let psk_request = password::generate_secret_token();
        match self.provider.create_credential(&device.id, &psk_request).await {
            Ok(credential) => Ok(ProvisionedDevice { device, credential }),
            Err(source) => {
                self.compensate(&device.id).await;
                Err(RegistrationError::Provider {
                    phase: RegistrationPhase::DeviceCreated,
                    source,
                })
            }
        }
    }

    /// Best-effort removal of a provider device left behind by a failed registration.
    async fn compensate(&self, device_id: &str) {
        if !self.compensate {
            warn!(device_id, "Registration failed; device remains on the provider without a local row");
            return;
        }
        match self.provider.delete_device(device_id).await {
            Ok(()) => info!(device_id, "Removed provider device after failed registration"),
            Err(e) => warn!(device_id, error = %e, "Could not remove provider device after failed registration"),
        }
    }
}
