use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        devices::{AddDeviceResponse, DeviceResponse},
        users::CurrentUser,
    },
    auth::current_user::AdminUser,
    errors::Error,
    registration::DeviceRegistrar,
};

/// Provision a device on the provider for the signed-in user and record it.
///
/// The PSK is in this response and nowhere else.
#[tracing::instrument(skip_all, fields(owner = %current_user.email))]
pub async fn add_device(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<AddDeviceResponse>, Error> {
    let registered = DeviceRegistrar::from_state(&state).register_device(&current_user.email).await?;
    Ok(Json(registered.into()))
}

/// Devices owned by the signed-in user, without their keys.
#[tracing::instrument(skip_all, fields(owner = %current_user.email))]
pub async fn list_devices(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<DeviceResponse>>, Error> {
    let devices = state.store.list_devices_by_owner(&current_user.email).await?;
    Ok(Json(devices.into_iter().map(DeviceResponse::from).collect()))
}

/// Provision a throwaway device to check provider connectivity. Nothing is stored, and the
/// provider-side device is left behind, so this is for admins only.
#[tracing::instrument(skip_all, fields(admin = %admin.email))]
pub async fn verify_provider(State(state): State<AppState>, AdminUser(admin): AdminUser) -> Result<Json<AddDeviceResponse>, Error> {
    let provisioned = DeviceRegistrar::from_state(&state).register_device_ephemeral().await?;
    Ok(Json(provisioned.into()))
}
