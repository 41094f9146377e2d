use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState,
    api::models::users::{DeleteUserResponse, UserResponse},
    auth::current_user::AdminUser,
    config::OrphanDevicePolicy,
    db::errors::DbError,
    errors::Error,
};

/// List all users
#[tracing::instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<UserResponse>>, Error> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Delete a user by email. Their devices follow `devices.orphan_policy`.
#[tracing::instrument(skip_all, fields(email = %email))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(email): Path<String>,
) -> Result<Json<DeleteUserResponse>, Error> {
    state.store.delete_user_by_email(&email).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "User".to_string(),
            id: email.clone(),
        },
        other => other.into(),
    })?;

    let devices_removed = match state.config.devices.orphan_policy {
        OrphanDevicePolicy::Retain => 0,
        OrphanDevicePolicy::Delete => state.store.delete_devices_by_owner(&email).await?,
    };

    tracing::info!(admin = %admin.email, devices_removed, "Deleted user");

    Ok(Json(DeleteUserResponse {
        message: format!("User {email} deleted"),
        devices_removed,
    }))
}
