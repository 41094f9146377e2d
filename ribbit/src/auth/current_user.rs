use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    db::errors::DbError,
    errors::{Error, Result},
};

/// Resolve the session cookie to a live user.
///
/// A token that verifies is not enough: the user it names must still exist with the same id, so
/// deleting a user ends their sessions immediately.
#[instrument(skip(parts, state))]
async fn resolve_session(parts: &Parts, state: &AppState) -> Result<CurrentUser> {
    let cookie_header = parts
        .headers
        .get(COOKIE)
        .and_then(|h| h.to_str().ok())
        .ok_or(Error::Unauthenticated { message: None })?;

    let token = session::find_session_cookie(cookie_header, &state.config).ok_or(Error::Unauthenticated { message: None })?;
    let claims = session::verify_session_token(token, &state.config)?;

    let user = match state.store.get_user_by_email(&claims.email).await {
        Ok(user) => user,
        Err(DbError::NotFound) => {
            debug!("Session names a user that no longer exists");
            return Err(Error::Unauthenticated { message: None });
        }
        Err(e) => return Err(e.into()),
    };

    if user.id != claims.sub {
        debug!("Session was issued to an earlier account with the same email");
        return Err(Error::Unauthenticated { message: None });
    }

    Ok(CurrentUser {
        id: user.id,
        email: user.email,
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        resolve_session(parts, state).await
    }
}

/// A [`CurrentUser`] whose email is listed in `auth.admin_emails`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = resolve_session(parts, state).await?;
        if !user.is_admin(&state.config) {
            return Err(Error::InsufficientPermissions {
                resource: "user administration".to_string(),
            });
        }
        Ok(AdminUser(user))
    }
}
