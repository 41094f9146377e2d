use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, AuthSuccessResponse, LoginRequest, LoginResponse, LogoutResponse, SignupRequest},
        users::UserResponse,
    },
    auth::{password, session},
    db::{errors::DbError, models::users::UserCreateDBRequest},
    errors::Error,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some(INVALID_CREDENTIALS.to_string()),
    }
}

fn validate_email(email: &str) -> Result<(), Error> {
    let valid = email.len() <= 254
        && !email.chars().any(char::is_whitespace)
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty() && !domain.contains('@'));

    if !valid {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }
    Ok(())
}

/// Create an account. Does not sign the user in.
#[tracing::instrument(skip_all)]
pub async fn signup(State(state): State<AppState>, Json(request): Json<SignupRequest>) -> Result<Json<AuthResponse>, Error> {
    validate_email(&request.email)?;

    // Validate password length
    let password_config = &state.config.auth.password;
    if request.password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if request.password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    // Hash the password on a blocking thread to avoid blocking async runtime
    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    // Duplicate emails surface as a unique violation (409) and leave the first row alone
    let created_user = state
        .store
        .create_user(&UserCreateDBRequest {
            email: request.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %crate::types::abbrev_uuid(&created_user.id), "User signed up");

    Ok(Json(AuthResponse {
        user: UserResponse::from(created_user),
        message: "Signup successful".to_string(),
    }))
}

/// Login with email and password
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let user = match state.store.get_user_by_email(&request.email).await {
        Ok(user) => Some(user),
        Err(DbError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };

    // Unknown emails still pay for a verification so both failures look alike
    let hash = match &user {
        Some(user) => user.password_hash.clone(),
        None => password::dummy_hash()?.to_string(),
    };
    let password = request.password;
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    let user = match user {
        Some(user) if is_valid => user,
        _ => return Err(invalid_credentials()),
    };

    let token = session::create_session_token(user.id, &user.email, &state.config)?;
    let cookie = session::create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        auth_response: AuthResponse {
            user: UserResponse::from(user),
            message: "Login successful".to_string(),
        },
        cookie,
    })
}

/// Logout (clear session)
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> LogoutResponse {
    LogoutResponse {
        auth_response: AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
        cookie: session::expired_session_cookie(&state.config),
    }
}
