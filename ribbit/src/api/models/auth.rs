//! API request/response models for authentication.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::api::models::users::UserResponse;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSuccessResponse {
    pub message: String,
}

/// Login body plus the `Set-Cookie` value carrying the session.
#[derive(Debug)]
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

/// Logout body plus an expired session cookie.
#[derive(Debug)]
pub struct LogoutResponse {
    pub auth_response: AuthSuccessResponse,
    pub cookie: String,
}

fn with_cookie(mut response: Response, cookie: &str) -> Response {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().insert(SET_COOKIE, value);
            response
        }
        Err(e) => {
            tracing::error!("Session cookie is not a valid header value: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "message": "Internal server error" })),
            )
                .into_response()
        }
    }
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        with_cookie(Json(self.auth_response).into_response(), &self.cookie)
    }
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        with_cookie(Json(self.auth_response).into_response(), &self.cookie)
    }
}
