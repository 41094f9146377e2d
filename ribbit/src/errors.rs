use crate::db::errors::DbError;
use crate::provider::ProviderError;
use crate::registration::RegistrationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Authenticated, but not allowed to touch the resource
    #[error("Insufficient permissions to access {resource}")]
    InsufficientPermissions { resource: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Device registration failed part way through
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn db_status(db_err: &DbError) -> StatusCode {
    match db_err {
        DbError::NotFound => StatusCode::NOT_FOUND,
        DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
        DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn db_message(db_err: &DbError) -> String {
    match db_err {
        DbError::NotFound => "Resource not found".to_string(),
        DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
            (Some("users"), Some(c)) if c.contains("email") => "An account with this email address already exists".to_string(),
            (Some("devices"), _) => "A device with this id already exists".to_string(),
            _ => "Resource already exists".to_string(),
        },
        DbError::Other(_) => "Database error occurred".to_string(),
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => db_status(db_err),
            Error::Registration(reg_err) => match reg_err {
                RegistrationError::UserNotFound { .. } => StatusCode::NOT_FOUND,
                RegistrationError::Provider { .. } => StatusCode::BAD_GATEWAY,
                RegistrationError::Persistence { source, .. } => db_status(source),
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InsufficientPermissions { resource } => format!("Insufficient permissions to access {resource}"),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} {id} not found"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => db_message(db_err),
            Error::Registration(reg_err) => match reg_err {
                RegistrationError::UserNotFound { email } => format!("User {email} not found"),
                RegistrationError::Provider { phase, source } => match source {
                    ProviderError::Status { status, .. } => {
                        format!("Device provider rejected the request with status {status} after phase {phase}")
                    }
                    ProviderError::MalformedResponse(_) => format!("Device provider sent an unreadable response after phase {phase}"),
                    ProviderError::Transport(_) => format!("Device provider could not be reached after phase {phase}"),
                },
                RegistrationError::Persistence { source, .. } => db_message(source),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_))
            | Error::Registration(RegistrationError::Persistence {
                source: DbError::Other(_),
                ..
            })
            | Error::Internal { .. }
            | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Registration(RegistrationError::Provider { .. }) => {
                tracing::error!("Device provider error: {:#}", self);
            }
            Error::Database(_) | Error::Registration(_) => {
                tracing::warn!("Request failed: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let mut body = json!({ "message": self.user_message() });

        if let Error::Registration(RegistrationError::Provider { phase, source }) = &self {
            body["phase"] = json!(phase);
            if let ProviderError::Status { status, body: provider_body } = source {
                body["provider_status"] = json!(status);
                body["provider_body"] = json!(provider_body);
            }
        }

        (status, Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
