//! Database models for users.

use crate::types::UserId;
use chrono::{DateTime, Utc};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    /// Argon2 PHC string, never the plaintext password
    pub password_hash: String,
}

/// Database response for a user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
