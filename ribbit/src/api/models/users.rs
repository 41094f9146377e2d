//! API request/response models for users.

use crate::config::Config;
use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            created_at: db.created_at,
        }
    }
}

/// The user a request's session resolved to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
}

impl CurrentUser {
    /// Emails are stored as given and unique byte-for-byte, so admin membership is an exact match.
    pub fn is_admin(&self, config: &Config) -> bool {
        config.auth.admin_emails.iter().any(|admin| *admin == self.email)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub message: String,
    /// Devices removed along with the user; always 0 under the `retain` orphan policy
    pub devices_removed: u64,
}
