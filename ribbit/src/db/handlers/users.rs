//! Database repository for users.

use crate::db::{
    errors::{DbError, Result},
    models::users::{UserCreateDBRequest, UserDBResponse},
};
use crate::types::abbrev_uuid;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, created_at";

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        // Always generate a new ID for users
        let user_id = Uuid::new_v4();

        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&request.email)
        .bind(&request.password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        tracing::debug!(user_id = %abbrev_uuid(&user.id), "Created user");
        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<UserDBResponse> {
        sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_by_email(&mut self, email: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<UserDBResponse>> {
        let users = sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, email ASC"))
            .fetch_all(&mut *self.db)
            .await?;
        Ok(users)
    }
}
