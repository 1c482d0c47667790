use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;

/// Row of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

const USER_COLUMNS: &str = "id, email, password_hash, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await?)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?)
    }

    /// Insert a user. A taken email comes back as [`StoreError::Conflict`].
    pub async fn create(db: &PgPool, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(password_hash)
            .fetch_one(db)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Conflict,
                other => StoreError::Database(other),
            })
    }
}
