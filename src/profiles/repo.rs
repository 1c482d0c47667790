use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::StoreError;

/// Delivery details a user keeps between orders. `id` is the user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub address: String,
}

impl Profile {
    pub fn empty(id: Uuid) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;
    async fn upsert(&self, profile: Profile) -> Result<Profile, StoreError>;
}

#[derive(Clone)]
pub struct PgProfileStore {
    db: PgPool,
}

impl PgProfileStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, Profile>(
            r#"SELECT id, full_name, phone, address FROM profiles WHERE id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn upsert(&self, profile: Profile) -> Result<Profile, StoreError> {
        let row = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, full_name, phone, address)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
               SET full_name = EXCLUDED.full_name,
                   phone = EXCLUDED.phone,
                   address = EXCLUDED.address
            RETURNING id, full_name, phone, address
            "#,
        )
        .bind(profile.id)
        .bind(profile.full_name)
        .bind(profile.phone)
        .bind(profile.address)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }
}
