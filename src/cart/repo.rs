use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{CartRow, NewCartRow};
use crate::error::StoreError;

/// Remote table of cart rows, one set per authenticated user.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn select_rows(&self, user_id: Uuid) -> Result<Vec<CartRow>, StoreError>;
    async fn insert_row(&self, row: NewCartRow) -> Result<CartRow, StoreError>;
    async fn update_quantity(&self, user_id: Uuid, row_id: Uuid, quantity: i32) -> Result<(), StoreError>;
    async fn delete_row(&self, user_id: Uuid, row_id: Uuid) -> Result<(), StoreError>;
    async fn delete_all(&self, user_id: Uuid) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgSessionStore {
    db: PgPool,
}

impl PgSessionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn select_rows(&self, user_id: Uuid) -> Result<Vec<CartRow>, StoreError> {
        let rows = sqlx::query_as::<_, CartRow>(
            r#"
            SELECT id, user_id, item_id, name, price, image, quantity, created_at
              FROM user_carts
             WHERE user_id = $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert_row(&self, row: NewCartRow) -> Result<CartRow, StoreError> {
        let row = sqlx::query_as::<_, CartRow>(
            r#"
            INSERT INTO user_carts (user_id, item_id, name, price, image, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, item_id, name, price, image, quantity, created_at
            "#,
        )
        .bind(row.user_id)
        .bind(row.item_id)
        .bind(row.name)
        .bind(row.price)
        .bind(row.image)
        .bind(row.quantity)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update_quantity(&self, user_id: Uuid, row_id: Uuid, quantity: i32) -> Result<(), StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE user_carts
               SET quantity = $3
             WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(user_id)
        .bind(row_id)
        .bind(quantity)
        .execute(&self.db)
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_row(&self, user_id: Uuid, row_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM user_carts WHERE user_id = $1 AND id = $2"#)
            .bind(user_id)
            .bind(row_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM user_carts WHERE user_id = $1"#)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
