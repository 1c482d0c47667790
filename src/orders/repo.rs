use axum::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{cart::model::LineItem, error::StoreError};

pub const ORDER_STATUS_PENDING: &str = "pending";

/// One cart line frozen into an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    pub quantity: i32,
}

impl From<&LineItem> for OrderLine {
    fn from(item: &LineItem) -> Self {
        Self {
            item_id: item.key.item_id,
            name: item.name.clone(),
            price: item.price,
            image: item.image.clone(),
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub status: String,
    pub items: Json<Vec<OrderLine>>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub status: String,
    pub items: Vec<OrderLine>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError>;
    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError>;
    async fn find(&self, user_id: Uuid, order_id: Uuid) -> Result<Option<Order>, StoreError>;
}

#[derive(Clone)]
pub struct PgOrderStore {
    db: PgPool,
}

impl PgOrderStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (user_id, total_amount, status, items)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, total_amount, status, items, created_at
            "#,
        )
        .bind(order.user_id)
        .bind(order.total_amount)
        .bind(order.status)
        .bind(Json(order.items))
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, total_amount, status, items, created_at
              FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find(&self, user_id: Uuid, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, total_amount, status, items, created_at
              FROM orders
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}
