use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{Order, OrderLine};

/// Delivery details collected at checkout.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

impl CheckoutRequest {
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.address, &self.phone]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: String,
    pub items: Vec<OrderLine>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            total_amount: order.total_amount,
            status: order.status,
            items: order.items.0,
            created_at: order.created_at,
        }
    }
}
