use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{CartSnapshot, CartTotals, LineItem, Outcome};

/// Meats a diner may pick for dishes flagged `is_meat`.
pub const MEAT_CHOICES: [&str; 3] = ["Chicken", "Beef", "Pork"];

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub item_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub meat: Option<String>,
}
fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct CartLine {
    pub item_id: i64,
    pub row_id: Option<Uuid>,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
}

impl From<&LineItem> for CartLine {
    fn from(item: &LineItem) -> Self {
        Self {
            item_id: item.key.item_id,
            row_id: item.key.row_id,
            name: item.name.clone(),
            price: item.price,
            image: item.image.clone(),
            quantity: item.quantity,
            line_total: item.line_total(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    pub user_id: Option<Uuid>,
    pub is_loading: bool,
    pub items: Vec<CartLine>,
    pub totals: CartTotals,
}

impl CartResponse {
    pub fn new(outcome: Option<Outcome>, snapshot: &CartSnapshot, tax_rate: Decimal) -> Self {
        Self {
            outcome,
            user_id: snapshot.user_id,
            is_loading: snapshot.is_loading,
            items: snapshot.items.iter().map(CartLine::from).collect(),
            totals: CartTotals::compute(&snapshot.items, tax_rate),
        }
    }
}
