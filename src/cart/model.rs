use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::menu::CatalogItem;

/// Which backend owns a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CartScope {
    Guest,
    Session,
}

/// Identity of a line item.
///
/// Lookups always go by `item_id` (the catalog id). Session writes go by
/// `row_id`, which guest items never have and session items always have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartKey {
    pub scope: CartScope,
    pub item_id: i64,
    pub row_id: Option<Uuid>,
}

impl CartKey {
    pub fn guest(item_id: i64) -> Self {
        Self {
            scope: CartScope::Guest,
            item_id,
            row_id: None,
        }
    }

    pub fn session(item_id: i64, row_id: Uuid) -> Self {
        Self {
            scope: CartScope::Session,
            item_id,
            row_id: Some(row_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub key: CartKey,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: i32,
}

impl LineItem {
    pub fn item_id(&self) -> i64 {
        self.key.item_id
    }

    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    pub fn from_catalog(item: &CatalogItem, quantity: i32) -> Self {
        Self {
            key: CartKey::guest(item.id),
            name: item.name.clone(),
            price: item.price,
            image: item.image.clone(),
            quantity,
        }
    }
}

/// Guest slot wire form. `id` and `item_id` are both the catalog id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestLine {
    pub id: i64,
    pub item_id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    pub quantity: i32,
}

impl From<&LineItem> for GuestLine {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.key.item_id,
            item_id: item.key.item_id,
            name: item.name.clone(),
            price: item.price,
            image: item.image.clone(),
            quantity: item.quantity,
        }
    }
}

impl From<GuestLine> for LineItem {
    fn from(line: GuestLine) -> Self {
        Self {
            key: CartKey::guest(line.item_id),
            name: line.name,
            price: line.price,
            image: line.image,
            quantity: line.quantity,
        }
    }
}

/// Parse the guest slot. Anything unreadable counts as an empty cart.
pub fn decode_guest_cart(raw: Option<&str>) -> Result<Vec<LineItem>, serde_json::Error> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let lines: Vec<GuestLine> = serde_json::from_str(raw)?;
    Ok(lines.into_iter().map(LineItem::from).collect())
}

pub fn encode_guest_cart(items: &[LineItem]) -> String {
    let lines: Vec<GuestLine> = items.iter().map(GuestLine::from).collect();
    // A Vec of plain structs always serializes.
    serde_json::to_string(&lines).unwrap_or_else(|_| "[]".to_string())
}

/// Row of the `user_carts` table.
#[derive(Debug, Clone, FromRow)]
pub struct CartRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: i64,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: i32,
    pub created_at: OffsetDateTime,
}

impl From<CartRow> for LineItem {
    fn from(row: CartRow) -> Self {
        Self {
            key: CartKey::session(row.item_id, row.id),
            name: row.name,
            price: row.price,
            image: row.image,
            quantity: row.quantity,
        }
    }
}

/// Values for a fresh `user_carts` row; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewCartRow {
    pub user_id: Uuid,
    pub item_id: i64,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: i32,
}

impl NewCartRow {
    pub fn from_catalog(user_id: Uuid, item: &CatalogItem, quantity: i32) -> Self {
        Self {
            user_id,
            item_id: item.id,
            name: item.name.clone(),
            price: item.price,
            image: item.image.clone(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub item_count: i64,
}

impl CartTotals {
    pub fn compute(items: &[LineItem], tax_rate: Decimal) -> Self {
        let subtotal: Decimal = items.iter().map(LineItem::line_total).sum();
        let tax = (subtotal * tax_rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let item_count = items.iter().map(|item| i64::from(item.quantity)).sum();
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
            item_count,
        }
    }
}

/// What observers of a cart see.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartSnapshot {
    pub user_id: Option<Uuid>,
    pub items: Vec<LineItem>,
    pub is_loading: bool,
}

/// Result of a cart mutation. Nothing is raised to callers; this only says
/// whether the in-memory cart moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    Skipped,
    WriteFailed,
}
