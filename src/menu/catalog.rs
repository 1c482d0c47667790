use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Menu shipped with the binary; `MENU_PATH` overrides it.
const BUILTIN_MENU: &str = include_str!("../../data/menu.json");

/// Pseudo-category meaning "no filter".
pub const ALL_CATEGORIES: &str = "All";

/// A menu entry with a stable id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    #[serde(default)]
    pub is_meat: bool,
    #[serde(default)]
    pub allergens: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(BUILTIN_MENU).context("parse built-in menu")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read menu {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse menu {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let items: Vec<CatalogItem> = serde_json::from_str(raw)?;
        Self::new(items)
    }

    pub fn new(items: Vec<CatalogItem>) -> anyhow::Result<Self> {
        for (idx, item) in items.iter().enumerate() {
            anyhow::ensure!(item.id > 0, "menu item {:?} has non-positive id", item.name);
            anyhow::ensure!(
                item.price >= Decimal::ZERO,
                "menu item {} has a negative price",
                item.id
            );
            anyhow::ensure!(
                !items[..idx].iter().any(|other| other.id == item.id),
                "duplicate menu id {}",
                item.id
            );
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn find(&self, id: i64) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// `"All"` first, then every category in the order it first appears.
    pub fn categories(&self) -> Vec<&str> {
        let mut out = vec![ALL_CATEGORIES];
        for item in &self.items {
            if !out.contains(&item.category.as_str()) {
                out.push(&item.category);
            }
        }
        out
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a CatalogItem> {
        self.items
            .iter()
            .filter(move |item| category == ALL_CATEGORIES || item.category == category)
    }
}
