use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use super::catalog::{CatalogItem, ALL_CATEGORIES};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    #[serde(default = "default_category")]
    pub category: String,
}
fn default_category() -> String {
    ALL_CATEGORIES.to_string()
}

pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/menu", get(list_menu))
        .route("/menu/categories", get(list_categories))
        .route("/menu/:id", get(get_menu_item))
}

#[instrument(skip(state))]
pub async fn list_menu(
    State(state): State<AppState>,
    Query(q): Query<MenuQuery>,
) -> Json<Vec<CatalogItem>> {
    Json(state.catalog.in_category(&q.category).cloned().collect())
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(
        state
            .catalog
            .categories()
            .into_iter()
            .map(str::to_string)
            .collect(),
    )
}

#[instrument(skip(state))]
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CatalogItem>, (StatusCode, String)> {
    state
        .catalog
        .find(id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Menu item not found".into()))
}
