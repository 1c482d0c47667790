pub mod catalog;
mod handlers;

use crate::state::AppState;
use axum::Router;

pub use catalog::{Catalog, CatalogItem};

pub fn router() -> Router<AppState> {
    handlers::menu_routes()
}
