pub mod dto;
pub mod extractors;
pub mod guest;
pub mod handlers;
pub mod model;
pub mod repo;
pub mod sessions;
pub mod sync;

use crate::state::AppState;
use axum::Router;

pub(crate) use handlers::open_cart;

pub fn router() -> Router<AppState> {
    handlers::cart_routes()
}
