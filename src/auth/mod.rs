use crate::state::AppState;
use axum::Router;

mod dto;
mod handlers;
pub mod repo;
pub mod services;
pub mod session;
pub mod tokens;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
