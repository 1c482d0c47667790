use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};
use uuid::Uuid;

use super::{dto::OrderResponse, services::checkout};
use crate::{auth::services::AuthUser, state::AppState};

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order))
}

#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<OrderResponse>>, (StatusCode, String)> {
    let orders = state.orders.list_by_user(user_id).await.map_err(|e| {
        error!(error = %e, %user_id, "list orders failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, (StatusCode, String)> {
    let order = state
        .orders
        .find(user_id, order_id)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, %order_id, "find order failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?
        .ok_or((StatusCode::NOT_FOUND, "Order not found".to_string()))?;
    Ok(Json(order.into()))
}
