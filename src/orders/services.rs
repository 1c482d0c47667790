use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{CheckoutRequest, OrderResponse},
    repo::{NewOrder, OrderLine, ORDER_STATUS_PENDING},
};
use crate::{
    auth::services::AuthUser,
    cart::{extractors::CartClient, model::CartTotals, model::Outcome, open_cart},
    state::AppState,
};

pub const SAVE_FAILED: &str = "There was an error saving your order. Please try again.";

/// Turn the caller's cart into a pending order, then empty the cart.
#[instrument(skip(state, body))]
pub async fn checkout(
    State(state): State<AppState>,
    client: CartClient,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, HeaderMap, Json<OrderResponse>), (StatusCode, String)> {
    if !body.is_complete() {
        warn!(%user_id, "checkout with missing delivery details");
        return Err((
            StatusCode::BAD_REQUEST,
            "Name, address and phone are required".into(),
        ));
    }

    let (cart, _turn) = open_cart(&state, client, Some(user_id)).await?;
    let orders = Arc::clone(&state.orders);
    let tax_rate = state.config.tax_rate;

    let (order, cleared) = cart
        .sync
        .check_out(|items| async move {
            if items.is_empty() {
                return Err((StatusCode::BAD_REQUEST, "Cart is empty".to_string()));
            }
            let totals = CartTotals::compute(&items, tax_rate);
            orders
                .insert(NewOrder {
                    user_id,
                    total_amount: totals.total,
                    status: ORDER_STATUS_PENDING.into(),
                    items: items.iter().map(OrderLine::from).collect(),
                })
                .await
                .map_err(|e| {
                    error!(error = %e, %user_id, "saving order failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED.to_string())
                })
        })
        .await?;

    if cleared == Outcome::WriteFailed {
        warn!(order_id = %order.id, %user_id, "order saved but cart not cleared");
    }
    info!(order_id = %order.id, %user_id, total = %order.total_amount, "order placed");

    let mut headers = client.headers();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/orders/{}", order.id)) {
        headers.insert(LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(order.into())))
}
