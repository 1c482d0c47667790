use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{AddItemRequest, CartResponse, SetQuantityRequest, MEAT_CHOICES},
    extractors::CartClient,
    model::Outcome,
    sessions::{CartTurn, ClientCart},
};
use crate::{
    auth::{services::MaybeAuthUser, session::UserIdentity},
    state::AppState,
};

type CartReply = Result<(HeaderMap, Json<CartResponse>), (StatusCode, String)>;

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/reload", post(reload_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/:item_id", put(set_quantity).delete(remove_item))
        .route("/cart/session", delete(close_session))
}

/// Resolve the client's cart and bring it in line with the caller's auth.
/// The cart is the caller's alone until the returned turn is dropped.
pub(crate) async fn open_cart(
    state: &AppState,
    client: CartClient,
    user: Option<uuid::Uuid>,
) -> Result<(Arc<ClientCart>, CartTurn), (StatusCode, String)> {
    let cart = state.carts.get_or_create(client.0).await;
    let turn = cart
        .attach(user.map(UserIdentity::from))
        .await
        .ok_or((StatusCode::SERVICE_UNAVAILABLE, "Cart is still loading".into()))?;
    Ok((cart, turn))
}

fn reply(state: &AppState, client: CartClient, cart: &ClientCart, outcome: Option<Outcome>) -> CartReply {
    let body = CartResponse::new(outcome, &cart.sync.snapshot(), state.config.tax_rate);
    Ok((client.headers(), Json(body)))
}

#[instrument(skip(state))]
pub async fn get_cart(
    State(state): State<AppState>,
    client: CartClient,
    MaybeAuthUser(user): MaybeAuthUser,
) -> CartReply {
    let (cart, _turn) = open_cart(&state, client, user).await?;
    reply(&state, client, &cart, None)
}

#[instrument(skip(state))]
pub async fn reload_cart(
    State(state): State<AppState>,
    client: CartClient,
    MaybeAuthUser(user): MaybeAuthUser,
) -> CartReply {
    let (cart, _turn) = open_cart(&state, client, user).await?;
    cart.sync.reload().await;
    reply(&state, client, &cart, None)
}

#[instrument(skip(state, body))]
pub async fn add_item(
    State(state): State<AppState>,
    client: CartClient,
    MaybeAuthUser(user): MaybeAuthUser,
    Json(body): Json<AddItemRequest>,
) -> CartReply {
    let item = state.catalog.find(body.item_id);

    if let Some(item) = item.filter(|item| item.is_meat) {
        let picked = body.meat.as_deref().map(str::trim);
        if !picked.is_some_and(|m| MEAT_CHOICES.contains(&m)) {
            warn!(item_id = item.id, meat = ?body.meat, "meat dish without a valid meat choice");
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Choose a meat: {}", MEAT_CHOICES.join(", ")),
            ));
        }
    }

    let (cart, _turn) = open_cart(&state, client, user).await?;
    let outcome = cart.sync.add_item(item, body.quantity).await;
    reply(&state, client, &cart, Some(outcome))
}

#[instrument(skip(state, body))]
pub async fn set_quantity(
    State(state): State<AppState>,
    client: CartClient,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(item_id): Path<i64>,
    Json(body): Json<SetQuantityRequest>,
) -> CartReply {
    let (cart, _turn) = open_cart(&state, client, user).await?;
    let outcome = cart.sync.set_quantity(item_id, body.quantity).await;
    reply(&state, client, &cart, Some(outcome))
}

#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    client: CartClient,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(item_id): Path<i64>,
) -> CartReply {
    let (cart, _turn) = open_cart(&state, client, user).await?;
    let outcome = cart.sync.remove_item(item_id).await;
    reply(&state, client, &cart, Some(outcome))
}

#[instrument(skip(state))]
pub async fn clear_cart(
    State(state): State<AppState>,
    client: CartClient,
    MaybeAuthUser(user): MaybeAuthUser,
) -> CartReply {
    let (cart, _turn) = open_cart(&state, client, user).await?;
    let outcome = cart.sync.clear_cart().await;
    reply(&state, client, &cart, Some(outcome))
}

#[instrument(skip(state))]
pub async fn close_session(State(state): State<AppState>, client: CartClient) -> StatusCode {
    if state.carts.close(client.0).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
