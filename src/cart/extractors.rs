use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderValue},
};
use tracing::debug;
use uuid::Uuid;

pub const CART_SESSION_HEADER: &str = "x-cart-session";

/// The browser a cart belongs to. A missing or malformed header gets a fresh
/// id, which the response hands back.
#[derive(Debug, Clone, Copy)]
pub struct CartClient(pub Uuid);

impl CartClient {
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        // A hyphenated uuid is always a valid header value.
        if let Ok(value) = HeaderValue::from_str(&self.0.to_string()) {
            headers.insert(CART_SESSION_HEADER, value);
        }
        headers
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CartClient
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let parsed = parts
            .headers
            .get(CART_SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok());

        Ok(CartClient(parsed.unwrap_or_else(|| {
            let id = Uuid::new_v4();
            debug!(client_id = %id, "minted cart session id");
            id
        })))
    }
}
