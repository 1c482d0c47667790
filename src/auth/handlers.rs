use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{Credentials, PublicUser, RefreshRequest, SessionTokens},
    repo::User,
    services::{hash_password, is_valid_email, verify_password, AuthUser},
    tokens::{JwtKeys, TokenKind},
};
use crate::{error::StoreError, state::AppState};

const MIN_PASSWORD_LEN: usize = 8;

type AuthReply<T> = Result<Json<T>, (StatusCode, String)>;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/me", get(get_me))
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    error!(error = %e, "auth request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong".to_string())
}

fn issue_tokens(keys: &JwtKeys, user: User) -> AuthReply<SessionTokens> {
    Ok(Json(SessionTokens {
        access_token: keys.sign(user.id, TokenKind::Access).map_err(internal)?,
        refresh_token: keys.sign(user.id, TokenKind::Refresh).map_err(internal)?,
        token_type: "Bearer",
        expires_in: keys.access_ttl_secs(),
        user: user.into(),
    }))
}

/// Validate the form before anything reaches the database.
fn checked_email(creds: &Credentials) -> Result<String, (StatusCode, String)> {
    let email = creds.normalized_email();
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    Ok(email)
}

#[instrument(skip(state, creds))]
pub async fn register(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> AuthReply<SessionTokens> {
    let email = checked_email(&creds)?;
    if creds.password.chars().count() < MIN_PASSWORD_LEN {
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    let hash = hash_password(&creds.password).map_err(internal)?;
    let user = match User::create(&state.db, &email, &hash).await {
        Ok(user) => user,
        Err(StoreError::Conflict) => {
            warn!(%email, "email already registered");
            return Err((StatusCode::CONFLICT, "Email already registered".into()));
        }
        Err(e) => return Err(internal(e)),
    };

    info!(user_id = %user.id, "user registered");
    issue_tokens(&JwtKeys::from_ref(&state), user)
}

#[instrument(skip(state, creds))]
pub async fn login(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> AuthReply<SessionTokens> {
    let email = checked_email(&creds)?;
    let denied = || (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string());

    let user = User::find_by_email(&state.db, &email)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            warn!(%email, "login for unknown email");
            denied()
        })?;

    if !verify_password(&creds.password, &user.password_hash).map_err(internal)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(denied());
    }

    info!(user_id = %user.id, "user signed in");
    issue_tokens(&JwtKeys::from_ref(&state), user)
}

#[instrument(skip(state, body))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AuthReply<SessionTokens> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify(&body.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            (StatusCode::UNAUTHORIZED, "Invalid refresh token".to_string())
        })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    issue_tokens(&keys, user)
}

#[instrument(skip(state))]
pub async fn get_me(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> AuthReply<PublicUser> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    Ok(Json(user.into()))
}
