use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use tracing::{error, info, instrument};

use super::repo::Profile;
use crate::{auth::services::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Profile>, (StatusCode, String)> {
    let profile = state.profiles.find(user_id).await.map_err(|e| {
        error!(error = %e, %user_id, "load profile failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(profile.unwrap_or_else(|| Profile::empty(user_id))))
}

#[instrument(skip(state, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, (StatusCode, String)> {
    let profile = state
        .profiles
        .upsert(Profile {
            id: user_id,
            full_name: body.full_name.trim().to_string(),
            phone: body.phone.trim().to_string(),
            address: body.address.trim().to_string(),
        })
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "save profile failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    info!(%user_id, "profile saved");
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn missing_profile_reads_as_empty() {
        let user = Uuid::new_v4();
        let Json(profile) = get_profile(State(AppState::fake()), AuthUser(user)).await.unwrap();
        assert_eq!(profile, Profile::empty(user));
    }

    #[tokio::test]
    async fn update_then_read_back() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        update_profile(
            State(state.clone()),
            AuthUser(user),
            Json(UpdateProfileRequest {
                full_name: " Ada Lovelace ".into(),
                phone: "555-0100".into(),
                address: "1 Main St".into(),
            }),
        )
        .await
        .unwrap();

        let Json(profile) = get_profile(State(state), AuthUser(user)).await.unwrap();
        assert_eq!(profile.full_name, "Ada Lovelace");
        assert_eq!(profile.address, "1 Main St");
    }
}
