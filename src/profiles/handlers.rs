use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::AuthUser,
        handlers::password_error,
        password::{hash_password, verify_password},
        repo_types::User,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::dto::{ChangePasswordRequest, ProfileUpdate};
use super::repo;
use super::repo_types::Profile;
use super::services;

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/password", post(change_password))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Profile>> {
    let profile = repo::get(&state.db, user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to load profile", e))?
        .unwrap_or_else(|| Profile::empty(user_id));
    Ok(Json(profile))
}

#[instrument(skip(state, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(mut body): Json<ProfileUpdate>,
) -> ApiResult<Json<Profile>> {
    services::normalize(&mut body).map_err(ApiError::BadRequest)?;
    let profile = repo::upsert(&state.db, user_id, &body)
        .await
        .map_err(|e| ApiError::internal("Failed to save profile", e))?;
    info!(%user_id, "profile updated");
    Ok(Json(profile))
}

#[instrument(skip(state, body))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    services::validate_password_change(&body).map_err(ApiError::BadRequest)?;

    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to change password", e))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let ok = verify_password(&body.current_password, &user.password_hash)
        .map_err(|e| password_error("Failed to change password", e))?;
    if !ok {
        warn!(%user_id, "password change with wrong current password");
        return Err(ApiError::bad_request("Current password is incorrect"));
    }

    let hash = hash_password(&body.new_password)
        .map_err(|e| password_error("Failed to change password", e))?;
    User::update_password(&state.db, user_id, &hash)
        .await
        .map_err(|e| ApiError::internal("Failed to change password", e))?;
    info!(%user_id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}
