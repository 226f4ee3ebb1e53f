use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password, PasswordError},
        repo::is_unique_violation,
        repo_types::User,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
}

/// A too-short password is the caller's fault; anything else is ours.
pub(crate) fn password_error(context: &str, err: PasswordError) -> ApiError {
    match err {
        PasswordError::TooShort { .. } => {
            warn!("password too short");
            ApiError::bad_request("Password too short")
        }
        other => ApiError::internal(context, other.into()),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue_tokens(keys: &JwtKeys, user: User) -> ApiResult<AuthResponse> {
    let access_token = keys
        .sign_access(user.id)
        .map_err(|e| ApiError::internal("Failed to sign token", e))?;
    let refresh_token = keys
        .sign_refresh(user.id)
        .map_err(|e| ApiError::internal("Failed to sign token", e))?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }
    let hash = hash_password(&payload.password)
        .map_err(|e| password_error("Failed to register", e))?;
    let user = User::create(&state.db, &payload.email, &hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!(email = %payload.email, "email already registered");
                ApiError::Conflict("Email already registered".into())
            } else {
                ApiError::internal("Failed to register", e)
            }
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    let keys = JwtKeys::from_ref(&state);
    Ok((StatusCode::CREATED, Json(issue_tokens(&keys, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(|e| ApiError::internal("Failed to log in", e))?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthorized("Invalid credentials".into())
        })?;

    let ok = verify_password(&payload.password, &user.password_hash)
        .map_err(|e| password_error("Failed to log in", e))?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    let user = load_user(&state, claims.sub).await?;
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<PublicUser>> {
    let user = load_user(&state, user_id).await?;
    Ok(Json(user.into()))
}

async fn load_user(state: &AppState, user_id: Uuid) -> ApiResult<User> {
    User::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to load user", e))?
        .ok_or_else(|| {
            warn!(%user_id, "token for unknown user");
            ApiError::Unauthorized("User not found".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("cook@example.com"));
        assert!(is_valid_email("first.last+menu@kitchen.co"));
        assert!(!is_valid_email("cook@"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn public_user_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            password_hash: "secret-hash".into(),
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("secret-hash"));
    }

    #[tokio::test]
    async fn me_requires_bearer_token() {
        let app = crate::app::build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/v1/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_token_is_not_accepted_as_bearer() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_refresh(Uuid::new_v4()).unwrap();
        let app = crate::app::build_app(state);
        let res = app
            .oneshot(
                Request::get("/api/v1/me")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_rejects_invalid_email_before_touching_db() {
        let app = crate::app::build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::post("/api/v1/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"nope","password":"longenough"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_short_password_before_touching_db() {
        let app = crate::app::build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::post("/api/v1/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"cook@example.com","password":"short"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn password_errors_split_client_and_server_faults() {
        let short = password_error("x", PasswordError::TooShort { min: 8 });
        assert_eq!(short.status(), StatusCode::BAD_REQUEST);
        let broken = password_error("x", PasswordError::Hash("boom".into()));
        assert_eq!(broken.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
