use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};

use parley_core::{ServiceError, Services};
use parley_db::users;
use parley_types::UserId;
use parley_types::api::{
    Claims, LoginRequest, MeResponse, RegisterRequest, RegisterResponse, TokenResponse,
};

use crate::error::ApiError;
use crate::middleware::AuthUser;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub services: Services,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.login.trim().is_empty() {
        return Err(ServiceError::Validation("login must not be empty".into()).into());
    }
    if req.password.is_empty() {
        return Err(ServiceError::Validation("password must not be empty".into()).into());
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {}", e)))?
        .to_string();

    let db = state.services.db.clone();
    let login = req.login.clone();
    let user_id = tokio::task::spawn_blocking(move || {
        db.with_conn(|conn| users::insert(conn, &login, &password_hash))
    })
    .await
    .map_err(|e| ServiceError::Internal(format!("spawn_blocking join error: {}", e)))??;

    info!("registered user {} ({})", user_id, req.login);
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let db = state.services.db.clone();
    let login = req.login.clone();
    let user = tokio::task::spawn_blocking(move || {
        db.with_conn(|conn| users::find_by_login(conn, &login))
    })
    .await
    .map_err(|e| ServiceError::Internal(format!("spawn_blocking join error: {}", e)))??
    .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ServiceError::Internal(format!("stored hash unreadable: {}", e)))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let access_token = create_token(&state.jwt_secret, user.id, state.token_ttl).map_err(|e| {
        error!("failed to sign token for user {}: {}", user.id, e);
        ServiceError::Internal("token signing failed".into())
    })?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

pub async fn me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.user_id,
    })
}

/// Sign an HS256 access token for `user_id` that expires after `ttl`.
pub fn create_token(secret: &str, user_id: UserId, ttl: chrono::Duration) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
