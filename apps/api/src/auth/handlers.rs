use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::{hash_password, store, verify_password, AuthUser, TokenType};
use crate::errors::{ok, AppError};
use crate::models::user::UserResponse;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') || email.len() < 3 {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if store::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Validation(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = store::create_user(
        &state.db,
        &email,
        &password_hash,
        req.first_name.as_deref(),
        req.last_name.as_deref(),
    )
    .await?;
    info!("Registered user {}", user.id);

    let tokens = state.jwt.issue_pair(&user)?;
    Ok(ok(json!({
        "user": UserResponse::from(user),
        "tokens": tokens,
    })))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let email = req.email.trim().to_lowercase();
    let user = store::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    store::touch_last_login(&state.db, user.id).await?;

    let tokens = state.jwt.issue_pair(&user)?;
    Ok(ok(json!({
        "user": UserResponse::from(user),
        "tokens": tokens,
    })))
}

/// POST /api/auth/refresh: exchanges a refresh token for a new pair.
pub async fn handle_refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<Value>, AppError> {
    let claims = state.jwt.verify(&req.refresh_token, TokenType::Refresh)?;
    let user = store::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let tokens = state.jwt.issue_pair(&user)?;
    Ok(ok(json!({ "tokens": tokens })))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let user = store::find_by_id(&state.db, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(ok(UserResponse::from(user)))
}
