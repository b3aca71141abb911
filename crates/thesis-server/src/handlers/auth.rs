//! Registration and login handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;
use thesis_core::{Account, ThesisError};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: String,
    password: String,
    /// The frontend sends this camelCased
    #[serde(rename = "confirmPassword")]
    confirm_password: Option<String>,
    #[serde(default)]
    is_expert: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
    user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    id: i64,
    username: String,
    is_expert: bool,
}

impl From<Account> for UserInfo {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            is_expert: account.is_expert,
        }
    }
}

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    info!("Registration attempt for {}", req.username);

    // Uniqueness is reported before a confirmation mismatch
    if state.db.username_exists(&req.username).await? {
        return Err(ThesisError::DuplicateUsername.into());
    }
    if req.confirm_password.as_deref() != Some(req.password.as_str()) {
        return Err(ThesisError::PasswordMismatch.into());
    }

    state
        .auth_service
        .register(&req.username, &req.password, req.is_expert)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "registration successful" }))))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (token, account) = state.auth_service.login(&req.username, &req.password).await?;
    info!("Login successful for {}", account.username);

    Ok(Json(LoginResponse { token, user: account.into() }))
}
