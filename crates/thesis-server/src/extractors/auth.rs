//! Bearer token extractor for protected routes

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use thesis_core::ThesisError;

use crate::error::ApiError;
use crate::AppState;

/// The authenticated account behind a request, resolved from the
/// `Authorization: Bearer <token>` header
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account_id: i64,
    pub username: String,
    pub is_expert: bool,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("invalid Authorization format"))?;

        let account_id = state.auth_service.validate_token(token)?;
        let account = state
            .db
            .get_account(account_id)
            .await?
            .ok_or(ThesisError::AccountNotFound)?;

        Ok(AuthUser {
            account_id: account.id,
            username: account.username,
            is_expert: account.is_expert,
        })
    }
}
