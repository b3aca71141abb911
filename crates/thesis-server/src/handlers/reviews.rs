//! Review submission handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    score: i64,
    comments: Option<String>,
}

/// POST /api/thesis/:id/review
pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let comments = req.comments.unwrap_or_default();
    state
        .review_service
        .submit(id, user.account_id, req.score, &comments)
        .await?;
    info!("Review recorded for thesis {} by {}", id, user.username);

    Ok((StatusCode::CREATED, Json(json!({ "message": "review submitted" }))))
}
