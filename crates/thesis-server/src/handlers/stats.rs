//! Platform statistics handlers

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::AppState;

/// Legacy wire names; the dashboard reads them verbatim
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    total_thesis: i64,
    completed_reviews: i64,
    pending_reviews: i64,
}

/// GET /api/stats
pub async fn stats(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let counts = state.thesis_service.stats().await?;

    Ok(Json(StatsResponse {
        total_thesis: counts.total,
        completed_reviews: counts.completed,
        pending_reviews: counts.pending,
    }))
}
