//! Reviewer assignment handlers

use axum::extract::State;
use axum::Json;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::AppState;

/// POST /api/assign-thesis - distribute pending theses across the
/// expert pool
pub async fn assign(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    // StdRng rather than thread_rng: the future has to be Send
    let mut rng = StdRng::from_entropy();
    let created = state.assignment_service.assign_pending(&mut rng).await?;

    Ok(Json(json!({ "message": "assignment complete", "assigned": created })))
}
