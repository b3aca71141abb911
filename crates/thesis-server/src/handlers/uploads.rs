//! Stored document retrieval handlers

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::storage::UploadStore;
use crate::AppState;

/// GET /api/uploads/:filename
pub async fn download(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state
        .uploads
        .read(&filename)
        .await?
        .ok_or_else(|| ApiError::not_found("file not found"))?;
    let content_type = UploadStore::content_type(&filename);

    Ok(([(header::CONTENT_TYPE, content_type)], data))
}
