//! Thesis submission, listing and detail handlers

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::storage::UploadStore;
use crate::AppState;
use thesis_core::{ReviewEntry, ThesisError, ThesisSummary};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    search: String,
    #[serde(default = "default_status")]
    status: String,
}

fn default_status() -> String {
    "all".to_string()
}

#[derive(Debug, Serialize)]
pub struct ThesisDetailResponse {
    #[serde(flatten)]
    summary: ThesisSummary,
    reviews: Vec<ReviewEntry>,
}

/// Fields collected from the multipart submission form
#[derive(Default)]
struct ThesisForm {
    title: Option<String>,
    content: Option<String>,
    file: Option<(String, bytes::Bytes)>,
}

fn multipart_err(e: MultipartError) -> ApiError {
    ApiError::bad_request(format!("invalid multipart request: {e}"))
}

async fn read_form(multipart: &mut Multipart) -> Result<ThesisForm, ApiError> {
    let mut form = ThesisForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => form.title = Some(field.text().await.map_err(multipart_err)?),
            "content" => form.content = Some(field.text().await.map_err(multipart_err)?),
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(multipart_err)?;
                // A file input left empty arrives as a nameless zero-byte part
                if !filename.is_empty() && !data.is_empty() {
                    form.file = Some((filename, data));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/thesis - multipart form with title, content and an optional
/// document upload
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let form = read_form(&mut multipart).await?;
    let title = form
        .title
        .filter(|t| !t.is_empty())
        .ok_or(ThesisError::MissingField("title"))?;
    let content = form
        .content
        .filter(|c| !c.is_empty())
        .ok_or(ThesisError::MissingField("content"))?;

    let mut file_path = None;
    if let Some((filename, data)) = form.file {
        if !UploadStore::is_allowed(&filename) {
            return Err(ThesisError::InvalidUpload("file type not allowed".to_string()).into());
        }
        let Some(safe) = UploadStore::sanitize(&filename) else {
            return Err(ThesisError::InvalidUpload("unusable filename".to_string()).into());
        };
        file_path = Some(state.uploads.save(&safe, &data).await?);
    }

    let id = state
        .thesis_service
        .create(user.account_id, &title, &content, file_path.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "thesis submitted", "id": id }))))
}

/// GET /api/thesis?search=&status=
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ThesisSummary>>, ApiError> {
    let theses = state
        .thesis_service
        .list(user.account_id, user.is_expert, &query.search, &query.status)
        .await?;

    Ok(Json(theses))
}

/// GET /api/thesis/:id
pub async fn detail(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ThesisDetailResponse>, ApiError> {
    let (summary, reviews) = state.thesis_service.detail(id).await?;
    Ok(Json(ThesisDetailResponse { summary, reviews }))
}
