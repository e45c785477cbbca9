use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;

use crate::documents::store::{content_type_for, DocumentKind, StoredFile};
use crate::errors::AppError;
use crate::state::AppState;

/// Pulls the first uploaded file among `field_names` out of a multipart body.
async fn read_upload(
    multipart: &mut Multipart,
    field_names: &[&str],
) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if !field_names.contains(&field.name().unwrap_or_default()) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.trim().is_empty() {
            return Err(AppError::Validation("No file selected".to_string()));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
        return Ok((filename, bytes));
    }
    Err(AppError::Validation(format!(
        "Missing file field ({})",
        field_names.join(" or ")
    )))
}

fn attachment(filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type_for(filename).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// POST /api/v1/cv
/// Multipart field `cv_file`; replaces any previous CV.
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredFile>), AppError> {
    let (filename, bytes) = read_upload(&mut multipart, &["cv_file"]).await?;
    let stored = state.documents.save_cv(&filename, &bytes).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/v1/cv
pub async fn handle_download_cv(State(state): State<AppState>) -> Result<Response, AppError> {
    let (filename, bytes) = state.documents.read_cv().await?;
    Ok(attachment(&filename, bytes))
}

/// POST /api/v1/documents/:kind
pub async fn handle_upload_document(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredFile>), AppError> {
    let (filename, bytes) = read_upload(&mut multipart, &["file", "document"]).await?;
    let stored = state
        .documents
        .save_document(DocumentKind::from_segment(&kind), &filename, &bytes)
        .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/v1/documents/:kind
pub async fn handle_list_documents(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<StoredFile>>, AppError> {
    let files = state
        .documents
        .list_documents(DocumentKind::from_segment(&kind))
        .await?;
    Ok(Json(files))
}

/// GET /api/v1/documents/:kind/:filename
pub async fn handle_download_document(
    State(state): State<AppState>,
    Path((kind, filename)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let bytes = state
        .documents
        .read_document(DocumentKind::from_segment(&kind), &filename)
        .await?;
    Ok(attachment(&filename, bytes))
}

/// DELETE /api/v1/documents/:kind/:filename
pub async fn handle_delete_document(
    State(state): State<AppState>,
    Path((kind, filename)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state
        .documents
        .delete_document(DocumentKind::from_segment(&kind), &filename)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
