//! Axum route handlers for reference-document uploads.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Category, UploadedFile};
use crate::session::Session;
use crate::state::AppState;
use crate::uploads::stats::{get_storage_stats, StorageStats};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub category: Category,
    pub file: UploadedFile,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Maps multipart read failures, distinguishing an exceeded body limit.
pub(crate) fn multipart_error(e: MultipartError) -> AppError {
    let message = e.body_text();
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE || message.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed size".to_string())
    } else {
        AppError::Upload(message)
    }
}

pub(crate) fn parse_category(raw: &str) -> Result<Category, AppError> {
    raw.parse()
        .map_err(|_| AppError::Upload("Invalid category".to_string()))
}

/// POST /upload/:category
pub async fn handle_upload(
    State(state): State<AppState>,
    session: Session,
    Path(category): Path<String>,
    mut multipart: Multipart,
) -> Result<(Session, Json<UploadResponse>), AppError> {
    let category = parse_category(&category)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, bytes));
    }

    let (filename, bytes) = upload.ok_or_else(|| AppError::Upload("No file part".to_string()))?;
    if filename.is_empty() {
        return Err(AppError::Upload("No selected file".to_string()));
    }

    let file = state.uploads.save(session.id, category, &filename, bytes).await?;

    Ok((
        session,
        Json(UploadResponse {
            success: true,
            filename: file.filename.clone(),
            category,
            file,
        }),
    ))
}

/// GET /files/:category
pub async fn handle_list_files(
    State(state): State<AppState>,
    session: Session,
    Path(category): Path<String>,
) -> Result<(Session, Json<FileListResponse>), AppError> {
    let category = parse_category(&category)?;
    let files = state.uploads.list(session.id, category).await?;
    Ok((session, Json(FileListResponse { files })))
}

/// DELETE /delete/:category/:id
pub async fn handle_delete_file(
    State(state): State<AppState>,
    session: Session,
    Path((category, id)): Path<(String, String)>,
) -> Result<(Session, Json<DeleteResponse>), AppError> {
    let category = parse_category(&category)?;
    let id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound("File not found".to_string()))?;
    state.uploads.delete(session.id, category, id).await?;
    Ok((session, Json(DeleteResponse { success: true })))
}

/// GET /stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<StorageStats>, AppError> {
    let root = state.uploads.root().to_path_buf();
    let stats = tokio::task::spawn_blocking(move || get_storage_stats(&root))
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(stats))
}
