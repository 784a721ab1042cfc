use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing, Json, Router,
};
use filedrop_blob::FileHostError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{spool::SpooledBatch, FileDropAxumError, FileDropState};

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    #[serde(rename = "fileId", default)]
    file_id: Option<String>,
}

/// `/api` routes: upload, list, delete
pub fn api_router(state: FileDropState) -> Router<()> {
    Router::new()
        .route("/upload", routing::post(upload))
        .route("/files", routing::get(list).delete(delete_by_body))
        .route("/files/{id}", routing::delete(delete_by_path))
        .fallback(action_not_found)
        .with_state(state)
}

async fn upload(
    State(state): State<FileDropState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, FileDropAxumError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "upload without a multipart body");
        FileHostError::validation("No files uploaded")
    })?;

    let max_file_size = state.registry.config().max_file_size_bytes;
    let batch = SpooledBatch::read(&mut multipart, &state.spool_dir, max_file_size)
        .await?
        .require_files()?;

    let links = state.registry.upload(batch.incoming().await).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Files uploaded successfully",
        "links": links,
    })))
}

async fn list(State(state): State<FileDropState>) -> Result<Json<Value>, FileDropAxumError> {
    let listing = state.registry.list().await?;
    Ok(Json(json!({
        "success": true,
        "files": listing.files,
        "stats": listing.stats,
    })))
}

async fn delete_by_body(
    State(state): State<FileDropState>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<Value>, FileDropAxumError> {
    let id = payload
        .ok()
        .and_then(|Json(request)| request.file_id)
        .unwrap_or_default();
    remove(&state, &id).await
}

async fn delete_by_path(
    State(state): State<FileDropState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, FileDropAxumError> {
    remove(&state, &id).await
}

async fn remove(state: &FileDropState, id: &str) -> Result<Json<Value>, FileDropAxumError> {
    state.registry.delete(id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "File deleted successfully",
    })))
}

async fn action_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Action not found" })),
    )
}
