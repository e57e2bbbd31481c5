//! `POST /upload`: validate an image and put it in the blob store.

use super::read_form;
use crate::app::AppState;
use crate::error::ApiError;
use crate::schema::UploadResponse;
use crate::storage::{check_image_payload, generate_key};
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;

pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_form(multipart).await?;

    let content_type = check_image_payload(form.content_type.as_deref(), &form.data)
        .map_err(|rejection| ApiError::bad_request(rejection.message()))?;

    let key = generate_key(form.file_name.as_deref(), &content_type);
    let storage_path = state
        .blobs
        .put(&key, &form.data, &content_type)
        .await
        .map_err(|e| ApiError::internal("Internal server error", e))?;

    info!(
        "Uploaded {} as {} ({} bytes, {})",
        form.file_name.as_deref().unwrap_or("<unnamed>"),
        key,
        form.data.len(),
        content_type
    );

    Ok(Json(UploadResponse {
        file_name: key.clone(),
        object_key: key,
        storage_path,
        message: "File uploaded successfully",
    }))
}
