//! `GET /uploads/:filename`: stream a stored image back with the content type
//! its blob store reports.

use crate::app::AppState;
use crate::error::ApiError;
use crate::storage::{sanitize_filename, Blob};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};

pub async fn serve_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let filename = sanitize_filename(&filename);
    if filename.is_empty() {
        return Err(ApiError::not_found("File not found"));
    }

    let Blob { data, content_type } = state
        .blobs
        .get(&filename)
        .await
        .map_err(|e| ApiError::internal("Internal server error", e))?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let etag = format!("\"{}\"", hex::encode(Sha256::digest(&data)));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000".to_string()),
            (header::ETAG, etag),
        ],
        data,
    )
        .into_response())
}
