//! Document record endpoints: create, list, read, update text, delete.

use crate::app::AppState;
use crate::error::ApiError;
use crate::schema::{
    CreateDocumentRequest, Document, DocumentEnvelope, DocumentList, DocumentView, ListQuery,
    MessageResponse, UpdateDocumentRequest,
};
use crate::storage::direct_url;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::{info, warn};
use uuid::Uuid;

const NOT_FOUND: &str = "Document not found";

/// Malformed ids cannot name a row, so they are reported exactly like absent ones.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(NOT_FOUND))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e.body_text())))
}

/// Create a record for an already-uploaded image.
pub async fn create_document(
    State(state): State<AppState>,
    body: Result<Json<CreateDocumentRequest>, JsonRejection>,
) -> Result<Json<DocumentEnvelope<Document>>, ApiError> {
    let new_doc = json_body(body)?
        .validate()
        .map_err(ApiError::bad_request)?;

    let document = state
        .documents
        .insert(new_doc)
        .await
        .map_err(|e| ApiError::internal("Failed to save document", e))?;

    info!("Created document {} for {}", document.id, document.user_id);
    Ok(Json(DocumentEnvelope {
        document,
        message: Some("Document saved successfully"),
    }))
}

/// List a user's documents, oldest first, each with a direct image URL.
pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<DocumentList>, ApiError> {
    let user_id = query
        .user_id
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("User ID is required"))?;

    let documents = state
        .documents
        .list_by_owner(&user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch documents", e))?
        .into_iter()
        .map(|document| DocumentView {
            file_url: direct_url(&document.object_key),
            document,
        })
        .collect();

    Ok(Json(DocumentList { documents }))
}

/// Fetch one record; the image URL is signed when the blob store supports it.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentEnvelope<DocumentView>>, ApiError> {
    let id = parse_id(&id)?;
    let document = state
        .documents
        .get(id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch document", e))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    let file_url = match state
        .blobs
        .signed_url(&document.object_key, state.signed_url_ttl)
        .await
    {
        Ok(Some(url)) => url,
        Ok(None) => direct_url(&document.object_key),
        Err(e) => {
            warn!("Signing {} failed, serving direct URL: {:#}", document.object_key, e);
            direct_url(&document.object_key)
        }
    };

    Ok(Json(DocumentEnvelope {
        document: DocumentView { document, file_url },
        message: None,
    }))
}

/// Overwrite a record's extracted text.
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateDocumentRequest>, JsonRejection>,
) -> Result<Json<DocumentEnvelope<Document>>, ApiError> {
    let id = parse_id(&id)?;
    let text = json_body(body)?
        .extracted_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Extracted text is required"))?;

    let document = state
        .documents
        .update_text(id, &text)
        .await
        .map_err(|e| ApiError::internal("Failed to update document", e))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    info!("Updated text of document {}", document.id);
    Ok(Json(DocumentEnvelope {
        document,
        message: Some("Document updated successfully"),
    }))
}

/// Remove the blob (best-effort) and then the record (always).
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let document = state
        .documents
        .get(id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete document", e))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    if let Err(e) = state.blobs.delete(&document.object_key).await {
        warn!(
            "Storage deletion of {} failed, removing record anyway: {:#}",
            document.object_key, e
        );
    }

    state
        .documents
        .delete(id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete document", e))?;

    info!("Deleted document {}", id);
    Ok(Json(MessageResponse {
        message: "Document deleted successfully",
    }))
}
