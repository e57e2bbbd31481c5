//! Server-side recognition: `POST /ocr` (text only) and `POST /scan`
//! (recognize, store, and record in one call).

use super::read_form;
use crate::app::{AppState, CurrentUser};
use crate::error::ApiError;
use crate::ocr::{recognize_image, OcrInput, OcrOutcome, NO_TEXT_MESSAGE, RETRY_MESSAGE};
use crate::pipeline::{ScanError, ScanRequest};
use crate::schema::{Document, DocumentEnvelope, OcrResponse};
use crate::storage::check_image_payload;
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::debug;

fn log_progress(percent: u8) {
    debug!("OCR progress: {}%", percent);
}

/// Recognize an uploaded image without storing anything.
pub async fn run_ocr(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, ApiError> {
    let form = read_form(multipart).await?;
    let content_type = check_image_payload(form.content_type.as_deref(), &form.data)
        .map_err(|rejection| ApiError::bad_request(rejection.message()))?;

    let input = OcrInput {
        filename: form.file_name.unwrap_or_else(|| "upload".to_string()),
        content_type,
        data: form.data,
    };

    let outcome = recognize_image(state.ocr.as_ref(), &input, &log_progress)
        .await
        .map_err(|e| ApiError::internal(RETRY_MESSAGE, e))?;

    Ok(Json(match outcome {
        OcrOutcome::Text(text) => OcrResponse {
            text,
            no_text: false,
            message: None,
        },
        OcrOutcome::NoText => OcrResponse {
            text: String::new(),
            no_text: true,
            message: Some(NO_TEXT_MESSAGE),
        },
    }))
}

/// Recognize, upload, and create the record in one request.
pub async fn scan_document(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<DocumentEnvelope<Document>>, ApiError> {
    let form = read_form(multipart).await?;

    let request = ScanRequest {
        user_id: form.user_id.unwrap_or(current_user),
        file_name: form.file_name,
        content_type: form.content_type,
        data: form.data,
    };

    let document = state
        .pipeline
        .run(request, &log_progress)
        .await
        .map_err(|e| match e {
            ScanError::Rejected(rejection) => ApiError::bad_request(rejection.message()),
            ScanError::NoText => ApiError::Unprocessable(NO_TEXT_MESSAGE.to_string()),
            ScanError::Ocr(e) => ApiError::internal(RETRY_MESSAGE, e),
            ScanError::Storage(e) | ScanError::Record(e) => {
                ApiError::internal("Failed to save document", e)
            }
        })?;

    Ok(Json(DocumentEnvelope {
        document,
        message: Some("Document saved successfully"),
    }))
}

#[cfg(test)]
mod tests {
    use crate::app::USER_HEADER;
    use crate::handlers::test_support::*;
    use crate::ocr::{NO_TEXT_MESSAGE, RETRY_MESSAGE};
    use axum::http::{HeaderValue, StatusCode};

    const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00body";

    #[tokio::test]
    async fn test_ocr_returns_text() {
        let app = app_with(None, Ok("  Invoice 42\n"));
        let body = multipart_body("doc.jpg", "image/jpeg", JPEG, &[]);
        let response = send(&app.router, multipart_request("/ocr", body)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["text"], "Invoice 42");
        assert!(json.get("noText").is_none());
        assert_eq!(std::fs::read_dir(app.dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_ocr_blank_is_not_an_error() {
        let app = app_with(None, Ok("\n  \n"));
        let body = multipart_body("doc.jpg", "image/jpeg", JPEG, &[]);
        let response = send(&app.router, multipart_request("/ocr", body)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["noText"], true);
        assert_eq!(json["message"], NO_TEXT_MESSAGE);
    }

    #[tokio::test]
    async fn test_ocr_failure_is_single_retry_message() {
        let app = app_with(None, Err("tessdata missing"));
        let body = multipart_body("doc.jpg", "image/jpeg", JPEG, &[]);
        let response = send(&app.router, multipart_request("/ocr", body)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], RETRY_MESSAGE);
    }

    #[tokio::test]
    async fn test_scan_uses_current_user_header() {
        let app = app();
        let body = multipart_body("doc.jpg", "image/jpeg", JPEG, &[]);
        let mut request = multipart_request("/scan", body);
        request
            .headers_mut()
            .insert(USER_HEADER, HeaderValue::from_static("alice"));
        let response = send(&app.router, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["document"]["userId"], "alice");
        assert_eq!(json["document"]["extractedText"], "Hello");

        let key = json["document"]["objectKey"].as_str().unwrap();
        let response = send(&app.router, empty_request("GET", &format!("/uploads/{}", key))).await;
        assert_eq!(body_bytes(response).await, JPEG);
    }

    #[tokio::test]
    async fn test_scan_defaults_to_placeholder_user() {
        let app = app();
        let body = multipart_body("doc.jpg", "image/jpeg", JPEG, &[]);
        let response = send(&app.router, multipart_request("/scan", body)).await;
        assert_eq!(body_json(response).await["document"]["userId"], "temp-user");
    }

    #[tokio::test]
    async fn test_scan_form_user_wins() {
        let app = app();
        let body = multipart_body("doc.jpg", "image/jpeg", JPEG, &[("userId", "u1")]);
        let response = send(&app.router, multipart_request("/scan", body)).await;
        assert_eq!(body_json(response).await["document"]["userId"], "u1");
    }

    #[tokio::test]
    async fn test_scan_without_text_stores_nothing() {
        let app = app_with(None, Ok(""));
        let body = multipart_body("doc.jpg", "image/jpeg", JPEG, &[]);
        let response = send(&app.router, multipart_request("/scan", body)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(app.documents.len(), 0);
        assert_eq!(std::fs::read_dir(app.dir.path()).unwrap().count(), 0);
    }
}
