//! HTTP handlers.

pub mod documents;
pub mod files;
pub mod scan;
pub mod upload;

use crate::error::ApiError;
use crate::storage::PayloadRejection;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "ok"
}

/// The `file` part of a multipart form, plus any `userId` field.
#[derive(Debug, Default)]
pub struct UploadedForm {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
    pub user_id: Option<String>,
}

/// Drain a multipart body, keeping the first `file` part.
pub async fn read_form(mut multipart: Multipart) -> Result<UploadedForm, ApiError> {
    let mut form = UploadedForm::default();
    let mut seen_file = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") if !seen_file => {
                seen_file = true;
                form.file_name = field.file_name().map(str::to_string);
                form.content_type = field.content_type().map(str::to_string);
                form.data = field.bytes().await.map_err(multipart_error)?.to_vec();
            }
            Some("userId") => {
                let value = field.text().await.map_err(multipart_error)?;
                form.user_id = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            _ => {}
        }
    }

    if !seen_file {
        return Err(ApiError::bad_request(PayloadRejection::Empty.message()));
    }
    Ok(form)
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::bad_request(PayloadRejection::TooLarge.message())
    } else {
        ApiError::bad_request(format!("Multipart error: {}", e.body_text()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Router-level helpers shared by the handler tests.

    use crate::app::{build_router, AppState};
    use crate::ocr::testing::FixedEngine;
    use crate::storage::{local::LocalStore, BlobStore};
    use crate::store::{memory::MemoryStore, DocumentStore};
    use axum::body::Body;
    use axum::http::{Request, Response};
    use axum::Router;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    pub const BOUNDARY: &str = "----docscan-test-boundary";

    pub struct TestApp {
        pub router: Router,
        pub documents: Arc<MemoryStore>,
        pub dir: TempDir,
    }

    pub fn app_with(blobs: Option<Arc<dyn BlobStore>>, ocr_text: Result<&str, &str>) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let blobs: Arc<dyn BlobStore> = match blobs {
            Some(blobs) => blobs,
            None => Arc::new(LocalStore::new(dir.path())),
        };
        let documents = Arc::new(MemoryStore::new());
        let store: Arc<dyn DocumentStore> = documents.clone();
        let ocr = Arc::new(FixedEngine(
            ocr_text.map(str::to_string).map_err(str::to_string),
        ));
        let state = AppState::new(blobs, store, ocr, "temp-user", Duration::from_secs(3600));
        TestApp {
            router: build_router(state),
            documents,
            dir,
        }
    }

    pub fn app() -> TestApp {
        app_with(None, Ok("Hello"))
    }

    /// multipart/form-data body with one file part and optional text parts.
    pub fn multipart_body(
        file_name: &str,
        content_type: &str,
        data: &[u8],
        fields: &[(&str, &str)],
    ) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value).as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
        router.clone().oneshot(request).await.unwrap()
    }

    pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }
}
