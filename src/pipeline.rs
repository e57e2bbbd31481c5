//! Scan pipeline: validate, recognize, store the image, record the document.
//!
//! Upload and record creation are two separate systems with no shared
//! transaction. If the record insert fails the freshly stored blob is deleted
//! again, so a failed scan leaves nothing behind (barring a failure of that
//! cleanup too, which is logged).

use crate::ocr::{recognize_image, OcrEngine, OcrInput, OcrOutcome, ProgressFn};
use crate::schema::{Document, NewDocument};
use crate::storage::{check_image_payload, generate_key, BlobStore, PayloadRejection};
use crate::store::DocumentStore;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{}", .0.message())]
    Rejected(PayloadRejection),

    #[error("no text found")]
    NoText,

    #[error("recognition failed: {0:#}")]
    Ocr(anyhow::Error),

    #[error("storage failed: {0:#}")]
    Storage(anyhow::Error),

    #[error("record insert failed: {0:#}")]
    Record(anyhow::Error),
}

/// An image to scan, as received from a client.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub user_id: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Clone)]
pub struct ScanPipeline {
    blobs: Arc<dyn BlobStore>,
    documents: Arc<dyn DocumentStore>,
    ocr: Arc<dyn OcrEngine>,
}

impl ScanPipeline {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        documents: Arc<dyn DocumentStore>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self { blobs, documents, ocr }
    }

    pub async fn run(&self, request: ScanRequest, progress: &ProgressFn<'_>) -> Result<Document, ScanError> {
        let content_type = check_image_payload(request.content_type.as_deref(), &request.data)
            .map_err(ScanError::Rejected)?;

        let input = OcrInput {
            filename: request.file_name.clone().unwrap_or_else(|| "capture".to_string()),
            content_type: content_type.clone(),
            data: request.data,
        };

        let text = match recognize_image(self.ocr.as_ref(), &input, progress).await {
            Ok(OcrOutcome::Text(text)) => text,
            Ok(OcrOutcome::NoText) => return Err(ScanError::NoText),
            Err(e) => return Err(ScanError::Ocr(e)),
        };

        let key = generate_key(request.file_name.as_deref(), &content_type);
        self.blobs
            .put(&key, &input.data, &content_type)
            .await
            .map_err(ScanError::Storage)?;

        let new_doc = NewDocument {
            user_id: request.user_id,
            object_key: key.clone(),
            extracted_text: text,
        };

        match self.documents.insert(new_doc).await {
            Ok(doc) => {
                info!("Scanned {} into document {}", key, doc.id);
                Ok(doc)
            }
            Err(e) => {
                error!("Record insert failed for {}, removing blob: {:#}", key, e);
                if let Err(cleanup) = self.blobs.delete(&key).await {
                    warn!("Orphaned blob {} left behind: {:#}", key, cleanup);
                }
                Err(ScanError::Record(e))
            }
        }
    }
}
