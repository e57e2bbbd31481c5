//! Application state and router.

use crate::config::{AppConfig, DatabaseBackend, OcrBackend, StorageBackend};
use crate::handlers;
use crate::ocr::{sidecar::SidecarEngine, tesseract::TesseractEngine, OcrEngine};
use crate::pipeline::ScanPipeline;
use crate::storage::{local::LocalStore, supabase::SupabaseStorage, BlobStore, MAX_UPLOAD_BYTES};
use crate::store::{memory::MemoryStore, supabase::SupabaseStore, DocumentStore};
use crate::supabase::SupabaseClient;
use anyhow::{Context, Result};
use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::request::Parts,
    routing::{get, post},
    Router,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Room for multipart framing on top of the largest accepted image.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Header naming the acting user until real authentication exists.
pub const USER_HEADER: &str = "x-user-id";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub blobs: Arc<dyn BlobStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub ocr: Arc<dyn OcrEngine>,
    pub pipeline: ScanPipeline,
    pub default_user_id: String,
    pub signed_url_ttl: Duration,
}

impl AppState {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        documents: Arc<dyn DocumentStore>,
        ocr: Arc<dyn OcrEngine>,
        default_user_id: impl Into<String>,
        signed_url_ttl: Duration,
    ) -> Self {
        let pipeline = ScanPipeline::new(blobs.clone(), documents.clone(), ocr.clone());
        Self {
            blobs,
            documents,
            ocr,
            pipeline,
            default_user_id: default_user_id.into(),
            signed_url_ttl,
        }
    }

    /// Construct the configured backends.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let supabase = config.supabase.as_ref().map(SupabaseClient::new);

        let blobs: Arc<dyn BlobStore> = match &config.storage {
            StorageBackend::Local { root } => {
                let store = LocalStore::new(root);
                store.init().await?;
                info!("Blob store: local ({})", store.root().display());
                Arc::new(store)
            }
            StorageBackend::Supabase { bucket } => {
                let client = supabase.clone().context("Supabase credentials missing")?;
                info!("Blob store: supabase bucket {}", bucket);
                Arc::new(SupabaseStorage::new(client, bucket.clone()))
            }
        };

        let documents: Arc<dyn DocumentStore> = match &config.database {
            DatabaseBackend::Memory => {
                info!("Document store: in-memory (records are lost on restart)");
                Arc::new(MemoryStore::new())
            }
            DatabaseBackend::Supabase { table } => {
                let client = supabase.clone().context("Supabase credentials missing")?;
                info!("Document store: supabase table {}", table);
                Arc::new(SupabaseStore::new(client, table.clone()))
            }
        };

        let ocr: Arc<dyn OcrEngine> = match &config.ocr {
            OcrBackend::Tesseract { binary } => {
                Arc::new(TesseractEngine::new(binary.clone(), config.ocr_lang.clone()))
            }
            OcrBackend::Sidecar { url } => {
                Arc::new(SidecarEngine::new(url.clone(), reqwest::Client::new()))
            }
        };
        info!("OCR engine: {} ({})", ocr.name(), config.ocr_lang);

        Ok(Self::new(
            blobs,
            documents,
            ocr,
            config.default_user_id.clone(),
            Duration::from_secs(config.signed_url_ttl_secs),
        ))
    }
}

/// The user a request acts for: the `x-user-id` header, else the configured default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| state.default_user_id.clone());
        Ok(CurrentUser(user))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload::upload_file))
        .route(
            "/document",
            post(handlers::documents::create_document).get(handlers::documents::list_documents),
        )
        .route(
            "/document/:id",
            get(handlers::documents::get_document)
                .put(handlers::documents::update_document)
                .delete(handlers::documents::delete_document),
        )
        .route("/uploads/:filename", get(handlers::files::serve_upload))
        .route("/ocr", post(handlers::scan::run_ocr))
        .route("/scan", post(handlers::scan::scan_document))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
