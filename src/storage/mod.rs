//! Blob storage for uploaded images.
//!
//! Defines the [`BlobStore`] trait so the filesystem and Supabase Storage
//! backends can be swapped via configuration, plus the key/filename helpers
//! shared by the upload and serving endpoints.

pub mod local;
pub mod supabase;

use image::ImageFormat;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use uuid::Uuid;

/// Largest accepted image payload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A stored object read back from a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Async trait implemented by each storage backend.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    fn name(&self) -> &str;

    /// Store `data` under `key`; returns the backend's path for the object.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> anyhow::Result<String>;

    /// `Ok(None)` when no object exists under `key`.
    async fn get(&self, key: &str) -> anyhow::Result<Option<Blob>>;

    async fn delete(&self, key: &str) -> anyhow::Result<()>;

    /// Mint a time-limited URL, or `Ok(None)` if the backend has no such concept.
    async fn signed_url(&self, key: &str, ttl: Duration) -> anyhow::Result<Option<String>>;
}

/// Why an upload payload was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadRejection {
    Empty,
    NotAnImage,
    TooLarge,
}

impl PayloadRejection {
    pub fn message(self) -> &'static str {
        match self {
            PayloadRejection::Empty => "No file uploaded",
            PayloadRejection::NotAnImage => "Only image files are allowed",
            PayloadRejection::TooLarge => "File size must be less than 10MB",
        }
    }
}

/// Check size and MIME type, returning the content type to store the blob with.
///
/// A declared `image/*` type is trusted. When the client sends nothing useful
/// the leading bytes are sniffed instead.
pub fn check_image_payload(
    declared: Option<&str>,
    data: &[u8],
) -> Result<String, PayloadRejection> {
    if data.is_empty() {
        return Err(PayloadRejection::Empty);
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(PayloadRejection::TooLarge);
    }

    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    match declared {
        Some(ct) if ct.starts_with("image/") => Ok(ct),
        Some(_) => Err(PayloadRejection::NotAnImage),
        None => sniff_image_type(data)
            .map(str::to_string)
            .ok_or(PayloadRejection::NotAnImage),
    }
}

/// MIME type of the image encoded in `data`, if recognizable.
pub fn sniff_image_type(data: &[u8]) -> Option<&'static str> {
    let mime = match image::guess_format(data).ok()? {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => return None,
    };
    Some(mime)
}

/// Generate a collision-resistant object key that keeps the original extension.
pub fn generate_key(original_name: Option<&str>, content_type: &str) -> String {
    let ext = original_name
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext))
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .or_else(|| extension_for_content_type(content_type).map(str::to_string))
        .unwrap_or_else(|| "bin".to_string());

    format!("{}.{}", Uuid::new_v4().simple(), ext)
}

fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/bmp" => Some("bmp"),
        "image/tiff" => Some("tiff"),
        _ => None,
    }
}

/// Strip everything outside `[A-Za-z0-9._-]` so a filename cannot escape the store.
pub fn sanitize_filename(filename: &str) -> String {
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();
    let re = DISALLOWED.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static regex"));
    re.replace_all(filename, "").into_owned()
}

/// Content type for serving, inferred from the filename extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Direct retrieval path served by this service for `key`.
pub fn direct_url(key: &str) -> String {
    format!("/uploads/{}", key)
}
