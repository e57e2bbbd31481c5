//! Supabase Storage backend (private bucket, signed URLs for reads).

use super::{Blob, BlobStore};
use crate::supabase::{ensure_success, SupabaseClient};
use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

pub struct SupabaseStorage {
    client: SupabaseClient,
    bucket: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl SupabaseStorage {
    pub fn new(client: SupabaseClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        self.client
            .storage_url(&format!("object/{}/{}", self.bucket, key))
    }

    /// The sign endpoint returns a path relative to `/storage/v1`.
    fn absolute_signed_url(&self, signed_path: &str) -> String {
        if signed_path.starts_with("http://") || signed_path.starts_with("https://") {
            signed_path.to_string()
        } else {
            self.client
                .storage_url(signed_path.trim_start_matches('/'))
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for SupabaseStorage {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        info!("Uploading {} ({} bytes) to bucket {}", key, data.len(), self.bucket);

        let resp = self
            .client
            .post(&self.object_url(key))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(data.to_vec())
            .send()
            .await
            .context("Failed to send storage upload")?;

        let resp = ensure_success(resp, "Storage upload").await?;
        let uploaded: UploadResponse = resp.json().await.unwrap_or(UploadResponse { key: None });

        Ok(uploaded
            .key
            .unwrap_or_else(|| format!("{}/{}", self.bucket, key)))
    }

    async fn get(&self, key: &str) -> Result<Option<Blob>> {
        let resp = self
            .client
            .get(&self.object_url(key))
            .send()
            .await
            .context("Failed to send storage download")?;

        // Storage reports missing objects as 400 or 404 depending on version.
        if matches!(resp.status(), StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST) {
            debug!("Object {} not found in bucket {}", key, self.bucket);
            return Ok(None);
        }

        let resp = ensure_success(resp, "Storage download").await?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| super::content_type_for(key).to_string());
        let data = resp.bytes().await?.to_vec();

        Ok(Some(Blob { data, content_type }))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let url = self.client.storage_url(&format!("object/{}", self.bucket));
        let resp = self
            .client
            .delete(&url)
            .json(&json!({ "prefixes": [key] }))
            .send()
            .await
            .context("Failed to send storage delete")?;

        ensure_success(resp, "Storage delete").await?;
        debug!("Deleted {} from bucket {}", key, self.bucket);
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<Option<String>> {
        let url = self
            .client
            .storage_url(&format!("object/sign/{}/{}", self.bucket, key));
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "expiresIn": ttl.as_secs() }))
            .send()
            .await
            .context("Failed to send sign request")?;

        let resp = ensure_success(resp, "Storage sign").await?;
        let signed: SignResponse = resp
            .json()
            .await
            .map_err(|e| anyhow!("Malformed sign response: {}", e))?;

        Ok(Some(self.absolute_signed_url(&signed.signed_url)))
    }
}
