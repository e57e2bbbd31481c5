//! HTTP recognizer sidecar engine.
//!
//! Posts the image as multipart `file` to `{url}/ocr` and expects
//! `{"text": "..."}` back.

use super::{OcrEngine, OcrInput, ProgressFn};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct SidecarResponse {
    text: String,
}

pub struct SidecarEngine {
    url: String,
    client: reqwest::Client,
}

impl SidecarEngine {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl OcrEngine for SidecarEngine {
    fn name(&self) -> &str {
        "sidecar"
    }

    async fn recognize(&self, input: &OcrInput, progress: &ProgressFn<'_>) -> anyhow::Result<String> {
        use reqwest::multipart::{Form, Part};

        let part = Part::bytes(input.data.clone())
            .file_name(input.filename.clone())
            .mime_str(&input.content_type)?;
        let form = Form::new().part("file", part);

        info!("SidecarEngine: sending {} to {}", input.filename, self.url);
        progress(10);

        let response = self
            .client
            .post(format!("{}/ocr", self.url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OCR sidecar error ({}): {}", status, error_text);
        }
        progress(90);

        let result: SidecarResponse = response.json().await?;
        Ok(result.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::no_progress;

    #[tokio::test]
    async fn test_unreachable_sidecar_is_error() {
        let engine = SidecarEngine::new("http://127.0.0.1:9", reqwest::Client::new());
        let input = OcrInput {
            filename: "a.png".into(),
            content_type: "image/png".into(),
            data: vec![1, 2, 3],
        };
        assert!(engine.recognize(&input, &no_progress).await.is_err());
    }

    #[test]
    fn test_response_shape() {
        let parsed: SidecarResponse = serde_json::from_str(r#"{"text":"Hello","confidence":0.9}"#).unwrap();
        assert_eq!(parsed.text, "Hello");
    }
}
