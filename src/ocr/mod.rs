//! OCR engine abstraction.
//!
//! Defines the [`OcrEngine`] trait so the local Tesseract CLI and an HTTP
//! recognizer sidecar can be swapped via configuration. Each call owns its
//! engine instance for the duration of one image; nothing is pooled and a
//! started recognition always runs to completion or failure.

pub mod sidecar;
pub mod tesseract;

/// Message shown for any recognition failure, whatever the cause.
pub const RETRY_MESSAGE: &str = "Failed to extract text from image. Please try again.";

/// Message shown when recognition succeeded but found nothing.
pub const NO_TEXT_MESSAGE: &str =
    "No text found in the image. Try a clearer image with better lighting.";

/// One image to recognize.
#[derive(Debug, Clone)]
pub struct OcrInput {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Coarse progress callback, percent in `0..=100`.
pub type ProgressFn<'a> = dyn Fn(u8) + Send + Sync + 'a;

/// Async trait implemented by each OCR backend.
#[async_trait::async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize `input` and return the raw text.
    async fn recognize(&self, input: &OcrInput, progress: &ProgressFn<'_>) -> anyhow::Result<String>;
}

/// What a recognition produced, as far as the user is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrOutcome {
    Text(String),
    NoText,
}

/// Run `engine` on one image, reporting 0 and 100 around the engine's own
/// progress and folding a blank result into [`OcrOutcome::NoText`].
pub async fn recognize_image(
    engine: &dyn OcrEngine,
    input: &OcrInput,
    progress: &ProgressFn<'_>,
) -> anyhow::Result<OcrOutcome> {
    tracing::debug!(
        "OCR[{}]: recognizing {} ({} bytes)",
        engine.name(),
        input.filename,
        input.data.len()
    );
    progress(0);
    let text = engine.recognize(input, progress).await?;
    progress(100);

    if text.trim().is_empty() {
        tracing::info!("OCR[{}]: no text found in {}", engine.name(), input.filename);
        return Ok(OcrOutcome::NoText);
    }
    Ok(OcrOutcome::Text(text.trim().to_string()))
}

/// Progress sink that discards updates.
pub fn no_progress(_: u8) {}


#[cfg(test)]
mod tests {
    use super::testing::FixedEngine;
    use super::*;
    use std::sync::Mutex;

    fn input() -> OcrInput {
        OcrInput {
            filename: "doc.jpg".into(),
            content_type: "image/jpeg".into(),
            data: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_text_is_trimmed_and_progress_reported() {
        let seen = Mutex::new(Vec::new());
        let record = |p: u8| seen.lock().unwrap().push(p);
        let engine = FixedEngine(Ok("  Hello\n".into()));

        let outcome = recognize_image(&engine, &input(), &record).await.unwrap();
        assert_eq!(outcome, OcrOutcome::Text("Hello".into()));
        assert_eq!(*seen.lock().unwrap(), vec![0, 50, 100]);
    }

    #[tokio::test]
    async fn test_whitespace_is_no_text() {
        let engine = FixedEngine(Ok(" \n\t ".into()));
        let outcome = recognize_image(&engine, &input(), &no_progress).await.unwrap();
        assert_eq!(outcome, OcrOutcome::NoText);
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let engine = FixedEngine(Err("engine exploded".into()));
        assert!(recognize_image(&engine, &input(), &no_progress).await.is_err());
    }
}
