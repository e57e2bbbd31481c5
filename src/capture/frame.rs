//! Frames, encoded captures, and the file-picker path.

use crate::storage::sniff_image_type;
use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use std::path::Path;

/// JPEG quality used for camera captures.
pub const CAPTURE_JPEG_QUALITY: u8 = 80;

/// A raw RGB8 video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// An encoded image ready for OCR and upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub data: Vec<u8>,
    pub content_type: String,
}

impl CapturedImage {
    /// Encode `frame` as a compressed JPEG.
    pub fn encode_frame(frame: &Frame, quality: u8) -> Result<Self> {
        let expected = frame.width as usize * frame.height as usize * 3;
        if frame.width == 0 || frame.height == 0 || frame.rgb.len() != expected {
            bail!(
                "Frame buffer is {} bytes, expected {} for {}x{}",
                frame.rgb.len(),
                expected,
                frame.width,
                frame.height
            );
        }

        let mut data = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut data, quality);
        encoder
            .encode(&frame.rgb, frame.width, frame.height, ColorType::Rgb8)
            .context("JPEG encode failed")?;

        Ok(Self {
            data,
            content_type: "image/jpeg".to_string(),
        })
    }

    /// `data:<type>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, BASE64.encode(&self.data))
    }

    /// Parse a base64 data URL, as produced by canvases and file readers.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| anyhow!("Not a data URL"))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| anyhow!("Data URL has no payload"))?;
        let content_type = meta
            .strip_suffix(";base64")
            .ok_or_else(|| anyhow!("Only base64 data URLs are supported"))?;

        let data = BASE64
            .decode(payload.trim())
            .context("Invalid base64 in data URL")?;

        Ok(Self {
            data,
            content_type: if content_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                content_type.to_string()
            },
        })
    }
}

/// Load a picked file; the bytes must sniff as an image.
pub async fn load_image_file(path: &Path) -> Result<CapturedImage> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    let content_type = sniff_image_type(&data)
        .ok_or_else(|| anyhow!("{:?} is not a recognized image", path))?;

    Ok(CapturedImage {
        data,
        content_type: content_type.to_string(),
    })
}
