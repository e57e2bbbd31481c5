//! Tesseract CLI engine.
//!
//! Spawns one `tesseract stdin stdout` process per image. The process is the
//! engine instance: it is created for the call and reaped (or killed, if the
//! call is dropped) before the call returns.

use super::{OcrEngine, OcrInput, ProgressFn};
use anyhow::{bail, Context, Result};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

pub struct TesseractEngine {
    binary: String,
    lang: String,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            lang: lang.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait::async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, input: &OcrInput, progress: &ProgressFn<'_>) -> Result<String> {
        let mut child = self
            .command()
            .spawn()
            .with_context(|| format!("Failed to execute {}", self.binary))?;
        progress(10);

        let mut stdin = child.stdin.take().context("tesseract stdin unavailable")?;
        stdin
            .write_all(&input.data)
            .await
            .context("Failed to feed image to tesseract")?;
        drop(stdin);
        progress(40);

        let output = child
            .wait_with_output()
            .await
            .context("Failed waiting for tesseract")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Tesseract failed ({}): {}", output.status, stderr.trim());
        }

        let text = String::from_utf8(output.stdout).context("Invalid UTF-8 output from tesseract")?;
        debug!("tesseract: {} chars from {}", text.len(), input.filename);
        Ok(text)
    }
}
