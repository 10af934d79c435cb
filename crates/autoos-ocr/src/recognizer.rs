use std::io::Cursor;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use autoos_config::ocr::OcrConfig;
use autoos_types::{BoundingBox, OcrToken};
use image::{ImageFormat, RgbaImage};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::bounded::bounded;
use crate::error::{Error, Result};

/// Tesseract's page-iterator level for single words
const WORD_LEVEL: u32 = 5;

/// Runs an OCR engine over one image
#[async_trait::async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Word tokens in the engine's reading order
    async fn recognize(&self, engine: &Path, image: &RgbaImage) -> Result<Vec<OcrToken>>;

    /// Plain text exactly as the engine lays it out
    async fn read_text(&self, engine: &Path, image: &RgbaImage) -> Result<String>;
}

/// Drives the `tesseract` command line, piping a PNG through stdin
pub struct TesseractCli {
    language: String,
    timeout: Duration,
    cancel: CancellationToken,
}

impl TesseractCli {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            language: config.language.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    async fn run(&self, engine: &Path, image: &RgbaImage, output_config: Option<&str>) -> Result<String> {
        let png = encode_png(image)?;

        bounded("ocr", self.timeout, &self.cancel, async {
            let mut child = Command::new(engine)
                .args(["stdin", "stdout", "-l", self.language.as_str()])
                .args(output_config)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| {
                    Error::OcrInvocationFailed(format!("could not start {}: {e}", engine.display()))
                })?;

            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| Error::OcrInvocationFailed("engine stdin unavailable".into()))?;

            let feed = async move {
                let written = stdin.write_all(&png).await;
                drop(stdin);
                written
            };
            let (fed, output) = tokio::join!(feed, child.wait_with_output());

            let output = output
                .map_err(|e| Error::OcrInvocationFailed(format!("engine did not finish: {e}")))?;

            if !output.status.success() {
                return Err(Error::OcrInvocationFailed(format!(
                    "tesseract exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }
            fed.map_err(|e| Error::OcrInvocationFailed(format!("failed to send image: {e}")))?;

            Ok::<_, Error>(String::from_utf8_lossy(&output.stdout).into_owned())
        })
        .await
    }
}

#[async_trait::async_trait]
impl TextRecognizer for TesseractCli {
    async fn recognize(&self, engine: &Path, image: &RgbaImage) -> Result<Vec<OcrToken>> {
        let tsv = self.run(engine, image, Some("tsv")).await?;
        Ok(parse_tsv(&tsv))
    }

    async fn read_text(&self, engine: &Path, image: &RgbaImage) -> Result<String> {
        self.run(engine, image, None).await
    }
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| Error::OcrInvocationFailed(format!("failed to encode PNG: {e}")))?;
    Ok(buffer.into_inner())
}

/// Word rows of Tesseract's TSV output, in file order.
///
/// Columns: level, page, block, paragraph, line, word, left, top, width,
/// height, conf, text. Rows above word level and blank words are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<OcrToken> {
    tsv.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 12 || cols[0].parse::<u32>().ok()? != WORD_LEVEL {
                return None;
            }

            let text = cols[11].trim();
            if text.is_empty() {
                return None;
            }

            let bbox = BoundingBox::new(
                cols[6].parse().ok()?,
                cols[7].parse().ok()?,
                cols[8].parse().ok()?,
                cols[9].parse().ok()?,
            );
            let confidence = cols[10].trim().parse().unwrap_or(-1.0);

            Some(OcrToken::new(text, bbox, confidence))
        })
        .collect()
}
