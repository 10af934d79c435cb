use std::env;

use autoos_types::CaptureRegion;
use serde::{Deserialize, Serialize};

fn default_language() -> String {
    "eng".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language pack(s), e.g. "eng" or "eng+deu"
    #[serde(default = "default_language")]
    pub language: String,
    /// Upper bound for a single recognition run
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    pub capture_region: Option<CaptureRegion>,
    pub target_window: Option<String>,
}

impl OcrConfig {
    pub fn new() -> Self {
        let language = env::var("AUTOOS_OCR_LANGUAGE").unwrap_or_else(|_| default_language());

        let timeout_seconds = env::var("AUTOOS_OCR_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_timeout_seconds);

        Self {
            language,
            timeout_seconds,
            ..Self::default()
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            timeout_seconds: default_timeout_seconds(),
            capture_region: None,
            target_window: None,
        }
    }
}
