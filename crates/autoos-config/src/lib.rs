use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use self::acquisition::AcquisitionConfig;
use self::ocr::OcrConfig;

pub mod acquisition;
pub mod ocr;

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub ocr: OcrConfig,
    pub acquisition: AcquisitionConfig,
    /// Fallback filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Build from environment variables, falling back to defaults
    pub fn new() -> Self {
        let log_level = env::var("AUTOOS_LOG_LEVEL").unwrap_or_else(|_| default_log_level());

        Config {
            ocr: OcrConfig::new(),
            acquisition: AcquisitionConfig::new(),
            log_level,
        }
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr: OcrConfig::default(),
            acquisition: AcquisitionConfig::default(),
            log_level: default_log_level(),
        }
    }
}
