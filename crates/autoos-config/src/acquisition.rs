use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Official 64-bit Windows build of Tesseract
pub const DEFAULT_INSTALLER_URL: &str = "https://github.com/tesseract-ocr/tesseract/releases/download/5.5.0/tesseract-ocr-w64-setup-5.5.0.20241111.exe";

fn default_executable_name() -> String {
    if cfg!(windows) {
        "tesseract.exe".to_string()
    } else {
        "tesseract".to_string()
    }
}

fn default_fallback_executables() -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![
            PathBuf::from(r"C:\Program Files\Tesseract-OCR\tesseract.exe"),
            PathBuf::from(r"C:\Program Files\tesseract.exe"),
        ]
    } else {
        vec![
            PathBuf::from("/usr/bin/tesseract"),
            PathBuf::from("/opt/homebrew/bin/tesseract"),
        ]
    }
}

fn default_secondary_directory() -> Option<PathBuf> {
    if cfg!(windows) {
        Some(PathBuf::from(r"C:\Program Files"))
    } else {
        Some(PathBuf::from("/usr/local/bin"))
    }
}

fn default_install_dir() -> PathBuf {
    PathBuf::from("tesseract")
}

fn default_installer_url() -> String {
    DEFAULT_INSTALLER_URL.to_string()
}

fn default_download_dir() -> PathBuf {
    env::temp_dir()
}

fn default_download_timeout_seconds() -> u64 {
    300
}

fn default_install_timeout_seconds() -> u64 {
    600
}

fn default_acquire_missing() -> bool {
    cfg!(windows)
}

/// Where to look for the OCR engine and how to fetch it when it is missing
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AcquisitionConfig {
    #[serde(default = "default_executable_name")]
    pub executable_name: String,
    /// Known install locations, checked in order
    #[serde(default = "default_fallback_executables")]
    pub fallback_executables: Vec<PathBuf>,
    /// Conventional system directory checked after the known locations
    #[serde(default = "default_secondary_directory")]
    pub secondary_directory: Option<PathBuf>,
    /// Target of silent installs; relative paths resolve against the working directory
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,
    #[serde(default = "default_installer_url")]
    pub installer_url: String,
    /// Where the installer is downloaded to before it runs
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    #[serde(default = "default_download_timeout_seconds")]
    pub download_timeout_seconds: u64,
    #[serde(default = "default_install_timeout_seconds")]
    pub install_timeout_seconds: u64,
    /// Download and install when every lookup fails. Only Windows builds default to true;
    /// the installer is a Windows package, so other platforms never acquire.
    #[serde(default = "default_acquire_missing")]
    pub acquire_missing: bool,
}

impl AcquisitionConfig {
    pub fn new() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("AUTOOS_INSTALLER_URL") {
            config.installer_url = url;
        }

        if let Ok(dir) = env::var("AUTOOS_INSTALL_DIR") {
            config.install_dir = PathBuf::from(dir);
        }

        if let Some(secs) = env::var("AUTOOS_DOWNLOAD_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.download_timeout_seconds = secs;
        }

        if let Some(secs) = env::var("AUTOOS_INSTALL_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.install_timeout_seconds = secs;
        }

        config
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_seconds)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_seconds)
    }

    /// Expected executable inside the install directory
    pub fn installed_executable(&self) -> PathBuf {
        self.install_dir.join(&self.executable_name)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            executable_name: default_executable_name(),
            fallback_executables: default_fallback_executables(),
            secondary_directory: default_secondary_directory(),
            install_dir: default_install_dir(),
            installer_url: default_installer_url(),
            download_dir: default_download_dir(),
            download_timeout_seconds: default_download_timeout_seconds(),
            install_timeout_seconds: default_install_timeout_seconds(),
            acquire_missing: default_acquire_missing(),
        }
    }
}
