use std::time::Duration;

/// Failures of the OCR subsystem. None of them is fatal to the host.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("OCR engine is not available")]
    DependencyUnavailable,

    #[error("Download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Install failed: {0}")]
    InstallFailed(String),

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("OCR invocation failed: {0}")]
    OcrInvocationFailed(String),

    #[error("{step} timed out after {after:?}")]
    Timeout { step: &'static str, after: Duration },

    #[error("{step} was cancelled")]
    Cancelled { step: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
