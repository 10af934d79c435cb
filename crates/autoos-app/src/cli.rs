use std::path::PathBuf;

use autoos_types::CaptureRegion;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "autoos")]
#[command(about = "Find, read and highlight text on screen with Tesseract OCR")]
pub struct Cli {
    /// JSON config file; environment variables are used when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Make sure Tesseract is usable, installing it where supported
    Ensure,
    /// Save a screenshot
    Screenshot {
        output: PathBuf,
        #[command(flatten)]
        source: ScreenSource,
    },
    /// List capturable windows
    Windows,
    /// Print all text recognized in the capture
    Text {
        #[command(flatten)]
        source: ImageSource,
    },
    /// Print every recognized word containing QUERY (case-insensitive)
    Locate {
        query: String,
        /// Print matches as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        source: ImageSource,
    },
    /// Print where TEMPLATE appears in the capture
    FindImage {
        template: PathBuf,
        /// Highest normalized difference still accepted as a match
        #[arg(long, default_value_t = autoos_ocr::DEFAULT_MATCH_THRESHOLD)]
        threshold: f32,
        #[command(flatten)]
        source: ImageSource,
    },
    /// Outline the first word containing QUERY and save the result
    Highlight {
        query: String,
        output: PathBuf,
        #[command(flatten)]
        source: ImageSource,
    },
}

/// Which part of the screen to capture
#[derive(Args, Clone, Default)]
pub struct ScreenSource {
    /// Screen region as x,y,width,height
    #[arg(long, conflicts_with = "window")]
    pub region: Option<CaptureRegion>,

    /// Capture the first window whose title contains this text
    #[arg(long)]
    pub window: Option<String>,
}

/// A screen capture, or an image file instead
#[derive(Args, Clone, Default)]
pub struct ImageSource {
    /// Read this image file instead of capturing the screen
    #[arg(long, conflicts_with_all = ["region", "window"])]
    pub image: Option<PathBuf>,

    #[command(flatten)]
    pub screen: ScreenSource,
}
