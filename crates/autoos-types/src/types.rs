use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Screen-space rectangle a capture was taken from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A zero-area region is a valid, empty capture
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl FromStr for CaptureRegion {
    type Err = String;

    /// Parse `x,y,width,height`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!("expected x,y,width,height but got '{s}'"));
        }

        let x = parts[0]
            .parse()
            .map_err(|_| format!("invalid x coordinate '{}'", parts[0]))?;
        let y = parts[1]
            .parse()
            .map_err(|_| format!("invalid y coordinate '{}'", parts[1]))?;
        let width = parts[2]
            .parse()
            .map_err(|_| format!("invalid width '{}'", parts[2]))?;
        let height = parts[3]
            .parse()
            .map_err(|_| format!("invalid height '{}'", parts[3]))?;

        Ok(Self::new(x, y, width, height))
    }
}

/// Axis-aligned rectangle in image pixel coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// One unit of recognized text, usually a word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrToken {
    pub text: String,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl OcrToken {
    pub fn new(text: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }
}

/// A token that satisfied a query, with its position in reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Index of the token in the sequence it was matched against
    pub index: usize,
    pub token: OcrToken,
}

impl MatchResult {
    pub fn bbox(&self) -> BoundingBox {
        self.token.bbox
    }
}

/// Lifecycle of the external OCR engine dependency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyState {
    #[default]
    Unknown,
    Verified,
    Missing,
    Installing,
    Failed,
}

impl fmt::Display for DependencyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DependencyState::Unknown => "unknown",
            DependencyState::Verified => "verified",
            DependencyState::Missing => "missing",
            DependencyState::Installing => "installing",
            DependencyState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a successful acquisition. Never mutated, only replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallRecord {
    pub install_directory: PathBuf,
    pub executable_path: PathBuf,
    /// `None` when a copy left by an earlier run was reused
    pub source_url: Option<String>,
    pub verified_at: SystemTime,
}
