pub mod types;

pub use types::{
    BoundingBox, CaptureRegion, DependencyState, InstallRecord, MatchResult, OcrToken,
};
