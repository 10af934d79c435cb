mod acquire;
mod bounded;
mod capture;
mod error;
mod highlight;
mod locator;
mod path_env;
mod recognizer;
mod resolver;
mod template;

#[cfg(test)]
mod tests;

pub use acquire::{Downloader, HttpDownloader, Installer, SilentInstaller};
pub use capture::{
    CapturedImage, capture_primary_screen, capture_screen_region, capture_window_by_title,
    list_windows,
};
pub use error::{Error, Result};
pub use highlight::Highlighter;
pub use locator::{TextLocator, match_tokens};
pub use path_env::{MemoryPath, PathEnvironment, ProcessPath, SearchPath};
pub use recognizer::{TesseractCli, TextRecognizer, parse_tsv};
pub use resolver::DependencyResolver;
pub use template::{DEFAULT_MATCH_THRESHOLD, ImageFinder, find_image};
