use std::path::Path;

use anyhow::{Context, Result};
use autoos_types::CaptureRegion;
use image::RgbaImage;
use xcap::{Monitor, Window};

use crate::error::Error;

/// Pixels plus the screen-space region they were taken from
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub pixels: RgbaImage,
    pub region: CaptureRegion,
}

impl CapturedImage {
    pub fn new(pixels: RgbaImage, region: CaptureRegion) -> Self {
        Self { pixels, region }
    }

    /// Image not tied to a screen position, e.g. loaded from disk
    pub fn from_pixels(pixels: RgbaImage) -> Self {
        let region = CaptureRegion::new(0, 0, pixels.width(), pixels.height());
        Self { pixels, region }
    }

    pub fn empty(region: CaptureRegion) -> Self {
        Self {
            pixels: RgbaImage::new(0, 0),
            region,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))
            .map_err(capture_failed)?;
        Ok(Self::from_pixels(image.to_rgba8()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        self.pixels
            .save(path)
            .map_err(|e| std::io::Error::other(format!("Failed to save {}: {e}", path.display())))?;
        tracing::info!("Screenshot saved to {}", path.display());
        Ok(())
    }
}

/// List all available windows with their titles
pub fn list_windows() -> crate::Result<Vec<(u32, String)>> {
    let windows = Window::all()
        .context("Failed to enumerate windows")
        .map_err(capture_failed)?;
    Ok(windows
        .into_iter()
        .filter(|w| !w.title().is_empty() && !w.is_minimized())
        .map(|w| (w.id(), w.title().to_string()))
        .collect())
}

/// Capture the entire primary monitor
pub fn capture_primary_screen() -> crate::Result<CapturedImage> {
    primary_screen().map_err(capture_failed)
}

/// Capture a region of the screen. A zero-area region yields an empty capture.
pub fn capture_screen_region(region: CaptureRegion) -> crate::Result<CapturedImage> {
    if region.is_empty() {
        return Ok(CapturedImage::empty(region));
    }
    screen_region(region).map_err(capture_failed)
}

/// Capture the first window whose title contains `title`, ignoring case
pub fn capture_window_by_title(title: &str) -> crate::Result<CapturedImage> {
    window_by_title(title).map_err(capture_failed)
}

fn primary_screen() -> Result<CapturedImage> {
    let monitors = Monitor::all().context("Failed to get monitors")?;
    let monitor = monitors.first().context("No monitor found")?;

    let image = monitor.capture_image().context("Failed to capture screen")?;
    let pixels = to_rgba(image.width(), image.height(), image.into_raw())?;
    let region = CaptureRegion::new(monitor.x(), monitor.y(), pixels.width(), pixels.height());
    Ok(CapturedImage::new(pixels, region))
}

fn screen_region(region: CaptureRegion) -> Result<CapturedImage> {
    let monitors = Monitor::all().context("Failed to get monitors")?;

    let monitor = monitors
        .iter()
        .find(|m| {
            region.x >= m.x()
                && region.y >= m.y()
                && region.x + region.width as i32 <= m.x() + m.width() as i32
                && region.y + region.height as i32 <= m.y() + m.height() as i32
        })
        .or(monitors.first())
        .context("No monitor found")?;

    let image = monitor.capture_image().context("Failed to capture screen")?;
    let screen = to_rgba(image.width(), image.height(), image.into_raw())?;

    // crop_imm clamps to the screen, so the result may be smaller than requested
    let left = (region.x - monitor.x()).max(0) as u32;
    let top = (region.y - monitor.y()).max(0) as u32;
    let cropped =
        image::imageops::crop_imm(&screen, left, top, region.width, region.height).to_image();

    let actual = CaptureRegion::new(
        monitor.x() + left as i32,
        monitor.y() + top as i32,
        cropped.width(),
        cropped.height(),
    );
    Ok(CapturedImage::new(cropped, actual))
}

fn window_by_title(title: &str) -> Result<CapturedImage> {
    let windows = Window::all().context("Failed to enumerate windows")?;
    let window = windows
        .into_iter()
        .find(|w| w.title().to_lowercase().contains(&title.to_lowercase()))
        .context(format!("No window matching '{}'", title))?;

    let image = window.capture_image().context("Failed to capture window")?;
    let pixels = to_rgba(image.width(), image.height(), image.into_raw())?;
    let region = CaptureRegion::new(window.x(), window.y(), pixels.width(), pixels.height());
    Ok(CapturedImage::new(pixels, region))
}

/// Rebuild the buffer with our own `image` types
fn to_rgba(width: u32, height: u32, raw: Vec<u8>) -> Result<RgbaImage> {
    RgbaImage::from_raw(width, height, raw).context("Captured buffer does not match its size")
}

fn capture_failed(e: anyhow::Error) -> Error {
    Error::CaptureFailed(format!("{e:#}"))
}
