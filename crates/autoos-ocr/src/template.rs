use autoos_types::BoundingBox;
use image::RgbaImage;
use image::imageops::grayscale;
use imageproc::template_matching::{MatchTemplateMethod, find_extremes, match_template};

use crate::capture::CapturedImage;

/// Normalized squared difference at or below which a placement counts as found
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.05;

/// Finds where a reference image appears inside a capture
#[derive(Debug, Clone, Copy)]
pub struct ImageFinder {
    /// 0.0 only accepts a pixel-exact match
    pub threshold: f32,
}

impl ImageFinder {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Best placement of `template` in screen coordinates, or `None` when
    /// nothing is close enough or the template does not fit in the capture.
    pub fn find(&self, screen: &CapturedImage, template: &RgbaImage) -> Option<BoundingBox> {
        let (width, height) = template.dimensions();
        if screen.is_empty()
            || width == 0
            || height == 0
            || width > screen.pixels.width()
            || height > screen.pixels.height()
        {
            tracing::debug!("Template {}x{} does not fit the capture", width, height);
            return None;
        }

        let scores = match_template(
            &grayscale(&screen.pixels),
            &grayscale(template),
            MatchTemplateMethod::SumOfSquaredErrorsNormalized,
        );
        let extremes = find_extremes(&scores);

        // all-black areas score NaN
        if extremes.min_value.is_nan() || extremes.min_value > self.threshold {
            tracing::info!("No placement within {} (best {})", self.threshold, extremes.min_value);
            return None;
        }

        let (x, y) = extremes.min_value_location;
        let found = BoundingBox::new(
            screen.region.x + x as i32,
            screen.region.y + y as i32,
            width,
            height,
        );
        tracing::info!("Found image at {} (score {})", found, extremes.min_value);
        Some(found)
    }
}

impl Default for ImageFinder {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

/// [`ImageFinder::find`] with the default threshold
pub fn find_image(screen: &CapturedImage, template: &RgbaImage) -> Option<BoundingBox> {
    ImageFinder::default().find(screen, template)
}

#[cfg(test)]
mod tests {
    use autoos_types::CaptureRegion;
    use image::Rgba;
    use image::imageops::replace;

    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn patch() -> RgbaImage {
        RgbaImage::from_fn(6, 5, |x, y| {
            let v = (5 + 30 * x + 10 * y) as u8;
            Rgba([v, v, v, 255])
        })
    }

    fn canvas_with_patch(x: i64, y: i64) -> RgbaImage {
        let mut canvas = RgbaImage::from_pixel(60, 40, WHITE);
        replace(&mut canvas, &patch(), x, y);
        canvas
    }

    #[test]
    fn test_finds_pasted_patch() {
        let screen = CapturedImage::from_pixels(canvas_with_patch(20, 10));
        assert_eq!(find_image(&screen, &patch()), Some(BoundingBox::new(20, 10, 6, 5)));
    }

    #[test]
    fn test_location_is_in_screen_coordinates() {
        let screen = CapturedImage::new(canvas_with_patch(3, 4), CaptureRegion::new(100, 200, 60, 40));
        assert_eq!(find_image(&screen, &patch()), Some(BoundingBox::new(103, 204, 6, 5)));
    }

    #[test]
    fn test_absent_patch_is_none() {
        let screen = CapturedImage::from_pixels(RgbaImage::from_pixel(60, 40, WHITE));
        let dark = RgbaImage::from_pixel(6, 5, Rgba([20, 20, 20, 255]));
        assert_eq!(find_image(&screen, &dark), None);
    }

    #[test]
    fn test_template_larger_than_capture_is_none() {
        let screen = CapturedImage::from_pixels(RgbaImage::from_pixel(4, 4, WHITE));
        assert_eq!(find_image(&screen, &patch()), None);
        assert_eq!(find_image(&CapturedImage::from_pixels(RgbaImage::new(0, 0)), &patch()), None);
    }
}
