use autoos_types::MatchResult;
use image::Rgba;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::capture::CapturedImage;

/// Draws a rectangle outline around a match on a copy of the image
#[derive(Debug, Clone, Copy)]
pub struct Highlighter {
    pub color: Rgba<u8>,
    /// Outline width in pixels
    pub thickness: u32,
    /// Gap between the token box and the innermost outline
    pub padding: u32,
}

impl Highlighter {
    pub fn new(color: Rgba<u8>, thickness: u32, padding: u32) -> Self {
        Self {
            color,
            thickness,
            padding,
        }
    }

    /// The input is never modified. Without a match the copy is identical.
    pub fn annotate(&self, image: &CapturedImage, found: Option<&MatchResult>) -> CapturedImage {
        let mut annotated = image.clone();

        let Some(found) = found else {
            return annotated;
        };
        if annotated.is_empty() {
            return annotated;
        }

        let bbox = found.bbox();
        for ring in 0..self.thickness.max(1) {
            let grow = self.padding + ring;
            let rect = Rect::at(bbox.x - grow as i32, bbox.y - grow as i32)
                .of_size((bbox.width + 2 * grow).max(1), (bbox.height + 2 * grow).max(1));
            draw_hollow_rect_mut(&mut annotated.pixels, rect, self.color);
        }

        tracing::info!("Highlighted '{}' at {}", found.token.text, bbox);
        annotated
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(Rgba([0, 255, 0, 255]), 2, 2)
    }
}
