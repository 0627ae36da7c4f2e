//! Text watermark compositing.
//!
//! Text is drawn onto a transparent RGBA layer the size of the canvas, either
//! once at the requested position or tiled across the whole canvas, and the
//! layer is then alpha-composited over the photo. Rotated text is drawn into a
//! padded square scratch buffer first, rotated with expansion so nothing
//! clips, and pasted onto the layer.

use image::{Rgb, RgbImage, RgbaImage};

use crate::blending::{alpha_composite, paste};
use crate::error::{Error, Result};
use crate::font::{FontHandle, TextBounds};
use crate::geometry::{clamp_anchor, rotate_expand, TileGrid, ROTATION_MARGIN};
use crate::params::PlacementParams;

/// Lowest alpha a text watermark is drawn with, whatever the opacity.
pub const MIN_TEXT_ALPHA: u8 = 50;

/// What to write and how it looks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpec {
    /// Watermark text. Whitespace-only text leaves the canvas unchanged.
    pub text: String,
    /// Font size in pixels, greater than zero.
    pub font_size: u32,
    /// Fill color.
    pub color: Rgb<u8>,
}

impl Default for TextSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 50,
            color: Rgb([255, 255, 255]),
        }
    }
}

/// Layer alpha for a given opacity: `max(50, round(255 * opacity))`.
#[must_use]
pub fn text_alpha(opacity: f32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let alpha = (255.0 * opacity.clamp(0.0, 1.0)).round() as u8;
    alpha.max(MIN_TEXT_ALPHA)
}

/// Where a rotated stamp of size `stamp` lands in single mode: the requested
/// position, pulled back so the stamp stays inside the canvas.
#[must_use]
pub fn single_stamp_origin(
    position: (u32, u32),
    stamp: (u32, u32),
    canvas: (u32, u32),
) -> (u32, u32) {
    (
        clamp_anchor(position.0, stamp.0, canvas.0),
        clamp_anchor(position.1, stamp.1, canvas.1),
    )
}

/// Renders text watermarks with a given font.
#[derive(Debug, Clone, Copy)]
pub struct TextCompositor<'a> {
    font: &'a FontHandle,
}

/// Per-call drawing state shared by every tile.
struct Pen<'a> {
    font: &'a FontHandle,
    spec: &'a TextSpec,
    bounds: TextBounds,
    alpha: u8,
    angle: f32,
}

impl Pen<'_> {
    /// Draw the text with its origin at (`x`, `y`).
    fn draw_direct(&self, layer: &mut RgbaImage, x: i64, y: i64) {
        self.font.draw(
            layer,
            (x, y),
            &self.spec.text,
            self.spec.font_size,
            self.spec.color,
            self.alpha,
        );
    }

    /// Text centered in a padded square buffer, rotated with expansion.
    fn rotated_stamp(&self) -> RgbaImage {
        let (tw, th) = (self.bounds.width(), self.bounds.height());
        let side = tw.max(th) + ROTATION_MARGIN;
        let mut scratch = RgbaImage::new(side, side);
        let origin = (
            i64::from((side - tw) / 2) - self.bounds.left,
            i64::from((side - th) / 2) - self.bounds.top,
        );
        self.draw_direct(&mut scratch, origin.0, origin.1);
        rotate_expand(&scratch, self.angle)
    }
}

impl<'a> TextCompositor<'a> {
    /// Create a compositor drawing with `font`.
    #[must_use]
    pub fn new(font: &'a FontHandle) -> Self {
        Self { font }
    }

    /// Composite `spec` onto a copy of `canvas`.
    ///
    /// Whitespace-only text returns the canvas unchanged. The output always
    /// has the canvas' dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the font size is zero.
    pub fn render(
        &self,
        canvas: &RgbImage,
        spec: &TextSpec,
        params: &PlacementParams,
    ) -> Result<RgbImage> {
        if spec.text.trim().is_empty() {
            return Ok(canvas.clone());
        }
        if spec.font_size == 0 {
            return Err(Error::InvalidParameter(
                "font size must be greater than zero".to_string(),
            ));
        }

        let pen = Pen {
            font: self.font,
            spec,
            bounds: self.font.measure(&spec.text, spec.font_size),
            alpha: text_alpha(params.opacity),
            angle: params.angle,
        };
        tracing::debug!(
            text = %spec.text,
            width = pen.bounds.width(),
            height = pen.bounds.height(),
            alpha = pen.alpha,
            repeat = params.repeat,
            "rendering text watermark"
        );

        let mut layer = RgbaImage::new(canvas.width(), canvas.height());
        if params.repeat {
            Self::draw_tiled(&pen, &mut layer, params);
        } else {
            Self::draw_single(&pen, &mut layer, params);
        }

        Ok(alpha_composite(canvas, &layer))
    }

    fn draw_single(pen: &Pen<'_>, layer: &mut RgbaImage, params: &PlacementParams) {
        let (x, y) = (params.position.x, params.position.y);
        if pen.angle == 0.0 {
            pen.draw_direct(layer, i64::from(x), i64::from(y));
            return;
        }

        let stamp = pen.rotated_stamp();
        let (px, py) = single_stamp_origin((x, y), stamp.dimensions(), layer.dimensions());
        paste(layer, &stamp, i64::from(px), i64::from(py));
    }

    fn draw_tiled(pen: &Pen<'_>, layer: &mut RgbaImage, params: &PlacementParams) {
        let grid = TileGrid::new(
            layer.dimensions(),
            (pen.bounds.width(), pen.bounds.height()),
            (params.spacing.x, params.spacing.y),
        );

        // Every tile is identical, so the rotated stamp is built once.
        let stamp = (pen.angle != 0.0).then(|| pen.rotated_stamp());

        let mut drawn = 0usize;
        for (x, y) in grid.anchors() {
            match &stamp {
                Some(stamp) => {
                    let half_w = i64::from(stamp.width() / 2);
                    let half_h = i64::from(stamp.height() / 2);
                    paste(layer, stamp, x - half_w, y - half_h);
                }
                None => pen.draw_direct(layer, x, y),
            }
            drawn += 1;
        }

        tracing::debug!(
            rows = grid.rows,
            cols = grid.cols,
            step_x = grid.step_x,
            step_y = grid.step_y,
            candidates = grid.candidate_count(),
            drawn,
            "tiled text watermark"
        );
    }
}
