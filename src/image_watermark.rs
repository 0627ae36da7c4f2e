//! Image watermark compositing.
//!
//! The watermark is resized to a fraction of the canvas width (aspect ratio
//! kept), optionally rotated in place, clipped to the canvas and mixed into
//! the covered region with a uniform weight.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::blending::weighted_blend;
use crate::error::{Error, Result};
use crate::geometry::{fit_region, rotate_about_center};
use crate::params::PlacementParams;

/// The watermark raster to overlay.
#[derive(Debug, Clone, Copy)]
pub struct ImageSpec<'a> {
    /// Watermark source image.
    pub source: &'a RgbImage,
}

/// Largest watermark side accepted, as a multiple of the canvas' longer side.
pub const MAX_OVERSIZE: u32 = 4;

/// Size of a watermark of `source` dimensions scaled to `scale` times the
/// canvas width, keeping the source aspect ratio.
///
/// # Errors
///
/// Returns [`Error::DegenerateGeometry`] if either side would be zero, and
/// [`Error::InvalidParameter`] if either side would exceed
/// [`MAX_OVERSIZE`] times the canvas' longer side.
pub fn fitted_size(canvas: (u32, u32), source: (u32, u32), scale: f32) -> Result<(u32, u32)> {
    let (src_w, src_h) = source;
    // Drop f32 representation noise so 0.7 of 1000 px is 700, not 699.
    let scale = (f64::from(scale) * 1e6).round() / 1e6;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let width = (f64::from(canvas.0) * scale).max(0.0) as u32;
    let height = if src_w == 0 {
        0
    } else {
        u32::try_from(u64::from(src_h) * u64::from(width) / u64::from(src_w)).unwrap_or(u32::MAX)
    };

    if width == 0 || height == 0 {
        return Err(Error::DegenerateGeometry { width, height });
    }
    let limit = u64::from(canvas.0.max(canvas.1)) * u64::from(MAX_OVERSIZE);
    if u64::from(width) > limit || u64::from(height) > limit {
        return Err(Error::InvalidParameter(format!(
            "watermark of {width}x{height} is too large for a {}x{} image",
            canvas.0, canvas.1
        )));
    }
    Ok((width, height))
}

/// Overlays image watermarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompositor;

impl ImageCompositor {
    /// Create a compositor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Blend `spec` onto a copy of `canvas`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateGeometry`] when the canvas, the source or
    /// the scaled watermark has zero area.
    pub fn render(
        &self,
        canvas: &RgbImage,
        spec: &ImageSpec<'_>,
        params: &PlacementParams,
    ) -> Result<RgbImage> {
        let (canvas_w, canvas_h) = canvas.dimensions();
        if canvas_w == 0 || canvas_h == 0 {
            return Err(Error::DegenerateGeometry {
                width: canvas_w,
                height: canvas_h,
            });
        }

        let (width, height) =
            fitted_size((canvas_w, canvas_h), spec.source.dimensions(), params.scale)?;
        tracing::debug!(
            source_width = spec.source.width(),
            source_height = spec.source.height(),
            width,
            height,
            "resizing image watermark"
        );

        let mut watermark = imageops::resize(spec.source, width, height, FilterType::Triangle);
        if params.angle != 0.0 {
            watermark = rotate_about_center(&watermark, params.angle);
        }

        let region = fit_region(
            (params.position.x, params.position.y),
            (width, height),
            (canvas_w, canvas_h),
        );
        if (region.width, region.height) != watermark.dimensions() {
            watermark =
                imageops::crop_imm(&watermark, 0, 0, region.width, region.height).to_image();
        }

        let mut out = canvas.clone();
        weighted_blend(&mut out, &watermark, region, params.opacity);
        Ok(out)
    }
}
