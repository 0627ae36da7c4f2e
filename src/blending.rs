//! Pixel blending for watermark compositing.
//!
//! Text watermarks are built up on a transparent RGBA layer with
//! [`deposit`] and [`paste`], then merged onto the photo with
//! [`alpha_composite`]:
//! `result = base * (1 - a) + layer * a`, using each layer pixel's own alpha.
//!
//! Image watermarks use a uniform linear mix instead, see [`weighted_blend`]:
//! `result = roi * (1 - opacity) + watermark * opacity`.

use image::{Rgb, RgbImage, Rgba, RgbaImage};

use crate::geometry::Region;

/// Lay `color` at strength `alpha` (0-255 scale) onto a layer pixel.
///
/// The resulting alpha is the larger of the existing and the deposited
/// alpha, so overlapping strokes and tiles never exceed the strongest alpha
/// drawn. Colors are mixed in proportion to their alpha contribution, which
/// keeps anti-aliased edges on a transparent layer from darkening.
pub fn deposit(px: &mut Rgba<u8>, color: Rgb<u8>, alpha: f32) {
    let src_a = alpha.clamp(0.0, 255.0);
    if src_a <= 0.0 {
        return;
    }

    let dst_a = f32::from(px[3]);
    let w_src = src_a;
    let w_dst = dst_a * (1.0 - src_a / 255.0);
    let total = w_src + w_dst;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    for ch in 0..3 {
        let mixed = (f32::from(color[ch]) * w_src + f32::from(px[ch]) * w_dst) / total;
        px[ch] = mixed.round().clamp(0.0, 255.0) as u8;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        px[3] = dst_a.max(src_a).round() as u8;
    }
}

/// Paste `stamp` onto `layer` with its top-left corner at (`x`, `y`),
/// using the stamp's alpha as the mask.
///
/// The stamp may hang over any edge of the layer; only the overlapping part
/// is written.
pub fn paste(layer: &mut RgbaImage, stamp: &RgbaImage, x: i64, y: i64) {
    let (lw, lh) = (i64::from(layer.width()), i64::from(layer.height()));
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + i64::from(stamp.width())).min(lw);
    let y_end = (y + i64::from(stamp.height())).min(lh);

    for ly in y_start..y_end {
        for lx in x_start..x_end {
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let src = *stamp.get_pixel((lx - x) as u32, (ly - y) as u32);
            if src[3] == 0 {
                continue;
            }
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let dst = layer.get_pixel_mut(lx as u32, ly as u32);
            deposit(dst, Rgb([src[0], src[1], src[2]]), f32::from(src[3]));
        }
    }
}

/// Composite an RGBA layer over an opaque RGB canvas of the same size.
///
/// Returns a new canvas; the input is not modified.
#[must_use]
pub fn alpha_composite(canvas: &RgbImage, layer: &RgbaImage) -> RgbImage {
    debug_assert_eq!(canvas.dimensions(), layer.dimensions());
    let mut out = canvas.clone();

    for (px, top) in out.pixels_mut().zip(layer.pixels()) {
        if top[3] == 0 {
            continue;
        }
        let a = f32::from(top[3]) / 255.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        for ch in 0..3 {
            let v = f32::from(px[ch]) * (1.0 - a) + f32::from(top[ch]) * a;
            px[ch] = v.round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}

/// Blend `watermark` into `canvas` over `region` with a uniform weight.
///
/// `watermark` must have the region's dimensions. Pixels outside the region
/// are untouched.
pub fn weighted_blend(canvas: &mut RgbImage, watermark: &RgbImage, region: Region, opacity: f32) {
    debug_assert_eq!(watermark.dimensions(), (region.width, region.height));
    let opacity = opacity.clamp(0.0, 1.0);

    for (dx, dy, wm) in watermark.enumerate_pixels() {
        let px = canvas.get_pixel_mut(region.x + dx, region.y + dy);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        for ch in 0..3 {
            let v = f32::from(px[ch]) * (1.0 - opacity) + f32::from(wm[ch]) * opacity;
            px[ch] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}
