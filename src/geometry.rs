//! Placement geometry: tile grids, anchor clamping and rotation.
//!
//! Angles are in degrees and rotate counter-clockwise, matching the usual
//! photo-editor convention. Two rotations are provided: [`rotate_expand`]
//! grows its output so no content is lost (text stamps), while
//! [`rotate_about_center`] keeps the input size and lets corners clip
//! (image watermarks).

use image::{Rgb, RgbImage, Rgba, RgbaImage};

/// Extra space, in pixels, required between adjacent text tiles.
pub const TILE_GAP: u32 = 20;

/// Margin added around text in the scratch buffer used for rotation.
pub const ROTATION_MARGIN: u32 = 100;

/// An axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Layout of repeated text tiles over a canvas.
///
/// Anchors sit on a `step_x` × `step_y` grid; odd rows are shifted right by
/// half a step to form a brick pattern. Two extra rows and columns are laid
/// out so that the staggered rows still reach the right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    /// Effective horizontal anchor distance.
    pub step_x: u32,
    /// Effective vertical anchor distance.
    pub step_y: u32,
    /// Number of columns laid out.
    pub cols: u32,
    /// Number of rows laid out.
    pub rows: u32,
    canvas: (u32, u32),
    tile: (u32, u32),
}

impl TileGrid {
    /// Lay out tiles of `tile` size over `canvas`, widening the requested
    /// spacing where the tile itself would not fit between anchors.
    #[must_use]
    pub fn new(canvas: (u32, u32), tile: (u32, u32), spacing: (u32, u32)) -> Self {
        let step_x = spacing.0.max(tile.0 + TILE_GAP).max(1);
        let step_y = spacing.1.max(tile.1 + TILE_GAP).max(1);
        Self {
            step_x,
            step_y,
            cols: canvas.0 / step_x + 2,
            rows: canvas.1 / step_y + 2,
            canvas,
            tile,
        }
    }

    /// Number of grid positions before edge filtering.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Anchors of every tile that can touch the canvas, row by row.
    pub fn anchors(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        let (cw, ch) = (i64::from(self.canvas.0), i64::from(self.canvas.1));
        let (tw, th) = (i64::from(self.tile.0), i64::from(self.tile.1));
        let (sx, sy) = (i64::from(self.step_x), i64::from(self.step_y));

        (0..i64::from(self.rows))
            .flat_map(move |row| (0..i64::from(self.cols)).map(move |col| (row, col)))
            .map(move |(row, col)| {
                let stagger = if row % 2 == 1 { sx / 2 } else { 0 };
                (col * sx + stagger, row * sy)
            })
            .filter(move |&(x, y)| x > -tw && x < cw + tw && y > -th && y < ch + th)
    }
}

/// Clamp `anchor` so that an object of size `extent` starts no later than
/// `limit - extent` and no earlier than 0.
///
/// When the object is larger than `limit` it is pinned to 0.
#[must_use]
pub fn clamp_anchor(anchor: u32, extent: u32, limit: u32) -> u32 {
    anchor.min(limit.saturating_sub(extent))
}

/// Fit an object of `size` anchored at `position` into a canvas.
///
/// The anchor is clamped first; whatever still overhangs the right or bottom
/// edge is cut off, so the returned region may be smaller than `size`.
#[must_use]
pub fn fit_region(position: (u32, u32), size: (u32, u32), canvas: (u32, u32)) -> Region {
    let x = clamp_anchor(position.0, size.0, canvas.0);
    let y = clamp_anchor(position.1, size.1, canvas.1);
    Region {
        x,
        y,
        width: size.0.min(canvas.0 - x),
        height: size.1.min(canvas.1 - y),
    }
}

/// Bounding size of a `width` × `height` rectangle rotated by `degrees`.
#[must_use]
pub fn expanded_size(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let (sin, cos) = f64::from(degrees).to_radians().sin_cos();
    let (w, h) = (f64::from(width), f64::from(height));
    // Snap away float noise so 90/180 degree turns don't grow by a pixel.
    let snap = |v: f64| (v * 1e6).round() / 1e6;
    let new_w = snap(w * cos.abs() + h * sin.abs()).ceil();
    let new_h = snap(w * sin.abs() + h * cos.abs()).ceil();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (new_w as u32, new_h as u32)
    }
}

/// Rotate an RGBA image counter-clockwise, enlarging the output to hold
/// every source pixel.
///
/// Uses nearest-neighbour sampling, so no alpha value is created that the
/// source did not contain. Uncovered output pixels are fully transparent.
#[must_use]
pub fn rotate_expand(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let (dst_w, dst_h) = expanded_size(image.width(), image.height(), degrees);
    let mut rotated = RgbaImage::new(dst_w.max(1), dst_h.max(1));

    let (sin, cos) = f64::from(degrees).to_radians().sin_cos();
    let src_cx = f64::from(image.width()) / 2.0;
    let src_cy = f64::from(image.height()) / 2.0;
    let dst_cx = f64::from(rotated.width()) / 2.0;
    let dst_cy = f64::from(rotated.height()) / 2.0;
    let (src_w, src_h) = (i64::from(image.width()), i64::from(image.height()));

    for (dx, dy, px) in rotated.enumerate_pixels_mut() {
        // Inverse mapping with y pointing down: undo a counter-clockwise turn.
        let rx = f64::from(dx) + 0.5 - dst_cx;
        let ry = f64::from(dy) + 0.5 - dst_cy;
        let sx = rx * cos - ry * sin + src_cx;
        let sy = rx * sin + ry * cos + src_cy;

        #[allow(clippy::cast_possible_truncation)]
        let (ix, iy) = (sx.floor() as i64, sy.floor() as i64);
        if (0..src_w).contains(&ix) && (0..src_h).contains(&iy) {
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            {
                *px = *image.get_pixel(ix as u32, iy as u32);
            }
        } else {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    rotated
}

/// Rotate an RGB image counter-clockwise about its own center, keeping the
/// original dimensions.
///
/// Content rotated past the edges is lost and uncovered corners are filled
/// with black. Sampling is bilinear.
#[must_use]
pub fn rotate_about_center(image: &RgbImage, degrees: f32) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut rotated = RgbImage::new(w, h);
    let (sin, cos) = f64::from(degrees).to_radians().sin_cos();
    let cx = f64::from(w / 2);
    let cy = f64::from(h / 2);
    let (max_x, max_y) = (f64::from(w) - 1.0, f64::from(h) - 1.0);

    for (dx, dy, px) in rotated.enumerate_pixels_mut() {
        let rx = f64::from(dx) - cx;
        let ry = f64::from(dy) - cy;
        let sx = rx * cos - ry * sin + cx;
        let sy = rx * sin + ry * cos + cy;

        if sx < 0.0 || sy < 0.0 || sx > max_x || sy > max_y {
            *px = Rgb([0, 0, 0]);
            continue;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x0, y0) = (sx.floor() as u32, sy.floor() as u32);
        let x1 = (x0 + 1).min(w - 1);
        let y1 = (y0 + 1).min(h - 1);
        let fx = sx - f64::from(x0);
        let fy = sy - f64::from(y0);

        let p00 = image.get_pixel(x0, y0);
        let p10 = image.get_pixel(x1, y0);
        let p01 = image.get_pixel(x0, y1);
        let p11 = image.get_pixel(x1, y1);

        let interpolate = |c: usize| -> u8 {
            let v = f64::from(p00[c]) * (1.0 - fx) * (1.0 - fy)
                + f64::from(p10[c]) * fx * (1.0 - fy)
                + f64::from(p01[c]) * (1.0 - fx) * fy
                + f64::from(p11[c]) * fx * fy;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                v.round().clamp(0.0, 255.0) as u8
            }
        };

        *px = Rgb([interpolate(0), interpolate(1), interpolate(2)]);
    }

    rotated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_grid_counts_match_floor_division_plus_two() {
        let grid = TileGrid::new((800, 600), (100, 30), (150, 100));
        assert_eq!((grid.step_x, grid.step_y), (150, 100));
        assert_eq!((grid.cols, grid.rows), (7, 8));
        assert_eq!(grid.candidate_count(), 56);
    }

    #[test]
    fn tile_grid_widens_spacing_for_large_tiles() {
        let grid = TileGrid::new((800, 600), (265, 35), (150, 100));
        assert_eq!(grid.step_x, 285);
        assert_eq!(grid.step_y, 100);
        assert_eq!(grid.cols, 800 / 285 + 2);
    }

    #[test]
    fn odd_rows_are_staggered_by_half_a_step() {
        let grid = TileGrid::new((400, 300), (40, 20), (100, 80));
        let anchors: Vec<_> = grid.anchors().collect();
        assert!(anchors.contains(&(0, 0)));
        assert!(anchors.contains(&(50, 80)));
        assert!(anchors.contains(&(100, 160)));
        assert!(!anchors.contains(&(0, 80)));
    }

    #[test]
    fn anchors_far_outside_are_skipped() {
        let grid = TileGrid::new((400, 300), (40, 20), (100, 80));
        assert!(grid.anchors().count() < grid.candidate_count());
        for (x, y) in grid.anchors() {
            assert!(x < 440 && y < 320, "({x}, {y}) outside extended canvas");
        }
    }

    #[test]
    fn clamp_anchor_keeps_object_inside() {
        assert_eq!(clamp_anchor(10, 50, 100), 10);
        assert_eq!(clamp_anchor(90, 50, 100), 50);
        assert_eq!(clamp_anchor(90, 150, 100), 0);
    }

    #[test]
    fn fit_region_crops_oversized_objects() {
        let r = fit_region((30, 40), (20, 10), (100, 100));
        assert_eq!(r, Region { x: 30, y: 40, width: 20, height: 10 });

        let r = fit_region((99, 99), (20, 10), (100, 100));
        assert_eq!(r, Region { x: 80, y: 90, width: 20, height: 10 });

        let r = fit_region((10, 0), (300, 50), (100, 100));
        assert_eq!(r, Region { x: 0, y: 0, width: 100, height: 50 });
    }

    #[test]
    fn expanded_size_handles_right_angles_exactly() {
        assert_eq!(expanded_size(200, 100, 90.0), (100, 200));
        assert_eq!(expanded_size(200, 100, 180.0), (200, 100));
        assert_eq!(expanded_size(200, 100, -90.0), (100, 200));
    }

    #[test]
    fn expanded_size_grows_for_diagonals() {
        let (w, h) = expanded_size(100, 100, 45.0);
        assert_eq!((w, h), (142, 142));
    }

    #[test]
    fn rotate_expand_preserves_alpha_ceiling() {
        let mut img = RgbaImage::new(60, 20);
        for px in img.pixels_mut() {
            *px = Rgba([255, 0, 0, 102]);
        }
        let rotated = rotate_expand(&img, 30.0);
        assert_eq!(rotated.dimensions(), expanded_size(60, 20, 30.0));
        assert!(rotated.pixels().all(|p| p[3] <= 102));
        assert!(rotated.pixels().any(|p| p[3] == 102));
    }

    #[test]
    fn rotate_expand_quarter_turn_is_counter_clockwise() {
        let mut img = RgbaImage::new(4, 2);
        img.put_pixel(3, 0, Rgba([1, 2, 3, 255]));
        let rotated = rotate_expand(&img, 90.0);
        assert_eq!(rotated.dimensions(), (2, 4));
        // Top-right corner moves to top-left.
        assert_eq!(*rotated.get_pixel(0, 0), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn rotate_about_center_keeps_dimensions_and_blackens_corners() {
        let mut img = RgbImage::new(40, 20);
        for px in img.pixels_mut() {
            *px = Rgb([200, 200, 200]);
        }
        let rotated = rotate_about_center(&img, 45.0);
        assert_eq!(rotated.dimensions(), (40, 20));
        assert_eq!(*rotated.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*rotated.get_pixel(20, 10), Rgb([200, 200, 200]));
    }
}
