//! Placement parameters and their normalization.
//!
//! [`RawParams`] carries whatever the caller supplied. [`RawParams::normalize`]
//! clamps every field into its valid range for a given canvas and reports which
//! fields were adjusted, producing the [`PlacementParams`] the compositors use.

/// Valid opacity range.
pub const OPACITY_RANGE: (f32, f32) = (0.0, 1.0);
/// Valid rotation range in degrees.
pub const ANGLE_RANGE: (f32, f32) = (-180.0, 180.0);
/// Valid image-watermark scale range, relative to canvas width.
pub const SCALE_RANGE: (f32, f32) = (0.01, 2.0);
/// Valid horizontal tile spacing in pixels.
pub const SPACING_X_RANGE: (u32, u32) = (50, 500);
/// Valid vertical tile spacing in pixels.
pub const SPACING_Y_RANGE: (u32, u32) = (50, 300);
/// Valid font size in pixels.
pub const FONT_SIZE_RANGE: (u32, u32) = (1, 500);

/// Top-left anchor of a watermark on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Horizontal offset in pixels.
    pub x: u32,
    /// Vertical offset in pixels.
    pub y: u32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Distance between tile anchors in repeat mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spacing {
    /// Horizontal distance in pixels.
    pub x: u32,
    /// Vertical distance in pixels.
    pub y: u32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self { x: 200, y: 100 }
    }
}

/// Normalized placement parameters shared by both compositors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    /// Top-left anchor, inside the canvas.
    pub position: Position,
    /// Watermark opacity in `[0, 1]`.
    pub opacity: f32,
    /// Counter-clockwise rotation in degrees, `[-180, 180]`.
    pub angle: f32,
    /// Image watermark width as a fraction of canvas width, `[0.01, 2.0]`.
    pub scale: f32,
    /// Tile the text watermark over the whole canvas.
    pub repeat: bool,
    /// Tile spacing for repeat mode.
    pub spacing: Spacing,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            position: Position::new(50, 50),
            opacity: 0.7,
            angle: 0.0,
            scale: 0.2,
            repeat: false,
            spacing: Spacing::default(),
        }
    }
}

/// Caller-supplied parameters before clamping.
///
/// Numeric fields are `f64` so that any slider or flag value can be passed
/// through unchanged; fractional pixel values are truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct RawParams {
    /// Requested horizontal anchor.
    pub position_x: f64,
    /// Requested vertical anchor.
    pub position_y: f64,
    /// Requested opacity.
    pub opacity: f64,
    /// Requested rotation in degrees.
    pub angle: f64,
    /// Requested image scale.
    pub scale: f64,
    /// Requested repeat mode.
    pub repeat: bool,
    /// Requested horizontal tile spacing.
    pub spacing_x: f64,
    /// Requested vertical tile spacing.
    pub spacing_y: f64,
    /// Requested font size.
    pub font_size: f64,
}

impl Default for RawParams {
    fn default() -> Self {
        let p = PlacementParams::default();
        Self {
            position_x: f64::from(p.position.x),
            position_y: f64::from(p.position.y),
            opacity: f64::from(p.opacity),
            angle: f64::from(p.angle),
            scale: f64::from(p.scale),
            repeat: p.repeat,
            spacing_x: f64::from(p.spacing.x),
            spacing_y: f64::from(p.spacing.y),
            font_size: 50.0,
        }
    }
}

/// Result of [`RawParams::normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Clamped placement parameters.
    pub params: PlacementParams,
    /// Clamped font size.
    pub font_size: u32,
    /// Names of the fields that had to be adjusted.
    pub clamped: Vec<&'static str>,
}

impl RawParams {
    /// Clamp every field into its valid range for a canvas of the given size.
    ///
    /// Never fails: out-of-range and non-finite values are pulled to the nearest
    /// bound (non-finite values to the lower bound).
    #[must_use]
    pub fn normalize(&self, canvas_width: u32, canvas_height: u32) -> Normalized {
        let mut clamped = Vec::new();

        let mut int = |name: &'static str, v: f64, lo: u32, hi: u32| -> u32 {
            let out = clamp_u32(v, lo, hi);
            if !v.is_finite() || v.trunc() != f64::from(out) {
                clamped.push(name);
            }
            out
        };

        let x = int("position_x", self.position_x, 0, canvas_width.saturating_sub(1));
        let y = int("position_y", self.position_y, 0, canvas_height.saturating_sub(1));
        let spacing_x = int("spacing_x", self.spacing_x, SPACING_X_RANGE.0, SPACING_X_RANGE.1);
        let spacing_y = int("spacing_y", self.spacing_y, SPACING_Y_RANGE.0, SPACING_Y_RANGE.1);
        let font_size = int("font_size", self.font_size, FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1);

        let mut float = |name: &'static str, v: f64, (lo, hi): (f32, f32)| -> f32 {
            let out = clamp_f32(v, lo, hi);
            if !v.is_finite() || (v - f64::from(out)).abs() > 1e-6 {
                clamped.push(name);
            }
            out
        };

        let opacity = float("opacity", self.opacity, OPACITY_RANGE);
        let angle = float("angle", self.angle, ANGLE_RANGE);
        let scale = float("scale", self.scale, SCALE_RANGE);

        if !clamped.is_empty() {
            tracing::warn!(fields = ?clamped, "parameters clamped into range");
        }

        Normalized {
            params: PlacementParams {
                position: Position::new(x, y),
                opacity,
                angle,
                scale,
                repeat: self.repeat,
                spacing: Spacing {
                    x: spacing_x,
                    y: spacing_y,
                },
            },
            font_size,
            clamped,
        }
    }
}

fn clamp_u32(v: f64, lo: u32, hi: u32) -> u32 {
    if !v.is_finite() {
        return lo;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        v.trunc().clamp(f64::from(lo), f64::from(hi)) as u32
    }
}

fn clamp_f32(v: f64, lo: f32, hi: f32) -> f32 {
    if !v.is_finite() {
        return lo;
    }
    #[allow(clippy::cast_possible_truncation)]
    {
        v.clamp(f64::from(lo), f64::from(hi)) as f32
    }
}
