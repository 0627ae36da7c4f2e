//! Fonts for text watermarks.
//!
//! A [`FontHandle`] is either an outline font loaded through `ab_glyph` or a
//! small built-in 5x7 bitmap face that is always available. Which one is used
//! is decided by a [`FontResolver`] supplied by the host; the compositors
//! only measure and draw through the handle.

use std::fmt;
use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontArc, Glyph, PxScale, ScaleFont};
use image::{Rgb, RgbaImage};

use crate::blending::deposit;
use crate::error::{Error, Result};

/// Font locations probed by [`SystemFontResolver`] after the caller's hints.
///
/// CJK-capable faces come first so that mixed-script watermarks render.
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Light.ttc",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "/Library/Fonts/Arial Unicode MS.ttf",
    "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "C:/Windows/Fonts/msyh.ttc",
    "C:/Windows/Fonts/simhei.ttf",
    "C:/Windows/Fonts/simsun.ttc",
    "/System/Library/Fonts/Helvetica.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "C:/Windows/Fonts/arial.ttf",
];

/// Tight ink box of a piece of text, relative to the point it is drawn at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBounds {
    /// Leftmost inked column.
    pub left: i64,
    /// Topmost inked row.
    pub top: i64,
    /// One past the rightmost inked column.
    pub right: i64,
    /// One past the bottommost inked row.
    pub bottom: i64,
}

impl TextBounds {
    /// Width of the ink box.
    #[must_use]
    pub fn width(&self) -> u32 {
        u32::try_from(self.right - self.left).unwrap_or(0)
    }

    /// Height of the ink box.
    #[must_use]
    pub fn height(&self) -> u32 {
        u32::try_from(self.bottom - self.top).unwrap_or(0)
    }

    fn union(self, other: Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// A loaded font that can measure and draw single-line text.
#[derive(Clone, Default)]
pub enum FontHandle {
    /// A TrueType/OpenType outline font.
    Outline(FontArc),
    /// The built-in bitmap face.
    #[default]
    Builtin,
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outline(font) => f
                .debug_struct("Outline")
                .field("glyphs", &font.glyph_count())
                .finish(),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

impl FontHandle {
    /// Load an outline font from a file. Collections (`.ttc`) use their
    /// first face.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FontLoad`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::FontLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(data, path)
    }

    /// Load an outline font from raw font data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FontLoad`] if the data is not a font.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::parse(data, Path::new("<memory>"))
    }

    fn parse(data: Vec<u8>, path: &Path) -> Result<Self> {
        FontArc::try_from_vec(data)
            .map(Self::Outline)
            .map_err(|e| Error::FontLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Whether this is the built-in bitmap face.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    /// Measure the ink box of `text` drawn at pixel size `size`.
    ///
    /// Text without any visible ink reports its advance box instead, so the
    /// result is never empty for non-empty input.
    #[must_use]
    pub fn measure(&self, text: &str, size: u32) -> TextBounds {
        match self {
            Self::Outline(font) => measure_outline(font, text, size),
            Self::Builtin => measure_builtin(text, size),
        }
    }

    /// Draw `text` onto `layer` with its origin at `origin`, in `color` at
    /// strength `alpha`.
    ///
    /// Ink lands at `origin` offset by [`measure`](Self::measure)'s bounds.
    /// Pixels outside the layer are skipped.
    pub fn draw(
        &self,
        layer: &mut RgbaImage,
        origin: (i64, i64),
        text: &str,
        size: u32,
        color: Rgb<u8>,
        alpha: u8,
    ) {
        match self {
            Self::Outline(font) => draw_outline(font, layer, origin, text, size, color, alpha),
            Self::Builtin => draw_builtin(layer, origin, text, size, color, alpha),
        }
    }
}

/// Supplies the font used for text watermarks.
pub trait FontResolver {
    /// Load a font, preferring `hinted_paths` in order.
    ///
    /// Never fails: resolvers fall back to [`FontHandle::Builtin`].
    fn load_font(&self, hinted_paths: &[PathBuf]) -> FontHandle;
}

/// Resolver that probes the file system for an outline font.
#[derive(Debug, Clone, Copy)]
pub struct SystemFontResolver {
    /// Also probe [`DEFAULT_FONT_PATHS`] after the hints.
    pub include_defaults: bool,
}

impl Default for SystemFontResolver {
    fn default() -> Self {
        Self {
            include_defaults: true,
        }
    }
}

impl FontResolver for SystemFontResolver {
    fn load_font(&self, hinted_paths: &[PathBuf]) -> FontHandle {
        let defaults = DEFAULT_FONT_PATHS
            .iter()
            .map(PathBuf::from)
            .filter(|_| self.include_defaults);

        for path in hinted_paths.iter().cloned().chain(defaults) {
            if !path.exists() {
                continue;
            }
            match FontHandle::from_file(&path) {
                Ok(font) => {
                    tracing::info!(path = %path.display(), "using font");
                    return font;
                }
                Err(e) => tracing::warn!(error = %e, "skipping font"),
            }
        }

        tracing::warn!("no usable font found, using built-in bitmap font");
        FontHandle::Builtin
    }
}

/// Resolver that always returns the built-in bitmap face.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFontResolver;

impl FontResolver for BuiltinFontResolver {
    fn load_font(&self, _hinted_paths: &[PathBuf]) -> FontHandle {
        FontHandle::Builtin
    }
}

// ---------------------------------------------------------------------------
// Outline fonts

fn layout_outline(font: &FontArc, text: &str, size: u32) -> (Vec<Glyph>, f32) {
    #[allow(clippy::cast_precision_loss)]
    let scale = PxScale::from(size as f32);
    let scaled = font.as_scaled(scale);

    let mut glyphs = Vec::with_capacity(text.len());
    let mut caret = 0.0f32;
    let mut prev: Option<ab_glyph::GlyphId> = None;

    for c in text.chars().filter(|c| !c.is_control()) {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            caret += scaled.kern(prev, id);
        }
        glyphs.push(id.with_scale_and_position(scale, point(caret, scaled.ascent())));
        caret += scaled.h_advance(id);
        prev = Some(id);
    }

    (glyphs, caret)
}

#[allow(clippy::cast_possible_truncation)]
fn measure_outline(font: &FontArc, text: &str, size: u32) -> TextBounds {
    let (glyphs, advance) = layout_outline(font, text, size);

    let ink = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .map(|outlined| {
            let b = outlined.px_bounds();
            TextBounds {
                left: b.min.x.floor() as i64,
                top: b.min.y.floor() as i64,
                right: b.max.x.ceil() as i64,
                bottom: b.max.y.ceil() as i64,
            }
        })
        .reduce(TextBounds::union);

    ink.unwrap_or_else(|| {
        #[allow(clippy::cast_precision_loss)]
        let height = font.as_scaled(PxScale::from(size as f32)).height();
        TextBounds {
            left: 0,
            top: 0,
            right: advance.ceil() as i64,
            bottom: height.ceil() as i64,
        }
    })
}

fn draw_outline(
    font: &FontArc,
    layer: &mut RgbaImage,
    origin: (i64, i64),
    text: &str,
    size: u32,
    color: Rgb<u8>,
    alpha: u8,
) {
    let (lw, lh) = (i64::from(layer.width()), i64::from(layer.height()));
    let (glyphs, _) = layout_outline(font, text, size);

    for outlined in glyphs.into_iter().filter_map(|g| font.outline_glyph(g)) {
        let bounds = outlined.px_bounds();
        #[allow(clippy::cast_possible_truncation)]
        let (bx, by) = (
            origin.0 + bounds.min.x.floor() as i64,
            origin.1 + bounds.min.y.floor() as i64,
        );
        outlined.draw(|px, py, coverage| {
            let x = bx + i64::from(px);
            let y = by + i64::from(py);
            if x < 0 || y < 0 || x >= lw || y >= lh {
                return;
            }
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let dst = layer.get_pixel_mut(x as u32, y as u32);
            deposit(dst, color, f32::from(alpha) * coverage.clamp(0.0, 1.0));
        });
    }
}

// ---------------------------------------------------------------------------
// Built-in bitmap font

const CELL_W: i64 = 5;
const CELL_H: i64 = 7;
/// Horizontal advance in cells, including one blank column.
const ADVANCE: i64 = 6;

/// Rows of each printable ASCII glyph, top to bottom; bit 4 is the left column.
#[rustfmt::skip]
const GLYPHS: [[u8; 7]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04], // !
    [0x0A, 0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00], // "
    [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A], // #
    [0x04, 0x0F, 0x14, 0x0E, 0x05, 0x1E, 0x04], // $
    [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03], // %
    [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D], // &
    [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00], // '
    [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02], // (
    [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08], // )
    [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00], // *
    [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00], // +
    [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08], // ,
    [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C], // .
    [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00], // /
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // 2
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00], // :
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08], // ;
    [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02], // <
    [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00], // =
    [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08], // >
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04], // ?
    [0x0E, 0x11, 0x01, 0x0D, 0x15, 0x15, 0x0E], // @
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
    [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E], // [
    [0x00, 0x10, 0x08, 0x04, 0x02, 0x01, 0x00], // backslash
    [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E], // ]
    [0x04, 0x0A, 0x11, 0x00, 0x00, 0x00, 0x00], // ^
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F], // _
    [0x08, 0x04, 0x02, 0x00, 0x00, 0x00, 0x00], // `
    [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F], // a
    [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x1E], // b
    [0x00, 0x00, 0x0E, 0x10, 0x10, 0x11, 0x0E], // c
    [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x0F], // d
    [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E], // e
    [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08], // f
    [0x00, 0x0F, 0x11, 0x11, 0x0F, 0x01, 0x0E], // g
    [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x11], // h
    [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E], // i
    [0x02, 0x00, 0x06, 0x02, 0x02, 0x12, 0x0C], // j
    [0x10, 0x10, 0x12, 0x14, 0x18, 0x14, 0x12], // k
    [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // l
    [0x00, 0x00, 0x1A, 0x15, 0x15, 0x11, 0x11], // m
    [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11], // n
    [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E], // o
    [0x00, 0x00, 0x1E, 0x11, 0x1E, 0x10, 0x10], // p
    [0x00, 0x00, 0x0D, 0x13, 0x0F, 0x01, 0x01], // q
    [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10], // r
    [0x00, 0x00, 0x0E, 0x10, 0x0E, 0x01, 0x1E], // s
    [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06], // t
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x13, 0x0D], // u
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x0A, 0x04], // v
    [0x00, 0x00, 0x11, 0x11, 0x15, 0x15, 0x0A], // w
    [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11], // x
    [0x00, 0x00, 0x11, 0x11, 0x0F, 0x01, 0x0E], // y
    [0x00, 0x00, 0x1F, 0x02, 0x04, 0x08, 0x1F], // z
    [0x02, 0x04, 0x04, 0x08, 0x04, 0x04, 0x02], // {
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // |
    [0x08, 0x04, 0x04, 0x02, 0x04, 0x04, 0x08], // }
    [0x00, 0x00, 0x08, 0x15, 0x02, 0x00, 0x00], // ~
];

/// Drawn for characters outside printable ASCII.
const MISSING_GLYPH: [u8; 7] = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

fn builtin_glyph(c: char) -> &'static [u8; 7] {
    match c {
        ' '..='~' => &GLYPHS[c as usize - ' ' as usize],
        _ => &MISSING_GLYPH,
    }
}

/// Integer pixel scale of the bitmap face for a requested font size.
fn builtin_scale(size: u32) -> i64 {
    i64::from((size.saturating_add(4) / 8).max(1))
}

/// Inked (cell column, cell row) pairs of `text`, with each glyph's column
/// offset already applied.
fn builtin_cells(text: &str) -> impl Iterator<Item = (i64, i64)> + '_ {
    text.chars()
        .filter(|c| !c.is_control())
        .zip(0i64..)
        .flat_map(|(c, index)| {
            let rows = builtin_glyph(c);
            (0..CELL_H).flat_map(move |row| {
                (0..CELL_W)
                    .filter(move |col| rows[row as usize] & (0x10u8 >> col) != 0)
                    .map(move |col| (index * ADVANCE + col, row))
            })
        })
}

fn measure_builtin(text: &str, size: u32) -> TextBounds {
    let k = builtin_scale(size);
    let ink = builtin_cells(text)
        .map(|(col, row)| TextBounds {
            left: col * k,
            top: row * k,
            right: (col + 1) * k,
            bottom: (row + 1) * k,
        })
        .reduce(TextBounds::union);

    ink.unwrap_or_else(|| {
        let chars = text.chars().filter(|c| !c.is_control()).count();
        let chars = i64::try_from(chars).unwrap_or(i64::MAX / ADVANCE / k);
        TextBounds {
            left: 0,
            top: 0,
            right: chars * ADVANCE * k,
            bottom: CELL_H * k,
        }
    })
}

fn draw_builtin(
    layer: &mut RgbaImage,
    origin: (i64, i64),
    text: &str,
    size: u32,
    color: Rgb<u8>,
    alpha: u8,
) {
    let k = builtin_scale(size);
    let (lw, lh) = (i64::from(layer.width()), i64::from(layer.height()));

    for (col, row) in builtin_cells(text) {
        let x0 = origin.0 + col * k;
        let y0 = origin.1 + row * k;
        for y in y0.max(0)..(y0 + k).min(lh) {
            for x in x0.max(0)..(x0 + k).min(lw) {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                let dst = layer.get_pixel_mut(x as u32, y as u32);
                deposit(dst, color, f32::from(alpha));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_scale_follows_font_size() {
        assert_eq!(builtin_scale(1), 1);
        assert_eq!(builtin_scale(12), 2);
        assert_eq!(builtin_scale(40), 5);
        assert_eq!(builtin_scale(500), 63);
    }

    #[test]
    fn builtin_measure_is_tight() {
        let font = FontHandle::Builtin;
        let b = font.measure("WATERMARK", 40);
        assert_eq!(b, TextBounds { left: 0, top: 0, right: 265, bottom: 35 });
        assert_eq!((b.width(), b.height()), (265, 35));

        // '.' only inks the bottom-middle of its cell.
        let dot = font.measure(".", 8);
        assert_eq!(dot, TextBounds { left: 1, top: 5, right: 3, bottom: 7 });
    }

    #[test]
    fn larger_sizes_measure_larger() {
        let font = FontHandle::Builtin;
        let small = font.measure("Hello", 12);
        let large = font.measure("Hello", 48);
        assert!(large.width() > small.width());
        assert!(large.height() > small.height());
    }

    #[test]
    fn non_ascii_characters_draw_a_box() {
        let font = FontHandle::Builtin;
        let b = font.measure("版权", 8);
        assert_eq!((b.width(), b.height()), (11, 7));
    }

    #[test]
    fn builtin_draw_stays_within_measured_bounds() {
        let font = FontHandle::Builtin;
        let mut layer = RgbaImage::new(200, 60);
        let origin = (10, 20);
        let b = font.measure("Hi!", 16);
        font.draw(&mut layer, origin, "Hi!", 16, Rgb([255, 255, 255]), 90);

        let mut inked = 0;
        for (x, y, px) in layer.enumerate_pixels() {
            if px[3] == 0 {
                continue;
            }
            inked += 1;
            let (x, y) = (i64::from(x), i64::from(y));
            assert!(x >= origin.0 + b.left && x < origin.0 + b.right);
            assert!(y >= origin.1 + b.top && y < origin.1 + b.bottom);
            assert_eq!(px[3], 90);
        }
        assert!(inked > 0);
    }

    #[test]
    fn builtin_draw_clips_at_layer_edges() {
        let font = FontHandle::Builtin;
        let mut layer = RgbaImage::new(20, 20);
        font.draw(&mut layer, (-30, -5), "WATERMARK", 16, Rgb([1, 2, 3]), 200);
        font.draw(&mut layer, (15, 15), "W", 16, Rgb([1, 2, 3]), 200);
        assert!(layer.pixels().any(|p| p[3] > 0));
    }

    /// An installed outline font, if the machine has one.
    fn system_outline_font() -> Option<FontHandle> {
        let font = SystemFontResolver::default().load_font(&[]);
        if font.is_builtin() {
            eprintln!("no outline font installed, skipping");
            return None;
        }
        Some(font)
    }

    #[test]
    fn outline_draw_stays_within_measured_bounds() {
        let Some(font) = system_outline_font() else {
            return;
        };
        let origin = (60, 60);
        let alpha = 102;

        for text in ["WATERMARK", "gjpqy", "Ål", "版权"] {
            let b = font.measure(text, 40);
            assert!(b.width() > 0 && b.height() > 0, "{text}: empty bounds");

            let mut layer = RgbaImage::new(600, 200);
            font.draw(&mut layer, origin, text, 40, Rgb([255, 0, 0]), alpha);

            for (x, y, px) in layer.enumerate_pixels().filter(|(_, _, p)| p[3] > 0) {
                let (x, y) = (i64::from(x), i64::from(y));
                assert!(
                    x >= origin.0 + b.left && x < origin.0 + b.right,
                    "{text}: x={x} outside {b:?}"
                );
                assert!(
                    y >= origin.1 + b.top && y < origin.1 + b.bottom,
                    "{text}: y={y} outside {b:?}"
                );
                assert!(px[3] <= alpha, "{text}: alpha {}", px[3]);
            }
        }

        let mut layer = RgbaImage::new(600, 200);
        font.draw(&mut layer, origin, "WATERMARK", 40, Rgb([255, 0, 0]), alpha);
        assert_eq!(layer.pixels().map(|p| p[3]).max(), Some(alpha));
    }

    #[test]
    fn invalid_font_data_is_rejected() {
        let err = FontHandle::from_bytes(b"definitely not a font".to_vec()).unwrap_err();
        assert!(matches!(err, Error::FontLoad { .. }));
    }

    #[test]
    fn missing_font_file_is_reported() {
        let err = FontHandle::from_file(Path::new("/no/such/font.ttf")).unwrap_err();
        assert!(err.to_string().contains("font.ttf"));
    }

    #[test]
    fn system_resolver_falls_back_to_builtin() {
        let resolver = SystemFontResolver {
            include_defaults: false,
        };
        let hints = vec![
            PathBuf::from("/no/such/font.ttf"),
            PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml")),
        ];
        assert!(resolver.load_font(&hints).is_builtin());
    }

    #[test]
    fn builtin_resolver_ignores_hints() {
        let hints = vec![PathBuf::from("/usr/share/fonts/whatever.ttf")];
        assert!(BuiltinFontResolver.load_font(&hints).is_builtin());
    }
}
