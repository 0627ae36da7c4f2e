//! Watermark color parsing.
//!
//! Colors reach the dispatcher either as strings (`#RRGGBB`, `#RGB`, bare
//! `RRGGBB`, `rgb(r, g, b)`) or as a literal integer triple. Parsing is total:
//! it yields a typed [`Rgb`] or a [`ColorParseError`], and
//! [`resolve_color`] turns any failure into [`NEUTRAL_GRAY`].

use image::Rgb;

/// Fallback color used when a caller-supplied color cannot be parsed.
pub const NEUTRAL_GRAY: Rgb<u8> = Rgb([128, 128, 128]);

/// A color as supplied by a caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorValue {
    /// A textual color: hex with or without `#`, or `rgb(...)` notation.
    Text(String),
    /// A literal triple. Components are clamped to `0..=255`.
    Triple([i64; 3]),
}

impl Default for ColorValue {
    fn default() -> Self {
        Self::Triple([255, 255, 255])
    }
}

impl From<&str> for ColorValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<[u8; 3]> for ColorValue {
    fn from(c: [u8; 3]) -> Self {
        Self::Triple(c.map(i64::from))
    }
}

/// Reasons a color value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    /// Hex notation with a digit count other than 3 or 6.
    #[error("hex color must have 3 or 6 digits, got {0}")]
    HexLength(usize),
    /// A character that is not a hex digit.
    #[error("invalid hex digit in {0:?}")]
    HexDigit(String),
    /// `rgb(...)` notation with fewer than three numeric components.
    #[error("rgb color needs three numeric components: {0:?}")]
    RgbComponents(String),
    /// Input that matches no known notation.
    #[error("unrecognized color format: {0:?}")]
    Unrecognized(String),
}

/// Parse a caller-supplied color into an RGB triple.
///
/// # Errors
///
/// Returns a [`ColorParseError`] describing why the value is not a color.
pub fn parse_color(value: &ColorValue) -> Result<Rgb<u8>, ColorParseError> {
    match value {
        ColorValue::Triple(c) => Ok(Rgb(c.map(clamp_component))),
        ColorValue::Text(s) => parse_color_str(s),
    }
}

/// Parse a color, substituting [`NEUTRAL_GRAY`] when the value is unusable.
///
/// Returns the color and whether the fallback was taken.
#[must_use]
pub fn resolve_color(value: &ColorValue) -> (Rgb<u8>, bool) {
    match parse_color(value) {
        Ok(color) => (color, false),
        Err(e) => {
            tracing::warn!(error = %e, "color not understood, using neutral gray");
            (NEUTRAL_GRAY, true)
        }
    }
}

fn parse_color_str(s: &str) -> Result<Rgb<u8>, ColorParseError> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    if s.to_ascii_lowercase().starts_with("rgb") {
        return parse_rgb_function(s);
    }
    // Bare hex is only accepted in its long form.
    if s.len() == 6 {
        return parse_hex(s);
    }
    Err(ColorParseError::Unrecognized(s.to_string()))
}

fn parse_hex(hex: &str) -> Result<Rgb<u8>, ColorParseError> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorParseError::HexDigit(hex.to_string()));
    }
    let digit = |i: usize, n: usize| {
        u8::from_str_radix(&hex[i..i + n], 16)
            .map_err(|_| ColorParseError::HexDigit(hex.to_string()))
    };
    match hex.len() {
        // #RGB: each digit doubled, 0xA -> 0xAA
        3 => Ok(Rgb([digit(0, 1)? * 17, digit(1, 1)? * 17, digit(2, 1)? * 17])),
        6 => Ok(Rgb([digit(0, 2)?, digit(2, 2)?, digit(4, 2)?])),
        n => Err(ColorParseError::HexLength(n)),
    }
}

fn parse_rgb_function(s: &str) -> Result<Rgb<u8>, ColorParseError> {
    let inner = s
        .find('(')
        .zip(s.rfind(')'))
        .filter(|(open, close)| open < close)
        .map(|(open, close)| &s[open + 1..close])
        .ok_or_else(|| ColorParseError::RgbComponents(s.to_string()))?;

    let components: Vec<f64> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|c| !c.is_empty())
        .filter_map(|c| c.parse::<f64>().ok())
        .filter(|c| c.is_finite())
        .collect();

    match components.as_slice() {
        [r, g, b, ..] => Ok(Rgb([*r, *g, *b].map(|c| {
            #[allow(clippy::cast_possible_truncation)]
            clamp_component(c.round() as i64)
        }))),
        _ => Err(ColorParseError::RgbComponents(s.to_string())),
    }
}

fn clamp_component(c: i64) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        c.clamp(0, 255) as u8
    }
}
