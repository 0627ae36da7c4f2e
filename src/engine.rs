//! Watermark dispatcher and file helpers.

use std::fmt;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::color::{resolve_color, ColorValue};
use crate::error::{Error, Result};
use crate::font::{FontHandle, FontResolver, SystemFontResolver};
use crate::image_watermark::{ImageCompositor, ImageSpec};
use crate::params::RawParams;
use crate::text_watermark::{TextCompositor, TextSpec};

/// File extensions accepted as input images.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "bmp", "webp"];

/// JPEG quality used when saving.
const JPEG_QUALITY: u8 = 95;

/// Kind of watermark to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkKind {
    /// Render text.
    Text,
    /// Blend a secondary image.
    Image,
}

impl WatermarkKind {
    /// Parse a watermark-type tag (`"text"` or `"image"`, any case).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

/// Everything a caller supplies for one compositing call.
#[derive(Debug, Clone)]
pub struct WatermarkRequest {
    /// Watermark-type tag, see [`WatermarkKind::from_tag`].
    pub kind: String,
    /// Text for text watermarks.
    pub text: String,
    /// Text color, in any notation [`crate::color::parse_color`] accepts.
    pub color: ColorValue,
    /// Source raster for image watermarks.
    pub watermark: Option<RgbImage>,
    /// Unclamped placement parameters.
    pub params: RawParams,
}

impl Default for WatermarkRequest {
    fn default() -> Self {
        Self {
            kind: "text".to_string(),
            text: String::new(),
            color: ColorValue::default(),
            watermark: None,
            params: RawParams::default(),
        }
    }
}

/// Outcome of a compositing call, suitable for showing to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The watermark was applied. `notes` lists any adjustments made to the
    /// request, such as clamped fields.
    Applied {
        /// Human-readable adjustments.
        notes: Vec<String>,
    },
    /// No base image was supplied.
    MissingCanvas,
    /// The watermark text is empty or whitespace.
    EmptyText,
    /// An image watermark was requested without a watermark image.
    MissingWatermarkImage,
    /// The watermark-type tag is not recognized.
    UnknownKind(String),
    /// Compositing failed; the original image is returned.
    Failed(String),
}

impl Status {
    /// Whether the watermark was applied.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied { notes } if notes.is_empty() => write!(f, "Watermark applied"),
            Self::Applied { notes } => write!(f, "Watermark applied ({})", notes.join("; ")),
            Self::MissingCanvas => write!(f, "No image to watermark"),
            Self::EmptyText => write!(f, "Watermark text is empty"),
            Self::MissingWatermarkImage => write!(f, "No watermark image supplied"),
            Self::UnknownKind(kind) => write!(f, "Unknown watermark type: {kind:?}"),
            Self::Failed(reason) => write!(f, "Processing failed: {reason}"),
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the input file.
    pub path: PathBuf,
    /// Whether the watermarked image was written.
    pub success: bool,
    /// Human-readable status message.
    pub message: String,
}

/// Normalizes requests and hands them to the matching compositor.
///
/// Holds only immutable configuration (the resolved font), so a single
/// instance can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Watermarker {
    font: FontHandle,
}

impl Watermarker {
    /// Create a dispatcher using the first usable system font, or the
    /// built-in font if none is found.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(&SystemFontResolver::default(), &[])
    }

    /// Create a dispatcher whose font comes from `resolver`, trying
    /// `font_hints` first.
    #[must_use]
    pub fn with_resolver(resolver: &dyn FontResolver, font_hints: &[PathBuf]) -> Self {
        Self::with_font(resolver.load_font(font_hints))
    }

    /// Create a dispatcher using `font`.
    #[must_use]
    pub fn with_font(font: FontHandle) -> Self {
        Self { font }
    }

    /// The font used for text watermarks.
    #[must_use]
    pub fn font(&self) -> &FontHandle {
        &self.font
    }

    /// Apply the watermark described by `request` to `canvas`.
    ///
    /// Never fails: invalid requests return the original canvas (or `None`
    /// when there is none) together with a [`Status`] explaining why.
    #[must_use]
    pub fn composite(
        &self,
        canvas: Option<&RgbImage>,
        request: &WatermarkRequest,
    ) -> (Option<RgbImage>, Status) {
        let Some(canvas) = canvas else {
            return (None, Status::MissingCanvas);
        };
        let unchanged = |status: Status| (Some(canvas.clone()), status);

        let Some(kind) = WatermarkKind::from_tag(&request.kind) else {
            return unchanged(Status::UnknownKind(request.kind.clone()));
        };

        let normalized = request.params.normalize(canvas.width(), canvas.height());
        let mut notes: Vec<String> = normalized
            .clamped
            .iter()
            .map(|field| format!("{field} clamped"))
            .collect();

        let result = match kind {
            WatermarkKind::Text => {
                if request.text.trim().is_empty() {
                    return unchanged(Status::EmptyText);
                }
                let (color, substituted) = resolve_color(&request.color);
                if substituted {
                    notes.push("unrecognized color, used gray".to_string());
                }
                let spec = TextSpec {
                    text: request.text.clone(),
                    font_size: normalized.font_size,
                    color,
                };
                TextCompositor::new(&self.font).render(canvas, &spec, &normalized.params)
            }
            WatermarkKind::Image => {
                let Some(source) = request.watermark.as_ref() else {
                    return unchanged(Status::MissingWatermarkImage);
                };
                ImageCompositor::new().render(canvas, &ImageSpec { source }, &normalized.params)
            }
        };

        match result {
            Ok(out) => {
                tracing::info!(kind = ?kind, notes = notes.len(), "watermark applied");
                (Some(out), Status::Applied { notes })
            }
            Err(e) => {
                tracing::warn!(error = %e, "watermark not applied");
                unchanged(Status::Failed(e.to_string()))
            }
        }
    }

    /// Process a single image file: load, watermark, save.
    ///
    /// Returns a [`ProcessResult`] indicating success or failure.
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        request: &WatermarkRequest,
    ) -> ProcessResult {
        let mut result = ProcessResult {
            path: input.to_path_buf(),
            success: false,
            message: String::new(),
        };

        let canvas = match load_canvas(input) {
            Ok(img) => img,
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let (watermarked, status) = self.composite(Some(&canvas), request);
        result.message = status.to_string();
        if !status.is_applied() {
            return result;
        }
        let Some(watermarked) = watermarked else {
            return result;
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&watermarked, output) {
            Ok(()) => result.success = true,
            Err(e) => result.message = format!("Failed to save: {e}"),
        }

        result
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Load an image and normalize it to 8-bit RGB.
///
/// Palette, grayscale, CMYK-decoded and alpha-bearing images are all
/// flattened to three channels here, so the compositors only see RGB.
///
/// # Errors
///
/// Returns an error if the extension is unsupported or decoding fails.
pub fn load_canvas(path: &Path) -> Result<RgbImage> {
    if !is_supported_image(path) {
        return Err(Error::UnsupportedFormat(path.display().to_string()));
    }
    Ok(image::open(path)?.to_rgb8())
}

/// Save an RGB image with format-specific quality settings.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let file = std::io::BufWriter::new(std::fs::File::create(path)?);
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(file, JPEG_QUALITY);
            encoder.encode_image(img)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp | ImageFormat::Tiff => {
            DynamicImage::ImageRgb8(img.clone()).save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_watermarked.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_watermarked.{ext}"))
}
