//! Error types for the photo-watermark crate.

use std::path::PathBuf;

/// Errors that can occur while compositing or saving a watermark.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter passed directly to a compositor is outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A resize or rotation target collapsed to zero area.
    #[error("degenerate watermark geometry ({width}x{height})")]
    DegenerateGeometry {
        /// Target width in pixels.
        width: u32,
        /// Target height in pixels.
        height: u32,
    },

    /// A font file could not be read or parsed.
    #[error("failed to load font {}: {reason}", path.display())]
    FontLoad {
        /// Path of the font that failed to load.
        path: PathBuf,
        /// Why loading failed.
        reason: String,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image decoding or encoding.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
