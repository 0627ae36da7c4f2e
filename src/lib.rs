//! Overlay text or image watermarks onto photos.
//!
//! Text watermarks are drawn onto a transparent layer, once or tiled in a
//! staggered grid over the whole photo, optionally rotated, and then
//! alpha-composited over the image. Image watermarks are scaled relative to
//! the photo width, optionally rotated, clipped to the photo and mixed in with
//! a uniform opacity. Every operation returns a new image of the same size.
//!
//! # Quick Start
//!
//! ```no_run
//! use photo_watermark::{RawParams, WatermarkRequest, Watermarker};
//!
//! let marker = Watermarker::new();
//! let photo = image::open("photo.jpg").unwrap().to_rgb8();
//! let request = WatermarkRequest {
//!     text: "© ACME".to_string(),
//!     color: "#FF0000".into(),
//!     params: RawParams { opacity: 0.4, angle: -30.0, repeat: true, ..RawParams::default() },
//!     ..WatermarkRequest::default()
//! };
//! let (out, status) = marker.composite(Some(&photo), &request);
//! println!("{status}");
//! out.unwrap().save("marked.jpg").unwrap();
//! ```
//!
//! # Compositors
//!
//! The dispatcher clamps raw parameters and never fails. The compositors can
//! also be used directly with already-normalized [`PlacementParams`]:
//!
//! ```no_run
//! use photo_watermark::{FontHandle, PlacementParams, TextCompositor, TextSpec};
//!
//! let font = FontHandle::Builtin;
//! let photo = image::open("photo.jpg").unwrap().to_rgb8();
//! let spec = TextSpec { text: "DRAFT".to_string(), ..TextSpec::default() };
//! let out = TextCompositor::new(&font)
//!     .render(&photo, &spec, &PlacementParams::default())
//!     .unwrap();
//! ```

#![deny(missing_docs)]

pub mod blending;
pub mod color;
mod engine;
pub mod error;
pub mod font;
pub mod geometry;
mod image_watermark;
pub mod params;
mod text_watermark;

pub use color::{parse_color, resolve_color, ColorValue, NEUTRAL_GRAY};
pub use engine::{
    default_output_path, is_supported_image, load_canvas, save_image, ProcessResult, Status,
    WatermarkKind, WatermarkRequest, Watermarker, SUPPORTED_EXTENSIONS,
};
pub use error::{Error, Result};
pub use font::{BuiltinFontResolver, FontHandle, FontResolver, SystemFontResolver, TextBounds};
pub use image_watermark::{fitted_size, ImageCompositor, ImageSpec, MAX_OVERSIZE};
pub use params::{PlacementParams, Position, RawParams, Spacing};
pub use text_watermark::{
    single_stamp_origin, text_alpha, TextCompositor, TextSpec, MIN_TEXT_ALPHA,
};
