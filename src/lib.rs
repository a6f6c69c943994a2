//! # quadseek - square region detection for screen OCR
//!
//! quadseek finds rectangular, square-cornered regions (dialog boxes, panels,
//! buttons) in a captured screen frame and hands each of them to an OCR
//! engine. Detection runs a pyramid denoise, then extracts contours at
//! several intensity thresholds plus one Canny edge pass, keeps the convex
//! quadrilaterals with near-right corners, and collapses near-duplicates into
//! a stable set.
//!
//! ## Features
//!
//! - **Pure Rust** by default (`image` + `imageproc`); the `use-opencv`
//!   feature swaps in OpenCV for the image primitives
//! - **Zero-copy crops**: OCR engines receive views into the caller's buffer
//! - **Pluggable collaborators**: bring your own [`TextEngine`] and
//!   [`SpellDictionary`]
//! - **C ABI** behind the `ffi` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quadseek::{DetConfig, Frame, PixelFormat, ScreenReader};
//!
//! # fn capture() -> (Vec<u8>, u32, u32) { (vec![0; 4], 1, 1) }
//! let (pixels, width, height) = capture();
//! let frame = Frame::new(&pixels, width, height, PixelFormat::Bgr888)?;
//!
//! let reader = ScreenReader::new(DetConfig::default())?;
//! for bbox in reader.detect_regions(&frame) {
//!     println!("{}x{} at ({}, {})", bbox.width(), bbox.height(), bbox.min_x, bbox.min_y);
//! }
//! # Ok::<(), quadseek::EngineError>(())
//! ```

// Core modules
mod contours;
mod det;
mod engine;
mod geometry;
mod image_impl;
mod postprocess;
mod preprocess;
mod rec;
mod screen_reader;
mod spell;
mod types;

// FFI module for C bindings
#[cfg(feature = "ffi")]
pub mod ffi;

// Public API exports
pub use crate::contours::Contour;
pub use crate::det::SquareDetector;
pub use crate::engine::{EngineError, InputError, SpellDictionary, TextEngine};
pub use crate::geometry::{BoundingBox, Point, Quad};
pub use crate::image_impl::Frame;
pub use crate::postprocess::{deduplicate_squares, squares_different, QuadClassifier};
pub use crate::rec::{RegionText, RegionView};
pub use crate::screen_reader::ScreenReader;
pub use crate::spell::correct_text;
pub use crate::types::{DetConfig, OcrConfig, PageSegMode, PixelFormat};
