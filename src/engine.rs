//! Error types and the contracts of the external OCR and spelling engines.

use crate::rec::RegionView;
use crate::types::{OcrConfig, PixelFormat};

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("Processing failure: {0}")]
    ProcessingFailure(String),

    #[error("{0} is not initialized")]
    CollaboratorUnavailable(&'static str),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[cfg(feature = "use-opencv")]
    #[error("OpenCV error: {0}")]
    OpenCvError(#[from] opencv::Error),

    #[error("Image processing error: {0}")]
    ImageError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<image::ImageError> for EngineError {
    fn from(err: image::ImageError) -> Self {
        EngineError::ImageError(err.to_string())
    }
}

/// Reasons a frame is refused before any processing starts.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("image buffer is empty")]
    EmptyBuffer,

    #[error("image has zero rows or columns ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(PixelFormat),

    #[error("row stride {stride} is shorter than a row of {row_bytes} bytes")]
    InvalidStride { stride: usize, row_bytes: usize },

    #[error("buffer holds {actual} bytes, frame needs {expected}")]
    BufferTooSmall { expected: usize, actual: usize },
}

/// External OCR engine.
///
/// `init` is called once by [`crate::ScreenReader::with_text_engine`] before
/// the first `recognize`. Engines are stateful (they hold the current image),
/// hence `&mut self`.
pub trait TextEngine: Send {
    fn init(&mut self, config: &OcrConfig) -> Result<(), EngineError>;

    /// Recognize the text in one cropped region. `Ok(None)` means the engine
    /// found no text.
    fn recognize(&mut self, region: &RegionView<'_>) -> Result<Option<String>, EngineError>;
}

/// External spell-checking dictionary.
pub trait SpellDictionary: Send {
    fn is_valid(&self, word: &str) -> bool;

    /// Candidate corrections, best first. May be empty.
    fn suggest(&self, word: &str) -> Vec<String>;
}
