use tracing::{debug, info};

use crate::det::SquareDetector;
use crate::engine::{EngineError, SpellDictionary, TextEngine};
use crate::geometry::{BoundingBox, Quad};
use crate::image_impl::Frame;
use crate::rec::{recognize_regions, RegionText};
use crate::spell;
use crate::types::{DetConfig, OcrConfig};

const TEXT_ENGINE: &str = "text engine";
const DICTIONARY: &str = "spell dictionary";

/// Detection pipeline plus the OCR and spelling collaborators it feeds.
///
/// ```rust,no_run
/// use quadseek::{DetConfig, Frame, PixelFormat, ScreenReader};
///
/// let pixels = vec![0u8; 640 * 480 * 4];
/// let frame = Frame::new(&pixels, 640, 480, PixelFormat::Bgr888)?;
/// let reader = ScreenReader::new(DetConfig::default())?;
/// for bbox in reader.detect_regions(&frame) {
///     println!("{:?}", bbox);
/// }
/// # Ok::<(), quadseek::EngineError>(())
/// ```
pub struct ScreenReader {
    detector: SquareDetector,
    text_engine: Option<Box<dyn TextEngine>>,
    dictionary: Option<Box<dyn SpellDictionary>>,
}

impl ScreenReader {
    pub fn new(cfg: DetConfig) -> Result<Self, EngineError> {
        Ok(Self {
            detector: SquareDetector::new(cfg)?,
            text_engine: None,
            dictionary: None,
        })
    }

    /// Attach an OCR engine, initializing it with `ocr_cfg` first.
    pub fn with_text_engine(
        mut self,
        mut engine: Box<dyn TextEngine>,
        ocr_cfg: &OcrConfig,
    ) -> Result<Self, EngineError> {
        engine.init(ocr_cfg)?;
        info!(language = %ocr_cfg.language, mode = ?ocr_cfg.page_seg_mode, "text engine ready");
        self.text_engine = Some(engine);
        Ok(self)
    }

    pub fn with_dictionary(mut self, dictionary: Box<dyn SpellDictionary>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Deduplicated square-like quads found in the frame.
    pub fn detect_squares(&self, frame: &Frame<'_>) -> Vec<Quad> {
        self.detector.find_squares(&frame.to_rgb8())
    }

    /// Bounding boxes of [`detect_squares`](Self::detect_squares), in the
    /// same order.
    pub fn detect_regions(&self, frame: &Frame<'_>) -> Vec<BoundingBox> {
        let boxes: Vec<BoundingBox> = self
            .detect_squares(frame)
            .iter()
            .map(Quad::bounding_box)
            .collect();
        debug!(regions = boxes.len(), "regions detected");
        boxes
    }

    /// Detect regions and run the OCR engine on each of them.
    pub fn read_regions(&mut self, frame: &Frame<'_>) -> Result<Vec<RegionText>, EngineError> {
        if self.text_engine.is_none() {
            return Err(EngineError::CollaboratorUnavailable(TEXT_ENGINE));
        }
        let boxes = self.detect_regions(frame);
        let engine = self
            .text_engine
            .as_deref_mut()
            .ok_or(EngineError::CollaboratorUnavailable(TEXT_ENGINE))?;
        recognize_regions(engine, frame, &boxes)
    }

    /// Text of every region that produced some, one region per line.
    pub fn read_text(&mut self, frame: &Frame<'_>) -> Result<String, EngineError> {
        let regions = self.read_regions(frame)?;
        let texts: Vec<String> = regions.into_iter().filter_map(|r| r.text).collect();
        Ok(texts.join("\n"))
    }

    pub fn correct_text(&self, text: &str) -> Result<String, EngineError> {
        let dictionary = self
            .dictionary
            .as_deref()
            .ok_or(EngineError::CollaboratorUnavailable(DICTIONARY))?;
        Ok(spell::correct_text(dictionary, text))
    }

    pub fn read_corrected_text(&mut self, frame: &Frame<'_>) -> Result<String, EngineError> {
        let text = self.read_text(frame)?;
        self.correct_text(&text)
    }
}
