use std::time::Instant;

use image::{GrayImage, RgbImage};
use tracing::{debug, info, warn};

use crate::engine::EngineError;
use crate::geometry::Quad;
use crate::image_impl::{canny_dilate, find_contours, level_threshold, threshold_ge};
use crate::postprocess::{deduplicate_squares, QuadClassifier};
use crate::preprocess::DetPreProcess;
use crate::types::DetConfig;

/// Multi-threshold square finder.
pub struct SquareDetector {
    pub cfg: DetConfig,
    pub preprocess: DetPreProcess,
    pub classifier: QuadClassifier,
}

impl SquareDetector {
    pub fn new(cfg: DetConfig) -> Result<Self, EngineError> {
        cfg.validate()?;
        let classifier = QuadClassifier::from_config(&cfg);
        Ok(Self {
            cfg,
            preprocess: DetPreProcess::new(),
            classifier,
        })
    }

    /// Every square-like quad found over all threshold levels, in level
    /// order. Duplicates across levels are expected.
    pub fn find_candidates(&self, img: &RgbImage) -> Result<Vec<Quad>, EngineError> {
        // Too small for one pyramid step, let alone a square.
        if img.width() < 2 || img.height() < 2 {
            debug!(width = img.width(), height = img.height(), "image too small for detection");
            return Ok(Vec::new());
        }

        let gray = self.preprocess.run(img)?;

        let mut squares = Vec::new();
        for level in 0..self.cfg.levels {
            let binary = self.binarize(&gray, level)?;
            let before = squares.len();
            for contour in find_contours(&binary)? {
                if let Some(quad) = self.classifier.classify(&contour) {
                    squares.push(quad);
                }
            }
            debug!(level, found = squares.len() - before, "threshold level done");
        }

        Ok(squares)
    }

    /// Level 0 uses dilated Canny edges, so gradient-shaded squares are
    /// caught; the others a plain intensity threshold.
    fn binarize(&self, gray: &GrayImage, level: u32) -> Result<GrayImage, EngineError> {
        if level == 0 {
            canny_dilate(gray, self.cfg.thresh)
        } else {
            Ok(threshold_ge(gray, level_threshold(level, self.cfg.levels)))
        }
    }

    /// Candidates of [`find_candidates`](Self::find_candidates) collapsed to
    /// a stable set. Internal failures are logged and yield no squares.
    pub fn find_squares(&self, img: &RgbImage) -> Vec<Quad> {
        let start = Instant::now();

        let candidates = match self.find_candidates(img) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(error = %err, width = img.width(), height = img.height(), "square detection failed");
                return Vec::new();
            }
        };

        let total = candidates.len();
        let squares = deduplicate_squares(candidates, self.cfg.dedup_threshold);
        info!(
            candidates = total,
            squares = squares.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "square detection done"
        );
        squares
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;
    use image::Rgb;

    fn draw_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, color);
            }
        }
    }

    fn near(a: i32, b: i32) -> bool {
        (a - b).abs() <= 4
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let cfg = DetConfig {
            levels: 0,
            ..DetConfig::default()
        };
        assert!(matches!(SquareDetector::new(cfg), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_find_squares_two_white_squares() {
        let mut img = RgbImage::new(240, 140);
        draw_rect(&mut img, 30, 30, 60, 60, Rgb([255, 255, 255]));
        draw_rect(&mut img, 150, 40, 60, 60, Rgb([255, 255, 255]));

        let detector = SquareDetector::new(DetConfig::default()).unwrap();
        let candidates = detector.find_candidates(&img).unwrap();
        assert!(candidates.len() >= 2);

        let squares = detector.find_squares(&img);
        assert_eq!(squares.len(), 2);

        let mut boxes: Vec<_> = squares.iter().map(|q| q.bounding_box()).collect();
        boxes.sort_by_key(|b| b.min_x);
        let expected = [(30, 89, 30, 89), (150, 209, 40, 99)];
        for (b, &(min_x, max_x, min_y, max_y)) in boxes.iter().zip(expected.iter()) {
            assert!(near(b.min_x, min_x), "{:?}", b);
            assert!(near(b.max_x, max_x), "{:?}", b);
            assert!(near(b.min_y, min_y), "{:?}", b);
            assert!(near(b.max_y, max_y), "{:?}", b);
        }
    }

    #[test]
    fn test_find_squares_ignores_small_square() {
        let mut img = RgbImage::new(120, 120);
        draw_rect(&mut img, 50, 50, 20, 20, Rgb([255, 255, 255]));
        let detector = SquareDetector::new(DetConfig::default()).unwrap();
        assert!(detector.find_squares(&img).is_empty());
    }

    #[test]
    fn test_find_squares_blank_image() {
        let img = RgbImage::new(200, 150);
        let detector = SquareDetector::new(DetConfig::default()).unwrap();
        assert!(detector.find_candidates(&img).unwrap().is_empty());
        assert!(detector.find_squares(&img).is_empty());
    }

    #[test]
    fn test_find_squares_tiny_image_has_no_candidates() {
        let detector = SquareDetector::new(DetConfig::default()).unwrap();
        for (w, h) in [(1, 1), (1, 50), (50, 1)] {
            let img = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));
            assert_eq!(detector.find_candidates(&img).unwrap(), Vec::new());
            assert!(detector.find_squares(&img).is_empty());
        }
    }

    #[test]
    fn test_find_squares_bright_uniform_image_reports_frame() {
        // No edges, but every threshold level at or below the intensity turns
        // the whole image foreground, and its border is a square-like contour.
        let detector = SquareDetector::new(DetConfig::default()).unwrap();
        for value in [128u8, 255] {
            let img = RgbImage::from_pixel(200, 150, Rgb([value, value, value]));
            let squares = detector.find_squares(&img);
            assert_eq!(squares.len(), 1);
            assert_eq!(
                squares[0].bounding_box(),
                BoundingBox {
                    min_x: 0,
                    max_x: 199,
                    min_y: 0,
                    max_y: 149
                }
            );
        }
    }
}
