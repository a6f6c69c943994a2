use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::{EngineError, TextEngine};
use crate::geometry::BoundingBox;
use crate::image_impl::Frame;

/// Zero-copy crop of a frame handed to the OCR engine.
///
/// `data` starts at the crop's first pixel and keeps the frame's row stride,
/// so row `y` of the crop begins at `y * stride`.
#[derive(Debug, Clone, Copy)]
pub struct RegionView<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Bytes per pixel.
    pub channels: u32,
    pub stride: usize,
    /// Crop rectangle in frame coordinates, already clamped.
    pub bbox: BoundingBox,
}

impl<'a> RegionView<'a> {
    /// Crop `[min_y, max_y) x [min_x, max_x)` after clamping to the frame.
    /// Returns `None` when nothing of the box remains.
    pub fn from_frame(frame: &Frame<'a>, bbox: &BoundingBox) -> Option<Self> {
        let clamped = bbox.clamp_to(frame.width(), frame.height());
        if clamped.width() <= 0 || clamped.height() <= 0 {
            return None;
        }

        let channels = frame.channels();
        let stride = frame.stride();
        let start = clamped.min_y as usize * stride + clamped.min_x as usize * channels;
        let end = (clamped.max_y as usize - 1) * stride + clamped.max_x as usize * channels;

        Some(Self {
            data: frame.data().get(start..end)?,
            width: clamped.width() as u32,
            height: clamped.height() as u32,
            channels: channels as u32,
            stride,
            bbox: clamped,
        })
    }
}

/// Text recognized in one region. `text` is `None` when the engine found
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionText {
    pub bbox: BoundingBox,
    pub text: Option<String>,
}

/// Run the engine over every region that yields a non-empty crop, in order.
pub fn recognize_regions(
    engine: &mut dyn TextEngine,
    frame: &Frame<'_>,
    boxes: &[BoundingBox],
) -> Result<Vec<RegionText>, EngineError> {
    let start = Instant::now();
    let mut results = Vec::with_capacity(boxes.len());

    for bbox in boxes {
        let Some(region) = RegionView::from_frame(frame, bbox) else {
            debug!(?bbox, "skipping empty crop");
            continue;
        };
        let text = engine.recognize(&region)?;
        results.push(RegionText {
            bbox: region.bbox,
            text,
        });
    }

    info!(
        regions = results.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "text recognition done"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OcrConfig, PixelFormat};

    /// BGRX frame where every pixel's blue byte holds its x and green its y.
    fn coord_frame(width: u32, height: u32, stride: usize) -> Vec<u8> {
        let mut data = vec![0u8; stride * height as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                data[y * stride + x * 4] = x as u8;
                data[y * stride + x * 4 + 1] = y as u8;
            }
        }
        data
    }

    fn bbox(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> BoundingBox {
        BoundingBox {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    #[test]
    fn test_crop_is_zero_copy_with_frame_stride() {
        let data = coord_frame(20, 10, 96);
        let frame = Frame::with_stride(&data, 20, 10, PixelFormat::Bgr888, 96).unwrap();

        let region = RegionView::from_frame(&frame, &bbox(3, 8, 2, 6)).unwrap();
        assert_eq!((region.width, region.height), (5, 4));
        assert_eq!(region.channels, 4);
        assert_eq!(region.stride, 96);
        assert_eq!(region.data.as_ptr(), data[2 * 96 + 3 * 4..].as_ptr());

        let row_bytes = region.width as usize * region.channels as usize;
        let last = &region.data[3 * region.stride..3 * region.stride + row_bytes];
        assert_eq!(last.len(), 20);
        assert_eq!((last[0], last[1]), (3, 5));
        assert_eq!((last[16], last[17]), (7, 5));
    }

    #[test]
    fn test_crop_is_clamped_to_frame() {
        let data = coord_frame(20, 10, 80);
        let frame = Frame::new(&data, 20, 10, PixelFormat::Bgr888).unwrap();

        let region = RegionView::from_frame(&frame, &bbox(-5, 40, 8, 30)).unwrap();
        assert_eq!(region.bbox, bbox(0, 20, 8, 10));
        assert_eq!((region.width, region.height), (20, 2));
    }

    #[test]
    fn test_degenerate_crop_is_skipped() {
        let data = coord_frame(20, 10, 80);
        let frame = Frame::new(&data, 20, 10, PixelFormat::Bgr888).unwrap();

        assert!(RegionView::from_frame(&frame, &bbox(5, 5, 0, 4)).is_none());
        assert!(RegionView::from_frame(&frame, &bbox(25, 30, 0, 4)).is_none());
    }

    struct SizeEngine;

    impl TextEngine for SizeEngine {
        fn init(&mut self, _config: &OcrConfig) -> Result<(), EngineError> {
            Ok(())
        }

        fn recognize(&mut self, region: &RegionView<'_>) -> Result<Option<String>, EngineError> {
            Ok(Some(format!("{}x{}", region.width, region.height)))
        }
    }

    #[test]
    fn test_recognize_regions_skips_empty_boxes() {
        let data = coord_frame(20, 10, 80);
        let frame = Frame::new(&data, 20, 10, PixelFormat::Bgr888).unwrap();
        let boxes = [bbox(0, 4, 0, 3), bbox(6, 6, 0, 3), bbox(10, 20, 5, 10)];

        let results = recognize_regions(&mut SizeEngine, &frame, &boxes).unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.text.as_deref()).collect();
        assert_eq!(texts, vec![Some("4x3"), Some("10x5")]);
    }
}
