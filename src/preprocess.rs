use image::{GrayImage, RgbImage};
use tracing::debug;

use crate::engine::EngineError;
use crate::image_impl::{cvt_color_to_gray, pyr_down, pyr_up};

/// Noise suppression ahead of edge detection: one pyramid step down and back
/// up to the original size, then conversion to a single intensity channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetPreProcess;

impl DetPreProcess {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, img: &RgbImage) -> Result<GrayImage, EngineError> {
        let denoised = self.denoise(img)?;
        cvt_color_to_gray(&denoised)
    }

    fn denoise(&self, img: &RgbImage) -> Result<RgbImage, EngineError> {
        let (w, h) = img.dimensions();
        let pyr = pyr_down(img)?;
        debug!(width = w, height = h, pyr_width = pyr.width(), pyr_height = pyr.height(), "pyramid pass");
        pyr_up(&pyr, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_run_keeps_dimensions() {
        let img = RgbImage::from_pixel(101, 57, Rgb([0, 0, 255]));
        let gray = DetPreProcess::new().run(&img).unwrap();
        assert_eq!(gray.dimensions(), (101, 57));
        assert!(gray.pixels().all(|p| p[0] == 29));
    }

    #[test]
    fn test_run_smooths_isolated_pixel() {
        let mut img = RgbImage::new(32, 32);
        img.put_pixel(16, 16, Rgb([255, 255, 255]));
        let gray = DetPreProcess::new().run(&img).unwrap();
        assert!(gray.get_pixel(16, 16)[0] < 64);
    }

    #[test]
    fn test_run_rejects_single_row() {
        let img = RgbImage::new(40, 1);
        assert!(DetPreProcess::new().run(&img).is_err());
    }
}
