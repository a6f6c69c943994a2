//! Image abstraction layer supporting both pure Rust and OpenCV backends
//!
//! Both backends take and return `image` buffers so the detector does not
//! care which one is compiled in. Function names follow their OpenCV
//! counterparts.

use image::{GrayImage, Rgb, RgbImage};

use crate::engine::InputError;
use crate::types::PixelFormat;

#[cfg(feature = "use-opencv")]
pub use opencv_impl::*;

#[cfg(not(feature = "use-opencv"))]
pub use rust_impl::*;

/// A caller-owned pixel buffer, validated once and borrowed for the
/// duration of a detection call.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
}

impl<'a> Frame<'a> {
    /// Frame with tightly packed rows.
    pub fn new(data: &'a [u8], width: u32, height: u32, format: PixelFormat) -> Result<Self, InputError> {
        let bpp = format.bytes_per_pixel().unwrap_or(0);
        Self::with_stride(data, width, height, format, width as usize * bpp)
    }

    /// Frame whose rows are `stride` bytes apart.
    pub fn with_stride(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
    ) -> Result<Self, InputError> {
        if data.is_empty() {
            return Err(InputError::EmptyBuffer);
        }
        if width == 0 || height == 0 {
            return Err(InputError::ZeroDimension { width, height });
        }
        let bpp = format
            .bytes_per_pixel()
            .ok_or(InputError::UnsupportedFormat(format))?;

        let row_bytes = width as usize * bpp;
        if stride < row_bytes {
            return Err(InputError::InvalidStride { stride, row_bytes });
        }

        // The last row need not be padded out to the full stride.
        let expected = stride
            .checked_mul(height as usize - 1)
            .and_then(|bytes| bytes.checked_add(row_bytes))
            .ok_or(InputError::BufferTooSmall {
                expected: usize::MAX,
                actual: data.len(),
            })?;
        if data.len() < expected {
            return Err(InputError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            format,
            stride,
        })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes per pixel; always known for a constructed frame.
    pub fn channels(&self) -> usize {
        self.format.bytes_per_pixel().unwrap_or(0)
    }

    /// Decode the BGRX rows into an RGB image, dropping the padding byte.
    pub fn to_rgb8(&self) -> RgbImage {
        let channels = self.channels();
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let i = y as usize * self.stride + x as usize * channels;
            Rgb([self.data[i + 2], self.data[i + 1], self.data[i]])
        })
    }
}

/// Binarize: pixels at or above `thresh` become 255, the rest 0.
pub fn threshold_ge(gray: &GrayImage, thresh: u8) -> GrayImage {
    let mut out = gray.clone();
    for p in out.pixels_mut() {
        p[0] = if p[0] >= thresh { 255 } else { 0 };
    }
    out
}

/// Threshold of level `level` out of `levels`: `(level + 1) * 255 / levels`.
pub fn level_threshold(level: u32, levels: u32) -> u8 {
    ((level + 1) * 255 / levels.max(1)).min(255) as u8
}

// Pure Rust implementation
#[cfg(not(feature = "use-opencv"))]
mod rust_impl {
    use crate::contours::{self, Contour};
    use crate::engine::EngineError;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use imageproc::distance_transform::Norm;

    /// Binomial 5-tap kernel shared by pyrDown and pyrUp.
    const KERNEL: [i32; 5] = [1, 4, 6, 4, 1];

    /// Fixed-point weights for `0.299 R + 0.587 G + 0.114 B`, scaled by 2^14.
    const GRAY_R: u32 = 4899;
    const GRAY_G: u32 = 9617;
    const GRAY_B: u32 = 1868;
    const GRAY_SHIFT: u32 = 14;

    /// Weak-edge floor for hysteresis. imageproc keeps weak pixels with
    /// magnitude >= low, so a literal 0 would flood every background pixel.
    const CANNY_LOW: f32 = 1e-3;

    /// Reflect-101 border: `gfedcb|abcdefgh|gfedcba`.
    fn reflect101(mut i: isize, n: usize) -> usize {
        let n = n as isize;
        if n == 1 {
            return 0;
        }
        loop {
            if i < 0 {
                i = -i;
            } else if i >= n {
                i = 2 * n - 2 - i;
            } else {
                return i as usize;
            }
        }
    }

    /// Blur and halve the image to `(w / 2, h / 2)`.
    pub fn pyr_down(src: &RgbImage) -> Result<RgbImage, EngineError> {
        let (sw, sh) = (src.width() as usize, src.height() as usize);
        let (dw, dh) = (sw / 2, sh / 2);
        if dw == 0 || dh == 0 {
            return Err(EngineError::ProcessingFailure(format!(
                "pyr_down: {}x{} image is too small",
                sw, sh
            )));
        }

        // Horizontal pass on every source row, sampling even columns.
        let mut rows = vec![[0i32; 3]; sh * dw];
        for y in 0..sh {
            for x in 0..dw {
                let mut acc = [0i32; 3];
                for (k, &weight) in KERNEL.iter().enumerate() {
                    let sx = reflect101(2 * x as isize + k as isize - 2, sw);
                    let Rgb(px) = *src.get_pixel(sx as u32, y as u32);
                    for c in 0..3 {
                        acc[c] += weight * px[c] as i32;
                    }
                }
                rows[y * dw + x] = acc;
            }
        }

        // Vertical pass on even rows.
        let mut dst = RgbImage::new(dw as u32, dh as u32);
        for y in 0..dh {
            for x in 0..dw {
                let mut acc = [0i32; 3];
                for (k, &weight) in KERNEL.iter().enumerate() {
                    let sy = reflect101(2 * y as isize + k as isize - 2, sh);
                    let row = rows[sy * dw + x];
                    for c in 0..3 {
                        acc[c] += weight * row[c];
                    }
                }
                dst.put_pixel(x as u32, y as u32, Rgb(acc.map(|v| ((v + 128) >> 8) as u8)));
            }
        }

        Ok(dst)
    }

    /// Upsample to `width x height` and blur. Only the even positions of the
    /// zero-stuffed image carry samples; reflect-101 keeps that parity.
    pub fn pyr_up(src: &RgbImage, width: u32, height: u32) -> Result<RgbImage, EngineError> {
        let (sw, sh) = (src.width() as usize, src.height() as usize);
        let (dw, dh) = (width as usize, height as usize);
        if sw == 0 || sh == 0 || dw == 0 || dh == 0 {
            return Err(EngineError::ProcessingFailure(format!(
                "pyr_up: cannot scale {}x{} to {}x{}",
                sw, sh, dw, dh
            )));
        }
        let (uw, uh) = (2 * sw, 2 * sh);

        let mut rows = vec![[0i32; 3]; sh * dw];
        for y in 0..sh {
            for x in 0..dw {
                let mut acc = [0i32; 3];
                for (k, &weight) in KERNEL.iter().enumerate() {
                    let ux = reflect101(x as isize + k as isize - 2, uw);
                    if ux % 2 != 0 {
                        continue;
                    }
                    let Rgb(px) = *src.get_pixel((ux / 2).min(sw - 1) as u32, y as u32);
                    for c in 0..3 {
                        acc[c] += weight * px[c] as i32;
                    }
                }
                rows[y * dw + x] = acc;
            }
        }

        let mut dst = RgbImage::new(width, height);
        for y in 0..dh {
            for x in 0..dw {
                let mut acc = [0i32; 3];
                for (k, &weight) in KERNEL.iter().enumerate() {
                    let uy = reflect101(y as isize + k as isize - 2, uh);
                    if uy % 2 != 0 {
                        continue;
                    }
                    let row = rows[(uy / 2).min(sh - 1) * dw + x];
                    for c in 0..3 {
                        acc[c] += weight * row[c];
                    }
                }
                dst.put_pixel(x as u32, y as u32, Rgb(acc.map(|v| ((v + 32) >> 6) as u8)));
            }
        }

        Ok(dst)
    }

    /// Match OpenCV's RGB2GRAY fixed-point rounding.
    pub fn cvt_color_to_gray(src: &RgbImage) -> Result<GrayImage, EngineError> {
        Ok(GrayImage::from_fn(src.width(), src.height(), |x, y| {
            let Rgb([r, g, b]) = *src.get_pixel(x, y);
            let v = r as u32 * GRAY_R + g as u32 * GRAY_G + b as u32 * GRAY_B;
            Luma([((v + (1 << (GRAY_SHIFT - 1))) >> GRAY_SHIFT) as u8])
        }))
    }

    /// Canny edges (low threshold 0) thickened by one 3x3 dilation, so that
    /// broken edge segments close up into contours.
    pub fn canny_dilate(gray: &GrayImage, thresh: f32) -> Result<GrayImage, EngineError> {
        let edges = imageproc::edges::canny(gray, CANNY_LOW, thresh.max(CANNY_LOW));
        Ok(imageproc::morphology::dilate(&edges, Norm::LInf, 1))
    }

    pub fn find_contours(binary: &GrayImage) -> Result<Vec<Contour>, EngineError> {
        Ok(contours::find_contours(binary))
    }

}

// OpenCV implementation
#[cfg(feature = "use-opencv")]
mod opencv_impl {
    use crate::contours::Contour;
    use crate::engine::EngineError;
    use crate::geometry::Point;
    use image::{GrayImage, RgbImage};
    use opencv::core::{self, Mat, Scalar, Vector, BORDER_CONSTANT, BORDER_DEFAULT};
    use opencv::imgproc;
    use opencv::prelude::*;

    fn rgb_to_mat(src: &RgbImage) -> Result<Mat, EngineError> {
        let flat = Mat::from_slice(src.as_raw().as_slice())?;
        Ok(flat.reshape(3, src.height() as i32)?.try_clone()?)
    }

    fn gray_to_mat(src: &GrayImage) -> Result<Mat, EngineError> {
        let flat = Mat::from_slice(src.as_raw().as_slice())?;
        Ok(flat.reshape(1, src.height() as i32)?.try_clone()?)
    }

    fn mat_to_rgb(mat: &Mat) -> Result<RgbImage, EngineError> {
        let data = mat.data_bytes()?.to_vec();
        RgbImage::from_raw(mat.cols() as u32, mat.rows() as u32, data)
            .ok_or_else(|| EngineError::ProcessingFailure("Mat is not a packed RGB image".to_string()))
    }

    fn mat_to_gray(mat: &Mat) -> Result<GrayImage, EngineError> {
        let data = mat.data_bytes()?.to_vec();
        GrayImage::from_raw(mat.cols() as u32, mat.rows() as u32, data)
            .ok_or_else(|| EngineError::ProcessingFailure("Mat is not a packed gray image".to_string()))
    }

    pub fn pyr_down(src: &RgbImage) -> Result<RgbImage, EngineError> {
        let mut dst = Mat::default();
        imgproc::pyr_down(
            &rgb_to_mat(src)?,
            &mut dst,
            core::Size::new(src.width() as i32 / 2, src.height() as i32 / 2),
            BORDER_DEFAULT,
        )?;
        mat_to_rgb(&dst)
    }

    pub fn pyr_up(src: &RgbImage, width: u32, height: u32) -> Result<RgbImage, EngineError> {
        let mut dst = Mat::default();
        imgproc::pyr_up(
            &rgb_to_mat(src)?,
            &mut dst,
            core::Size::new(width as i32, height as i32),
            BORDER_DEFAULT,
        )?;
        mat_to_rgb(&dst)
    }

    pub fn cvt_color_to_gray(src: &RgbImage) -> Result<GrayImage, EngineError> {
        let mut dst = Mat::default();
        imgproc::cvt_color(
            &rgb_to_mat(src)?,
            &mut dst,
            imgproc::COLOR_RGB2GRAY,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;
        mat_to_gray(&dst)
    }

    pub fn canny_dilate(gray: &GrayImage, thresh: f32) -> Result<GrayImage, EngineError> {
        let mut edges = Mat::default();
        imgproc::canny(&gray_to_mat(gray)?, &mut edges, 0.0, thresh as f64, 5, false)?;

        let kernel = imgproc::get_structuring_element(
            imgproc::MORPH_RECT,
            core::Size::new(3, 3),
            core::Point::new(-1, -1),
        )?;
        let mut dilated = Mat::default();
        imgproc::dilate(
            &edges,
            &mut dilated,
            &kernel,
            core::Point::new(-1, -1),
            1,
            BORDER_CONSTANT,
            Scalar::all(0.0),
        )?;
        mat_to_gray(&dilated)
    }

    pub fn find_contours(binary: &GrayImage) -> Result<Vec<Contour>, EngineError> {
        let mut found: Vector<Vector<core::Point>> = Vector::new();
        imgproc::find_contours(
            &gray_to_mat(binary)?,
            &mut found,
            imgproc::RETR_LIST,
            imgproc::CHAIN_APPROX_SIMPLE,
            core::Point::new(0, 0),
        )?;

        Ok(found
            .iter()
            .map(|c| Contour::new(c.iter().map(|p| Point::new(p.x, p.y)).collect()))
            .collect())
    }
}
