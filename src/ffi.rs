// FFI bindings for C/C++/C#
use std::os::raw::{c_char, c_float, c_int, c_uint};
use std::slice;

use crate::{DetConfig, Frame, PixelFormat, Quad, ScreenReader};

/// Opaque handle to a detector instance
pub struct QSHandle {
    inner: ScreenReader,
}

/// C-compatible detected region: bounding box plus the four quad corners
#[repr(C)]
pub struct CRegion {
    pub min_x: c_int,
    pub min_y: c_int,
    pub max_x: c_int,
    pub max_y: c_int,
    pub x1: c_int,
    pub y1: c_int,
    pub x2: c_int,
    pub y2: c_int,
    pub x3: c_int,
    pub y3: c_int,
    pub x4: c_int,
    pub y4: c_int,
}

/// Create a detector. Non-positive `thresh` or `levels` select the defaults.
/// Returns null when the resulting configuration is invalid.
#[no_mangle]
pub extern "C" fn qs_new(thresh: c_float, levels: c_int) -> *mut QSHandle {
    let mut cfg = DetConfig::default();
    if thresh > 0.0 {
        cfg.thresh = thresh;
    }
    if levels > 0 {
        cfg.levels = levels as u32;
    }

    match ScreenReader::new(cfg) {
        Ok(reader) => Box::into_raw(Box::new(QSHandle { inner: reader })),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Detect square regions in a BGRX frame (4 bytes per pixel).
///
/// Returns 0 on success, -1 on null arguments, -2 when the frame is rejected.
///
/// # Safety
/// - handle must be a valid pointer returned from qs_new
/// - data must point to `data_len` readable bytes
/// - results_out will be allocated and must be freed with qs_free_regions
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn qs_detect_regions(
    handle: *mut QSHandle,
    data: *const u8,
    data_len: usize,
    width: c_uint,
    height: c_uint,
    stride: usize,
    results_out: *mut *mut CRegion,
    count_out: *mut usize,
) -> c_int {
    if handle.is_null() || data.is_null() || results_out.is_null() || count_out.is_null() {
        return -1;
    }

    let reader = &(*handle).inner;
    let pixels = slice::from_raw_parts(data, data_len);

    let frame = match Frame::with_stride(pixels, width, height, PixelFormat::Bgr888, stride) {
        Ok(f) => f,
        Err(_) => return -2,
    };

    let regions = quads_to_c(&reader.detect_squares(&frame)).into_boxed_slice();
    *count_out = regions.len();
    *results_out = Box::into_raw(regions) as *mut CRegion;

    0
}

/// Free regions returned from qs_detect_regions
///
/// # Safety
/// - regions must be a pointer returned from qs_detect_regions
/// - count must match the count returned alongside it
#[no_mangle]
pub unsafe extern "C" fn qs_free_regions(regions: *mut CRegion, count: usize) {
    if regions.is_null() {
        return;
    }
    drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(regions, count)));
}

/// Free a detector instance
///
/// # Safety
/// handle must be a valid pointer returned from qs_new
#[no_mangle]
pub unsafe extern "C" fn qs_free(handle: *mut QSHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Get library version
#[no_mangle]
pub extern "C" fn qs_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

// Helper function to convert quads to C regions
fn quads_to_c(quads: &[Quad]) -> Vec<CRegion> {
    quads
        .iter()
        .map(|q| {
            let b = q.bounding_box();
            let p = &q.points;
            CRegion {
                min_x: b.min_x,
                min_y: b.min_y,
                max_x: b.max_x,
                max_y: b.max_y,
                x1: p[0].x,
                y1: p[0].y,
                x2: p[1].x,
                y2: p[1].y,
                x3: p[2].x,
                y3: p[2].y,
                x4: p[3].x,
                y4: p[3].y,
            }
        })
        .collect()
}
