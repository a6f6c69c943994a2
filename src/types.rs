use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// Pixel layouts a captured frame may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 16-bit, 5 bits per channel.
    Bgr555,
    /// 18-bit colour packed into 32 bits.
    Bgr666,
    /// 8 bits per channel, stored as B, G, R, X (4 bytes per pixel).
    Bgr888,
}

impl PixelFormat {
    /// Bytes per pixel for the layouts the detector can decode.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::Bgr888 => Some(4),
            PixelFormat::Bgr555 | PixelFormat::Bgr666 => None,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PixelFormat::Bgr555 => "BGR555",
            PixelFormat::Bgr666 => "BGR666",
            PixelFormat::Bgr888 => "BGR888",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetConfig {
    /// Upper Canny threshold used on level 0.
    pub thresh: f32,
    /// Number of threshold levels, Canny level included.
    pub levels: u32,
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
    /// Minimum absolute polygon area, in pixels.
    pub min_area: f64,
    /// Corners whose |cos| reaches this value disqualify a quad.
    pub max_cosine: f64,
    /// Per-axis pixel tolerance when comparing anchor points of two quads.
    pub dedup_threshold: i32,
}

impl Default for DetConfig {
    fn default() -> Self {
        Self {
            thresh: 50.0,
            levels: 10,
            approx_epsilon_ratio: 0.02,
            min_area: 1000.0,
            max_cosine: 0.3,
            dedup_threshold: 10,
        }
    }
}

impl DetConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.levels == 0 {
            return Err(EngineError::Config("levels must be at least 1".to_string()));
        }
        if self.levels > 255 {
            return Err(EngineError::Config(format!(
                "levels must not exceed 255, got {}",
                self.levels
            )));
        }
        if !self.thresh.is_finite() || self.thresh < 0.0 {
            return Err(EngineError::Config(format!(
                "thresh must be a non-negative number, got {}",
                self.thresh
            )));
        }
        if self.approx_epsilon_ratio.is_nan() || self.approx_epsilon_ratio <= 0.0 {
            return Err(EngineError::Config(format!(
                "approx_epsilon_ratio must be positive, got {}",
                self.approx_epsilon_ratio
            )));
        }
        if self.dedup_threshold < 0 {
            return Err(EngineError::Config(format!(
                "dedup_threshold must be non-negative, got {}",
                self.dedup_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSegMode {
    /// Fully automatic page segmentation.
    Auto,
    /// Treat the region as a single uniform block of text.
    SingleBlock,
    /// Treat the region as a single text line.
    SingleLine,
    /// Treat the region as a single word.
    SingleWord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Language or model identifier passed to the engine.
    pub language: String,
    pub page_seg_mode: PageSegMode,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            page_seg_mode: PageSegMode::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = DetConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.levels, 10);
        assert_eq!(cfg.dedup_threshold, 10);
    }

    #[test]
    fn test_zero_levels_rejected() {
        let cfg = DetConfig {
            levels: 0,
            ..DetConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let cfg: DetConfig = serde_json::from_str(r#"{"thresh": 80.0}"#).unwrap();
        assert_eq!(cfg.thresh, 80.0);
        assert_eq!(cfg.levels, 10);
        assert_eq!(cfg.min_area, 1000.0);
    }

    #[test]
    fn test_only_bgr888_is_decodable() {
        assert_eq!(PixelFormat::Bgr888.bytes_per_pixel(), Some(4));
        assert_eq!(PixelFormat::Bgr555.bytes_per_pixel(), None);
        assert_eq!(PixelFormat::Bgr666.bytes_per_pixel(), None);
    }
}
