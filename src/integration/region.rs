//! Red-coverage coefficient of a central region, for button-press sensing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::detector::{Frame, RegionSignalSource};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    #[error("frame buffer holds {got} bytes, expected {expected} for {width}x{height} RGB")]
    MalformedFrame {
        width: u32,
        height: u32,
        expected: usize,
        got: usize,
    },

    #[error("region of interest is empty for a {width}x{height} frame")]
    EmptyRoi { width: u32, height: u32 },
}

/// Thresholds for classifying a pixel as red. Hue uses the 0-180 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedRegionConfig {
    /// ROI size relative to the shorter frame side.
    pub center_fraction: f64,
    pub sat_min: u8,
    pub val_min: u8,
    /// `r / (r + g + b + 1)` must exceed this.
    pub dominance: f64,
}

impl Default for RedRegionConfig {
    fn default() -> Self {
        Self {
            center_fraction: 0.33,
            sat_min: 30,
            val_min: 50,
            dominance: 0.40,
        }
    }
}

/// Region of interest in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Fraction of red pixels inside a narrow, tall window at the frame center.
#[derive(Debug, Clone)]
pub struct RedRegionExtractor {
    config: RedRegionConfig,
}

impl RedRegionExtractor {
    pub fn new(config: RedRegionConfig) -> Result<Self, ConfigError> {
        let fraction = config.center_fraction;
        if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "center_fraction",
                value: fraction,
                range: "(0, 1]",
            });
        }
        if !config.dominance.is_finite() || !(0.0..1.0).contains(&config.dominance) {
            return Err(ConfigError::InvalidThreshold {
                name: "dominance",
                value: config.dominance,
                range: "[0, 1)",
            });
        }
        Ok(Self { config })
    }

    /// Window half as wide and one and a half times as tall as
    /// `center_fraction * min(width, height)`, clipped to the frame.
    pub fn roi(&self, width: u32, height: u32) -> Roi {
        let (w, h) = (width as usize, height as usize);
        let side = w.min(h) as f64 * self.config.center_fraction;
        let roi_w = ((side / 2.0) as usize).min(w);
        let roi_h = ((side * 1.5) as usize).min(h);
        Roi {
            x: (w - roi_w) / 2,
            y: (h - roi_h) / 2,
            width: roi_w,
            height: roi_h,
        }
    }

    fn is_red(&self, r: u8, g: u8, b: u8) -> bool {
        let (max, min) = (r.max(g).max(b), r.min(g).min(b));
        if max < self.config.val_min || max == 0 {
            return false;
        }
        let diff = (max - min) as f32;
        let sat = diff * 255.0 / max as f32;
        if sat < self.config.sat_min as f32 || diff == 0.0 {
            return false;
        }

        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let mut hue_deg = if max == r {
            60.0 * (gf - bf) / diff
        } else if max == g {
            120.0 + 60.0 * (bf - rf) / diff
        } else {
            240.0 + 60.0 * (rf - gf) / diff
        };
        if hue_deg < 0.0 {
            hue_deg += 360.0;
        }
        let hue = hue_deg / 2.0;
        if !(hue <= 10.0 || hue >= 170.0) {
            return false;
        }

        let ratio = rf as f64 / (rf as f64 + gf as f64 + bf as f64 + 1.0);
        ratio > self.config.dominance
    }

    /// Red pixel count over ROI pixel count, in `[0, 1]`.
    pub fn measure(&self, frame: &Frame) -> Result<f64, RegionError> {
        if !frame.is_well_formed() {
            return Err(RegionError::MalformedFrame {
                width: frame.width,
                height: frame.height,
                expected: frame.width as usize * frame.height as usize * 3,
                got: frame.data.len(),
            });
        }
        let roi = self.roi(frame.width, frame.height);
        if roi.width == 0 || roi.height == 0 {
            return Err(RegionError::EmptyRoi {
                width: frame.width,
                height: frame.height,
            });
        }

        let stride = frame.width as usize * 3;
        let mut red = 0usize;
        for row in roi.y..roi.y + roi.height {
            let start = row * stride + roi.x * 3;
            let pixels = &frame.data[start..start + roi.width * 3];
            red += pixels
                .chunks_exact(3)
                .filter(|px| self.is_red(px[0], px[1], px[2]))
                .count();
        }
        Ok(red as f64 / (roi.width * roi.height) as f64)
    }
}

impl RegionSignalSource for RedRegionExtractor {
    type Error = RegionError;

    fn coefficient(&mut self, frame: &Frame) -> Result<f64, Self::Error> {
        self.measure(frame)
    }
}
