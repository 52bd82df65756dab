//! Detection Feature Extraction
//!
//! Fixed feature vector fed to the scoring function. All values are
//! normalized to [0,1] before weighting.

use serde::{Deserialize, Serialize};

use crate::logic::detector::ImageFeatureSample;

/// Features extracted from a before/after observation pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionFeatures {
    /// before.ndvi - after.ndvi (positive = vegetation loss)
    pub ndvi_drop: f64,
    pub brightness_change: f64,
    pub texture_change: f64,
    /// Constant placeholder (0.8) until real time-series support lands.
    /// Keep the swap localised here - the scorer treats it as any other term.
    pub temporal_consistency: f64,
}

/// Placeholder value standing in for a real temporal-consistency model
pub const TEMPORAL_CONSISTENCY_PLACEHOLDER: f64 = 0.8;

/// Extract the fixed feature vector from an observation pair.
pub fn extract(before: &ImageFeatureSample, after: &ImageFeatureSample) -> DetectionFeatures {
    DetectionFeatures {
        ndvi_drop: before.ndvi - after.ndvi,
        brightness_change: (after.brightness - before.brightness).abs(),
        texture_change: (after.texture - before.texture).abs(),
        temporal_consistency: TEMPORAL_CONSISTENCY_PLACEHOLDER,
    }
}
