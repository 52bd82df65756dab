//! Detection Model
//!
//! Deterministic weighted-feature scoring - an explainable stand-in for a
//! trained model. Feature extraction, scoring and severity derivation are
//! pure; `batch_detect` parallelises independent items.

pub mod features;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MODEL_MIN_CONFIDENCE;
use crate::logic::detector::ImageFeatureSample;
use crate::logic::geo::BoundingBox;
use features::DetectionFeatures;

// Scoring weights; must sum to 1.0
const W_NDVI: f64 = 0.4;
const W_BRIGHTNESS: f64 = 0.2;
const W_TEXTURE: f64 = 0.2;
const W_TEMPORAL: f64 = 0.2;

// Full-scale values for term normalization
const NDVI_FULL_SCALE: f64 = 0.5;
const BRIGHTNESS_FULL_SCALE: f64 = 0.3;
const TEXTURE_FULL_SCALE: f64 = 0.3;

// ============================================================================
// TYPES
// ============================================================================

/// Ordinal alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Low => "[LOW]",
            Severity::Medium => "[MEDIUM]",
            Severity::High => "[HIGH]",
            Severity::Critical => "[CRITICAL]",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            _ => Severity::Low,
        }
    }

    /// UI color hint
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Low => "#2ecc71",
            Severity::Medium => "#f1c40f",
            Severity::High => "#e67e22",
            Severity::Critical => "#e74c3c",
        }
    }
}

/// Output of a single detection run. Ephemeral - consumed by the alert
/// generator and discarded; only the derived Alert is durable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub detected: bool,
    /// Weighted score, [0, 1]
    pub confidence: f64,
    pub severity: Severity,
    pub area_hectares: f64,
    pub bbox: BoundingBox,
    /// after.ndvi - before.ndvi (signed), when available
    pub ndvi_change: Option<f64>,
    pub features: DetectionFeatures,
}

/// An input item for batch detection
#[derive(Debug, Clone)]
pub struct DetectionInput {
    pub before: ImageFeatureSample,
    pub after: ImageFeatureSample,
    pub bbox: BoundingBox,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum confidence to report `detected = true`
    pub min_confidence: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { min_confidence: DEFAULT_MODEL_MIN_CONFIDENCE }
    }
}

// ============================================================================
// MODEL
// ============================================================================

/// Deterministic detection model. Construct one per process (or per request
/// scope) and pass it explicitly - no global instance.
#[derive(Debug, Clone, Default)]
pub struct DetectionModel {
    config: DetectionConfig,
}

impl DetectionModel {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Run one detection over a before/after pair and region bbox.
    pub fn detect(
        &self,
        before: &ImageFeatureSample,
        after: &ImageFeatureSample,
        bbox: &BoundingBox,
    ) -> Detection {
        let feats = features::extract(before, after);
        let confidence = score(&feats);
        let ndvi_change = after.ndvi - before.ndvi;

        Detection {
            detected: confidence >= self.config.min_confidence,
            confidence,
            severity: derive_severity(confidence, ndvi_change),
            area_hectares: bbox.area_hectares(),
            bbox: *bbox,
            ndvi_change: Some(ndvi_change),
            features: feats,
        }
    }

    /// Batch detection: independent items, order preserved, no shared
    /// mutable state.
    pub fn batch_detect(&self, inputs: &[DetectionInput]) -> Vec<Detection> {
        inputs
            .par_iter()
            .map(|item| self.detect(&item.before, &item.after, &item.bbox))
            .collect()
    }
}

// ============================================================================
// SCORING
// ============================================================================

/// Weighted-sum confidence over normalized feature terms, clamped to [0,1].
fn score(feats: &DetectionFeatures) -> f64 {
    let ndvi_term = (feats.ndvi_drop / NDVI_FULL_SCALE).clamp(0.0, 1.0);
    let brightness_term = (feats.brightness_change / BRIGHTNESS_FULL_SCALE).clamp(0.0, 1.0);
    let texture_term = (feats.texture_change / TEXTURE_FULL_SCALE).clamp(0.0, 1.0);
    let temporal_term = feats.temporal_consistency.clamp(0.0, 1.0);

    (W_NDVI * ndvi_term
        + W_BRIGHTNESS * brightness_term
        + W_TEXTURE * texture_term
        + W_TEMPORAL * temporal_term)
        .clamp(0.0, 1.0)
}

/// OR-combined severity thresholds, evaluated top-down; first match wins.
fn derive_severity(confidence: f64, ndvi_change: f64) -> Severity {
    if confidence >= 0.9 || ndvi_change < -0.5 {
        Severity::Critical
    } else if confidence >= 0.8 || ndvi_change < -0.3 {
        Severity::High
    } else if confidence >= 0.7 || ndvi_change < -0.2 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

// ============================================================================
// TESTS
// ============================================================================
