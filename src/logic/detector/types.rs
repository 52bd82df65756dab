//! Change Detection Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-stamped vegetation observation produced by the imagery pipeline.
///
/// Immutable once captured; this subsystem only reads it. `brightness` and
/// `texture` are auxiliary scalars conventionally in [0,1]; texture is a
/// placeholder summary statistic, not a real GLCM computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImageFeatureSample {
    pub timestamp: DateTime<Utc>,
    /// Normalized vegetation index, [-1, 1]
    pub ndvi: f64,
    pub brightness: f64,
    pub texture: f64,
}

/// A before/after pair of imagery references for validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePair {
    pub before_url: Option<String>,
    pub after_url: Option<String>,
    pub before_timestamp: Option<DateTime<Utc>>,
    pub after_timestamp: Option<DateTime<Utc>>,
}

/// Classification of a detected change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    NoChange,
    Deforestation,
    Reforestation,
    Other,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::NoChange => "no_change",
            ChangeType::Deforestation => "deforestation",
            ChangeType::Reforestation => "reforestation",
            ChangeType::Other => "other",
        }
    }
}

/// Output of a single before/after comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeDetection {
    pub has_change: bool,
    pub change_type: ChangeType,
    /// after.ndvi - before.ndvi (signed)
    pub ndvi_change: f64,
    pub brightness_change: f64,
    pub texture_change: f64,
    /// Weighted-sum confidence, [0, 1]
    pub confidence: f64,
    /// Bbox area scaled by |ndvi_change| - a proxy, not a true footprint
    pub affected_area_ha: f64,
}

/// Direction of an NDVI time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// One consecutive-pair delta in a time series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePoint {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub delta: f64,
}

/// Trend analysis over an ordered series of samples
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesChange {
    pub trend: Trend,
    pub change_points: Vec<ChangePoint>,
    /// last.ndvi - first.ndvi after sorting by timestamp
    pub overall_change: f64,
}

/// Validation report for an image pair; collects every violation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}
