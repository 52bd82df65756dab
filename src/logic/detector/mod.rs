//! Change Detector
//!
//! Before/after feature deltas, change-type classification and trend
//! analysis. Pure scoring - no side effects; the alert generator sits on
//! top of this output.

mod types;

pub use types::{
    ChangeDetection, ChangePoint, ChangeType, ImageFeatureSample, ImagePair, PairValidation,
    TimeSeriesChange, Trend,
};

use crate::logic::geo::BoundingBox;

// Confidence weights: NDVI delta dominates, brightness and texture corroborate
const NDVI_WEIGHT: f64 = 0.5;
const BRIGHTNESS_WEIGHT: f64 = 0.3;
const TEXTURE_WEIGHT: f64 = 0.2;

// Normalization caps for each term
const NDVI_FULL_SCALE: f64 = 0.5;
const BRIGHTNESS_FULL_SCALE: f64 = 0.3;
const TEXTURE_FULL_SCALE: f64 = 0.3;

/// Minimum |ndvi delta| considered a change at all
const CHANGE_FLOOR: f64 = 0.1;

/// |ndvi delta| beyond which the change is directional (loss/gain)
const DIRECTIONAL_THRESHOLD: f64 = 0.2;

// ============================================================================
// PAIR DETECTION
// ============================================================================

/// Compare two observations over a region and classify the change.
pub fn detect_changes(
    before: &ImageFeatureSample,
    after: &ImageFeatureSample,
    region_bbox: &BoundingBox,
) -> ChangeDetection {
    let ndvi_change = after.ndvi - before.ndvi;
    let brightness_change = (after.brightness - before.brightness).abs();
    let texture_change = (after.texture - before.texture).abs();

    let change_type = if ndvi_change.abs() < CHANGE_FLOOR {
        ChangeType::NoChange
    } else if ndvi_change < -DIRECTIONAL_THRESHOLD {
        ChangeType::Deforestation
    } else if ndvi_change > DIRECTIONAL_THRESHOLD {
        ChangeType::Reforestation
    } else {
        ChangeType::Other
    };

    let confidence = (NDVI_WEIGHT * (ndvi_change.abs() / NDVI_FULL_SCALE).min(1.0)
        + BRIGHTNESS_WEIGHT * (brightness_change / BRIGHTNESS_FULL_SCALE).min(1.0)
        + TEXTURE_WEIGHT * (texture_change / TEXTURE_FULL_SCALE).min(1.0))
    .clamp(0.0, 1.0);

    ChangeDetection {
        has_change: ndvi_change.abs() > CHANGE_FLOOR,
        change_type,
        ndvi_change,
        brightness_change,
        texture_change,
        confidence,
        affected_area_ha: region_bbox.area_hectares() * ndvi_change.abs(),
    }
}

// ============================================================================
// TIME SERIES
// ============================================================================

/// Trend analysis over an ordered series of index samples.
///
/// Fewer than two samples yields a Stable/empty result rather than an error.
pub fn detect_time_series(
    samples: &[ImageFeatureSample],
    _region_bbox: &BoundingBox,
) -> TimeSeriesChange {
    if samples.len() < 2 {
        return TimeSeriesChange {
            trend: Trend::Stable,
            change_points: Vec::new(),
            overall_change: 0.0,
        };
    }

    let mut sorted: Vec<&ImageFeatureSample> = samples.iter().collect();
    sorted.sort_by_key(|s| s.timestamp);

    let change_points = sorted
        .windows(2)
        .map(|pair| ChangePoint {
            from: pair[0].timestamp,
            to: pair[1].timestamp,
            delta: pair[1].ndvi - pair[0].ndvi,
        })
        .collect();

    let overall_change = sorted[sorted.len() - 1].ndvi - sorted[0].ndvi;

    let trend = if overall_change > CHANGE_FLOOR {
        Trend::Increasing
    } else if overall_change < -CHANGE_FLOOR {
        Trend::Decreasing
    } else {
        Trend::Stable
    };

    TimeSeriesChange { trend, change_points, overall_change }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Validate an image pair, collecting every violation instead of failing
/// on the first one.
pub fn validate_pair(pair: &ImagePair) -> PairValidation {
    let mut errors = Vec::new();

    if pair.before_url.as_deref().map_or(true, str::is_empty) {
        errors.push("before image URL is missing".to_string());
    }
    if pair.after_url.as_deref().map_or(true, str::is_empty) {
        errors.push("after image URL is missing".to_string());
    }
    if pair.before_timestamp.is_none() {
        errors.push("before timestamp is missing".to_string());
    }
    if pair.after_timestamp.is_none() {
        errors.push("after timestamp is missing".to_string());
    }
    if let (Some(before), Some(after)) = (pair.before_timestamp, pair.after_timestamp) {
        if after <= before {
            errors.push("after timestamp must be later than before timestamp".to_string());
        }
    }

    PairValidation { valid: errors.is_empty(), errors }
}

// ============================================================================
// TESTS
// ============================================================================
