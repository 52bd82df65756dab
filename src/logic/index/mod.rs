//! Vegetation Index Service
//!
//! NDVI math and banded classification. Input bands may be raw reflectance
//! digital numbers or pre-normalized [0,1] values; anything > 1.0 is treated
//! as raw and scaled down.

mod types;

pub use types::{
    ChangeSeverity, IndexChange, IndexResult, VegetationClass, VegetationHealth,
};

use crate::constants::{DEFAULT_LOSS_THRESHOLD, REFLECTANCE_SCALE};

// ============================================================================
// COMPUTE
// ============================================================================

/// Compute NDVI from red and near-infrared band intensities.
///
/// Guards the zero denominator (open water / nodata) by returning a
/// zero-valued Water result instead of dividing.
pub fn compute(red: f64, nir: f64) -> IndexResult {
    let red = normalize_band(red);
    let nir = normalize_band(nir);

    if red + nir == 0.0 {
        return IndexResult {
            value: 0.0,
            classification: VegetationClass::Water,
            health: VegetationHealth::Poor,
        };
    }

    let value = ((nir - red) / (nir + red)).clamp(-1.0, 1.0);

    IndexResult {
        value,
        classification: classify(value),
        health: health_of(value),
    }
}

/// Scale raw reflectance digital numbers down to [0,1]; pass through values
/// that are already normalized.
fn normalize_band(v: f64) -> f64 {
    if v > 1.0 {
        v / REFLECTANCE_SCALE
    } else {
        v
    }
}

fn classify(value: f64) -> VegetationClass {
    if value < 0.0 {
        VegetationClass::Water
    } else if value < 0.3 {
        VegetationClass::Sparse
    } else if value < 0.6 {
        VegetationClass::Moderate
    } else {
        VegetationClass::Dense
    }
}

fn health_of(value: f64) -> VegetationHealth {
    if value < 0.2 {
        VegetationHealth::Poor
    } else if value < 0.4 {
        VegetationHealth::Fair
    } else if value < 0.7 {
        VegetationHealth::Good
    } else {
        VegetationHealth::Excellent
    }
}

// ============================================================================
// CHANGE
// ============================================================================

/// Compute the delta between two index values and bucket its severity.
///
/// Only the vegetation-loss direction is classified; positive deltas map to
/// `ChangeSeverity::None`.
pub fn compute_change(before: f64, after: f64) -> IndexChange {
    let delta = after - before;
    let delta_percent = if before.abs() == 0.0 {
        0.0
    } else {
        delta / before.abs() * 100.0
    };

    // Key severity to the more negative of absolute and relative delta
    let keyed = delta.min(delta_percent / 100.0);

    let severity = if keyed >= -0.1 {
        ChangeSeverity::None
    } else if keyed >= -0.2 {
        ChangeSeverity::Low
    } else if keyed >= -0.3 {
        ChangeSeverity::Medium
    } else if keyed >= -0.5 {
        ChangeSeverity::High
    } else {
        ChangeSeverity::Critical
    };

    IndexChange {
        before,
        after,
        delta,
        delta_percent,
        severity,
    }
}

/// Vegetation loss gate: requires both a significant drop and a resulting
/// low-vegetation state. A high-to-still-high fluctuation is not a loss.
pub fn detect_loss(before: f64, after: f64, threshold: Option<f64>) -> bool {
    let threshold = threshold.unwrap_or(DEFAULT_LOSS_THRESHOLD);
    (after - before) < threshold && after < 0.3
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_denominator_is_water() {
        let r = compute(0.0, 0.0);
        assert_eq!(r.value, 0.0);
        assert_eq!(r.classification, VegetationClass::Water);
    }

    #[test]
    fn test_value_in_range() {
        for (red, nir) in [(0.1, 0.9), (0.9, 0.1), (0.5, 0.5), (1.0, 0.0)] {
            let r = compute(red, nir);
            assert!(r.value >= -1.0 && r.value <= 1.0, "out of range for ({}, {})", red, nir);
        }
    }

    #[test]
    fn test_raw_reflectance_scaled() {
        // Sentinel-style digital numbers: 2000 red, 6000 nir
        let r = compute(2000.0, 6000.0);
        let expected = (0.6 - 0.2) / (0.6 + 0.2);
        assert!((r.value - expected).abs() < 1e-9);
        assert_eq!(r.classification, VegetationClass::Moderate);
    }

    #[test]
    fn test_classification_bands() {
        assert_eq!(compute(0.9, 0.1).classification, VegetationClass::Water);
        assert_eq!(compute(0.45, 0.55).classification, VegetationClass::Sparse);
        assert_eq!(compute(0.3, 0.7).classification, VegetationClass::Moderate);
        assert_eq!(compute(0.1, 0.9).classification, VegetationClass::Dense);
    }

    #[test]
    fn test_health_bands() {
        assert_eq!(compute(0.45, 0.55).health, VegetationHealth::Poor); // 0.1
        assert_eq!(compute(0.35, 0.65).health, VegetationHealth::Fair); // 0.3
        assert_eq!(compute(0.3, 0.7).health, VegetationHealth::Good); // 0.4
        assert_eq!(compute(0.1, 0.9).health, VegetationHealth::Excellent); // 0.8
    }

    #[test]
    fn test_change_zero_before_is_not_an_error() {
        let c = compute_change(0.0, 0.4);
        assert_eq!(c.delta_percent, 0.0);
        assert_eq!(c.severity, ChangeSeverity::None);
    }

    #[test]
    fn test_change_severity_bands() {
        assert_eq!(compute_change(0.6, 0.55).severity, ChangeSeverity::None);
        // Relative delta dominates when the baseline is low
        assert_eq!(compute_change(1.0, 0.85).severity, ChangeSeverity::Low);
        assert_eq!(compute_change(1.0, 0.75).severity, ChangeSeverity::Medium);
        assert_eq!(compute_change(0.9, 0.45).severity, ChangeSeverity::High);
        assert_eq!(compute_change(0.9, 0.3).severity, ChangeSeverity::Critical);
    }

    #[test]
    fn test_positive_delta_maps_to_none() {
        assert_eq!(compute_change(0.2, 0.8).severity, ChangeSeverity::None);
    }

    #[test]
    fn test_detect_loss_requires_both_conditions() {
        // Drop of 0.35 and resulting state below 0.3 => loss
        assert!(detect_loss(0.6, 0.25, None));
        // Drop insufficient
        assert!(!detect_loss(0.6, 0.45, None));
        // Big drop but still dense vegetation
        assert!(!detect_loss(0.95, 0.65, None));
    }
}
