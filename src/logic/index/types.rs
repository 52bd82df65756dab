//! Vegetation Index Types

use serde::{Deserialize, Serialize};

/// Result of a single NDVI computation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexResult {
    /// NDVI value, clamped to [-1, 1]
    pub value: f64,
    pub classification: VegetationClass,
    pub health: VegetationHealth,
}

/// Vegetation density class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VegetationClass {
    Water,
    Sparse,
    Moderate,
    Dense,
}

impl VegetationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VegetationClass::Water => "water",
            VegetationClass::Sparse => "sparse",
            VegetationClass::Moderate => "moderate",
            VegetationClass::Dense => "dense",
        }
    }
}

/// Vegetation health class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VegetationHealth {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl VegetationHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            VegetationHealth::Poor => "poor",
            VegetationHealth::Fair => "fair",
            VegetationHealth::Good => "good",
            VegetationHealth::Excellent => "excellent",
        }
    }
}

/// Delta between two time-stamped index values
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexChange {
    pub before: f64,
    pub after: f64,
    pub delta: f64,
    /// Delta relative to |before|, in percent; 0 when before is 0
    pub delta_percent: f64,
    pub severity: ChangeSeverity,
}

/// Severity bucket for an index change (loss direction only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChangeSeverity {
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl ChangeSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeSeverity::None => "none",
            ChangeSeverity::Low => "low",
            ChangeSeverity::Medium => "medium",
            ChangeSeverity::High => "high",
            ChangeSeverity::Critical => "critical",
        }
    }
}
