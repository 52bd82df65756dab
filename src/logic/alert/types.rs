//! Alert Types
//!
//! The Alert is the one durable entity this pipeline produces. It is created
//! exactly once by the generator; status transitions, verification and
//! reassignment afterwards belong to the workflow layer in the web app.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    DEFAULT_ALERT_MIN_AREA_HA, DEFAULT_ALERT_MIN_CONFIDENCE, DEFAULT_CODE_RETRY_LIMIT,
};
use crate::logic::geo::{GeoPoint, GeoPolygon};
use crate::logic::model::Severity;

/// Lifecycle status. The pipeline only ever writes `Pending` (or
/// `InProgress` when auto-assignment succeeds at creation time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    Pending,
    InProgress,
    Verified,
    Resolved,
    FalsePositive,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "pending",
            AlertStatus::InProgress => "in_progress",
            AlertStatus::Verified => "verified",
            AlertStatus::Resolved => "resolved",
            AlertStatus::FalsePositive => "false_positive",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "in_progress" => AlertStatus::InProgress,
            "verified" => AlertStatus::Verified,
            "resolved" => AlertStatus::Resolved,
            "false_positive" => AlertStatus::FalsePositive,
            _ => AlertStatus::Pending,
        }
    }

    /// Statuses counted as a responder's current load
    pub fn is_open(&self) -> bool {
        matches!(self, AlertStatus::Pending | AlertStatus::InProgress)
    }
}

/// Durable deforestation alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Stable internal identity
    pub id: Uuid,
    /// Human-readable code, ALERT-YYYYMMDD-NNNN; unique, store-enforced
    pub alert_code: String,
    pub region_id: String,
    /// Bbox centroid
    pub latitude: f64,
    pub longitude: f64,
    /// Bbox as a closed polygon ring
    pub geometry: GeoPolygon,
    pub area_hectares: f64,
    pub confidence: f64,
    pub severity: Severity,
    pub status: AlertStatus,
    /// Triage ordering, 1-10, monotonic in severity
    pub priority: u8,
    pub detected_date: DateTime<Utc>,
    pub ndvi_change: Option<f64>,
    pub brightness_change: Option<f64>,
    pub assigned_to: Option<String>,
    pub image_id: Option<String>,
}

impl Alert {
    pub fn point(&self) -> GeoPoint {
        GeoPoint { lon: self.longitude, lat: self.latitude }
    }
}

/// Per-instance severity thresholds for alert synthesis.
///
/// Note these are stricter than the model's detection bands: an alert rates
/// High at 0.85 where a detection already rates High at 0.8.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self { critical: 0.9, high: 0.85, medium: 0.7 }
    }
}

impl SeverityThresholds {
    pub fn classify(&self, confidence: f64) -> Severity {
        if confidence >= self.critical {
            Severity::Critical
        } else if confidence >= self.high {
            Severity::High
        } else if confidence >= self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Generator configuration
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Detections below this confidence are rejected (not an error)
    pub min_confidence: f64,
    /// Detections below this area (hectares) are rejected
    pub min_area_ha: f64,
    pub severity_thresholds: SeverityThresholds,
    /// Attempts at a unique alert code before a hard failure
    pub code_retry_limit: u32,
    /// Assign the least-loaded active responder at creation time
    pub auto_assign: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_ALERT_MIN_CONFIDENCE,
            min_area_ha: DEFAULT_ALERT_MIN_AREA_HA,
            severity_thresholds: SeverityThresholds::default(),
            code_retry_limit: DEFAULT_CODE_RETRY_LIMIT,
            auto_assign: false,
        }
    }
}

impl AlertConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self {
            min_confidence: crate::constants::get_alert_min_confidence(),
            ..Self::default()
        }
    }
}

/// Priority base by severity; a confidence bonus of floor(confidence * 2)
/// is added on top, capped at 10.
pub fn priority_for(severity: Severity, confidence: f64) -> u8 {
    let base: u8 = match severity {
        Severity::Critical => 10,
        Severity::High => 8,
        Severity::Medium => 6,
        Severity::Low => 4,
    };
    let bonus = (confidence.clamp(0.0, 1.0) * 2.0).floor() as u8;
    (base + bonus).min(10)
}
