//! Central Configuration Constants
//!
//! Single source of truth for pipeline defaults.
//! To change a default threshold or provider endpoint, only edit this file.

/// Minimum confidence for the detection model to report a detection
pub const DEFAULT_MODEL_MIN_CONFIDENCE: f64 = 0.6;

/// Minimum confidence for an alert to be generated
pub const DEFAULT_ALERT_MIN_CONFIDENCE: f64 = 0.7;

/// Minimum affected area (hectares) for an alert to be generated
pub const DEFAULT_ALERT_MIN_AREA_HA: f64 = 0.1;

/// Maximum attempts at a unique alert code before giving up
pub const DEFAULT_CODE_RETRY_LIMIT: u32 = 5;

/// Per-channel provider request timeout (seconds)
pub const DEFAULT_CHANNEL_TIMEOUT_SECS: u64 = 10;

/// Default NDVI drop threshold for `detect_loss`
pub const DEFAULT_LOSS_THRESHOLD: f64 = -0.2;

/// Metres per degree of latitude (spherical approximation)
pub const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Square metres per hectare
pub const SQM_PER_HECTARE: f64 = 10_000.0;

/// Raw reflectance scale factor (Sentinel-2 style digital numbers)
pub const REFLECTANCE_SCALE: f64 = 10_000.0;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Email provider endpoint from environment, or None (adapter becomes a no-op)
pub fn get_email_api_url() -> Option<String> {
    std::env::var("CANOPY_EMAIL_API_URL").ok()
}

/// SMS provider endpoint from environment, or None
pub fn get_sms_api_url() -> Option<String> {
    std::env::var("CANOPY_SMS_API_URL").ok()
}

/// WhatsApp provider endpoint from environment, or None
pub fn get_whatsapp_api_url() -> Option<String> {
    std::env::var("CANOPY_WHATSAPP_API_URL").ok()
}

/// Push provider endpoint from environment, or None
pub fn get_push_api_url() -> Option<String> {
    std::env::var("CANOPY_PUSH_API_URL").ok()
}

/// Channel timeout from environment or use default
pub fn get_channel_timeout_secs() -> u64 {
    std::env::var("CANOPY_CHANNEL_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_CHANNEL_TIMEOUT_SECS)
}

/// Alert minimum confidence from environment or use default
pub fn get_alert_min_confidence() -> f64 {
    std::env::var("CANOPY_ALERT_MIN_CONFIDENCE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_ALERT_MIN_CONFIDENCE)
}
