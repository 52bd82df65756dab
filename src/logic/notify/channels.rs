//! Channel Adapters
//!
//! One adapter per transport, all behind the same contract: `send` returns
//! a result value and never lets a provider error or panic escape. Missing
//! provider credentials make an adapter a logged no-op that reports
//! `success = false`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::types::{AlertSummary, Channel, ChannelSendResult, InAppNotification};
use crate::constants;
use crate::logic::store::AlertStore;

/// Uniform send contract for every transport
pub trait ChannelAdapter: Send + Sync {
    fn channel(&self) -> Channel;

    /// `target` is the channel address (email, phone, push token) - except
    /// for in-app, where it is the user id.
    fn send(&self, target: &str, summary: &AlertSummary) -> ChannelSendResult;
}

/// Shared provider endpoint configuration for the HTTP transports
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            api_url,
            api_key,
            timeout: Duration::from_secs(constants::get_channel_timeout_secs()),
        }
    }
}

/// POST a JSON payload to the provider; map the response/message id out.
fn post_json(
    config: &ProviderConfig,
    channel: Channel,
    payload: &serde_json::Value,
) -> ChannelSendResult {
    let Some(url) = config.api_url.as_deref() else {
        log::warn!("{} provider not configured, dropping notification", channel.as_str());
        return ChannelSendResult::failed("provider not configured");
    };

    let mut request = ureq::post(url)
        .timeout(config.timeout)
        .set("Content-Type", "application/json");
    if let Some(key) = config.api_key.as_deref() {
        request = request.set("Authorization", &format!("Bearer {}", key));
    }

    match request.send_string(&payload.to_string()) {
        Ok(resp) => {
            let message_id = resp.into_string().ok().and_then(|body| extract_message_id(&body));
            log::info!("{} notification sent", channel.as_str());
            ChannelSendResult::ok(message_id)
        }
        Err(e) => {
            log::error!("{} provider request failed: {}", channel.as_str(), e);
            ChannelSendResult::failed(e.to_string())
        }
    }
}

/// Pull a message id out of a provider response body, if one is present.
/// Non-JSON or id-less bodies are fine; the send still counts as delivered.
fn extract_message_id(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body).ok().and_then(|v| {
        v.get("message_id")
            .or_else(|| v.get("id"))
            .and_then(|id| id.as_str())
            .map(str::to_string)
    })
}

// ============================================================================
// EMAIL
// ============================================================================

pub struct EmailAdapter {
    config: ProviderConfig,
    from: String,
}

impl EmailAdapter {
    pub fn new(config: ProviderConfig, from: impl Into<String>) -> Self {
        Self { config, from: from.into() }
    }
}

impl ChannelAdapter for EmailAdapter {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn send(&self, target: &str, summary: &AlertSummary) -> ChannelSendResult {
        let payload = json!({
            "from": self.from,
            "to": target,
            "subject": summary.subject(),
            "text": summary.body(),
        });
        post_json(&self.config, Channel::Email, &payload)
    }
}

// ============================================================================
// SMS
// ============================================================================

pub struct SmsAdapter {
    config: ProviderConfig,
}

impl SmsAdapter {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl ChannelAdapter for SmsAdapter {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    fn send(&self, target: &str, summary: &AlertSummary) -> ChannelSendResult {
        // SMS is length-constrained; subject line only
        let payload = json!({
            "to": target,
            "message": summary.subject(),
        });
        post_json(&self.config, Channel::Sms, &payload)
    }
}

// ============================================================================
// WHATSAPP
// ============================================================================

pub struct WhatsAppAdapter {
    config: ProviderConfig,
}

impl WhatsAppAdapter {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl ChannelAdapter for WhatsAppAdapter {
    fn channel(&self) -> Channel {
        Channel::WhatsApp
    }

    fn send(&self, target: &str, summary: &AlertSummary) -> ChannelSendResult {
        let payload = json!({
            "to": target,
            "type": "text",
            "text": { "body": summary.body() },
        });
        post_json(&self.config, Channel::WhatsApp, &payload)
    }
}

// ============================================================================
// PUSH
// ============================================================================

pub struct PushAdapter {
    config: ProviderConfig,
}

impl PushAdapter {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl ChannelAdapter for PushAdapter {
    fn channel(&self) -> Channel {
        Channel::Push
    }

    fn send(&self, target: &str, summary: &AlertSummary) -> ChannelSendResult {
        let payload = json!({
            "token": target,
            "notification": {
                "title": summary.subject(),
                "body": summary.body(),
            },
            "data": {
                "alert_code": summary.alert_code,
                "severity": summary.severity.as_str(),
                "region_id": summary.region_id,
            },
        });
        post_json(&self.config, Channel::Push, &payload)
    }
}

// ============================================================================
// IN-APP
// ============================================================================

/// Materialises a notification row for the UI's notification center.
/// The only channel whose dispatch record is itself persisted.
pub struct InAppAdapter {
    store: Arc<dyn AlertStore>,
}

impl InAppAdapter {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }
}

impl ChannelAdapter for InAppAdapter {
    fn channel(&self) -> Channel {
        Channel::InApp
    }

    fn send(&self, target: &str, summary: &AlertSummary) -> ChannelSendResult {
        let notification = InAppNotification {
            id: Uuid::new_v4(),
            user_id: target.to_string(),
            alert_code: summary.alert_code.clone(),
            title: summary.subject(),
            body: summary.body(),
            severity: summary.severity,
            created_at: Utc::now(),
        };

        match self.store.insert_in_app(&notification) {
            Ok(()) => ChannelSendResult::ok(Some(notification.id.to_string())),
            Err(e) => {
                log::error!("Failed to store in-app notification: {}", e);
                ChannelSendResult::failed(e.to_string())
            }
        }
    }
}

/// Build the standard adapter set from environment-configured providers.
pub fn default_adapters(store: Arc<dyn AlertStore>) -> Vec<Box<dyn ChannelAdapter>> {
    let key = |name: &str| std::env::var(name).ok();

    vec![
        Box::new(EmailAdapter::new(
            ProviderConfig::new(constants::get_email_api_url(), key("CANOPY_EMAIL_API_KEY")),
            "alerts@canopy.example",
        )),
        Box::new(SmsAdapter::new(ProviderConfig::new(
            constants::get_sms_api_url(),
            key("CANOPY_SMS_API_KEY"),
        ))),
        Box::new(WhatsAppAdapter::new(ProviderConfig::new(
            constants::get_whatsapp_api_url(),
            key("CANOPY_WHATSAPP_API_KEY"),
        ))),
        Box::new(PushAdapter::new(ProviderConfig::new(
            constants::get_push_api_url(),
            key("CANOPY_PUSH_API_KEY"),
        ))),
        Box::new(InAppAdapter::new(store)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::Severity;
    use crate::logic::store::MemoryStore;

    fn summary() -> AlertSummary {
        AlertSummary {
            alert_code: "ALERT-20260829-0001".to_string(),
            region_id: "r1".to_string(),
            district: Some("Alto Rio".to_string()),
            severity: Severity::High,
            confidence: 0.87,
            area_hectares: 4.5,
            detected_date: Utc::now(),
            latitude: -9.95,
            longitude: -49.95,
        }
    }

    #[test]
    fn test_unconfigured_provider_is_noop_failure() {
        let adapter = EmailAdapter::new(ProviderConfig::new(None, None), "alerts@canopy.example");
        let result = adapter.send("ranger@example.org", &summary());
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("not configured"));
    }

    #[test]
    fn test_in_app_materialises_record() {
        let store = Arc::new(MemoryStore::new());
        let adapter = InAppAdapter::new(store.clone());

        let result = adapter.send("user-7", &summary());
        assert!(result.success);
        assert!(result.message_id.is_some());

        let rows = store.in_app_notifications();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "user-7");
        assert_eq!(rows[0].alert_code, "ALERT-20260829-0001");
    }

    #[test]
    fn test_message_id_extraction() {
        assert_eq!(extract_message_id(r#"{"message_id":"m-1"}"#).as_deref(), Some("m-1"));
        assert_eq!(extract_message_id(r#"{"id":"abc","status":"queued"}"#).as_deref(), Some("abc"));
        assert!(extract_message_id(r#"{"status":"queued"}"#).is_none());
        assert!(extract_message_id("OK").is_none());
    }

    #[test]
    fn test_summary_formatting() {
        let s = summary();
        assert!(s.subject().contains("[HIGH]"));
        assert!(s.subject().contains("ALERT-20260829-0001"));
        assert!(s.body().contains("Alto Rio"));
        assert!(s.body().contains("87%"));
    }
}
