//! Notification Types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::alert::Alert;
use crate::logic::model::Severity;

/// One notification transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Email,
    Sms,
    WhatsApp,
    Push,
    InApp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::WhatsApp => "whatsapp",
            Channel::Push => "push",
            Channel::InApp => "in_app",
        }
    }
}

/// Resolved contact record for a user (owned by the account layer)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub push_token: Option<String>,
}

impl Contact {
    /// Address for a channel, if the required field is on file.
    /// In-app needs nothing beyond the user id itself.
    pub fn address_for(&self, channel: Channel) -> Option<String> {
        match channel {
            Channel::Email => self.email.clone(),
            Channel::Sms | Channel::WhatsApp => self.phone.clone(),
            Channel::Push => self.push_token.clone(),
            Channel::InApp => Some(String::new()),
        }
    }
}

/// A user's standing preference to receive alerts (owned by the account
/// layer, consumed read-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: String,
    pub channels: Vec<Channel>,
    pub min_severity: Severity,
    /// Empty = all regions
    pub region_ids: Vec<String>,
    pub active: bool,
}

impl Subscription {
    /// Does this subscription match the given region and severity?
    pub fn matches(&self, region_id: &str, severity: Severity) -> bool {
        if !self.active {
            return false;
        }
        if self.min_severity > severity {
            return false;
        }
        self.region_ids.is_empty() || self.region_ids.iter().any(|r| r == region_id)
    }
}

/// Per-attempt dispatch record; never persisted except in_app, which the
/// adapter materialises as a notification row for the UI layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSendResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl ChannelSendResult {
    pub fn ok(message_id: Option<String>) -> Self {
        Self { success: true, message_id, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, message_id: None, error: Some(error.into()) }
    }
}

/// Aggregated outcome of one `send` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationOutcome {
    /// True if any channel succeeded (inclusive OR)
    pub success: bool,
    pub results: HashMap<Channel, ChannelSendResult>,
}

impl NotificationOutcome {
    pub fn empty() -> Self {
        Self { success: false, results: HashMap::new() }
    }
}

/// What the channels actually transmit: a compact, provider-agnostic
/// summary of the alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSummary {
    pub alert_code: String,
    pub region_id: String,
    pub district: Option<String>,
    pub severity: Severity,
    pub confidence: f64,
    pub area_hectares: f64,
    pub detected_date: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
}

impl AlertSummary {
    pub fn from_alert(alert: &Alert, district: Option<String>) -> Self {
        Self {
            alert_code: alert.alert_code.clone(),
            region_id: alert.region_id.clone(),
            district,
            severity: alert.severity,
            confidence: alert.confidence,
            area_hectares: alert.area_hectares,
            detected_date: alert.detected_date,
            latitude: alert.latitude,
            longitude: alert.longitude,
        }
    }

    /// Short subject line, e.g. for email/push titles
    pub fn subject(&self) -> String {
        format!(
            "{} Deforestation alert {} ({:.1} ha)",
            self.severity.tag(),
            self.alert_code,
            self.area_hectares
        )
    }

    /// Plain-text body shared by the text-oriented channels
    pub fn body(&self) -> String {
        let place = self
            .district
            .as_deref()
            .map(|d| format!("{} ({})", d, self.region_id))
            .unwrap_or_else(|| self.region_id.clone());
        format!(
            "Deforestation detected in {} on {}. Severity: {}, confidence {:.0}%, \
             affected area {:.2} ha, at ({:.5}, {:.5}).",
            place,
            self.detected_date.format("%Y-%m-%d"),
            self.severity.as_str(),
            self.confidence * 100.0,
            self.area_hectares,
            self.latitude,
            self.longitude,
        )
    }
}

/// An in-app notification row handed to the store for the UI's
/// notification center
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InAppNotification {
    pub id: uuid::Uuid,
    pub user_id: String,
    pub alert_code: String,
    pub title: String,
    pub body: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_matching() {
        let sub = Subscription {
            user_id: "u1".to_string(),
            channels: vec![Channel::Email],
            min_severity: Severity::High,
            region_ids: vec!["r1".to_string()],
            active: true,
        };

        assert!(sub.matches("r1", Severity::High));
        assert!(sub.matches("r1", Severity::Critical));
        assert!(!sub.matches("r1", Severity::Medium));
        assert!(!sub.matches("r2", Severity::Critical));
    }

    #[test]
    fn test_wildcard_region() {
        let sub = Subscription {
            user_id: "u1".to_string(),
            channels: vec![Channel::Sms],
            min_severity: Severity::Low,
            region_ids: vec![],
            active: true,
        };
        assert!(sub.matches("anything", Severity::Low));
    }

    #[test]
    fn test_inactive_never_matches() {
        let sub = Subscription {
            user_id: "u1".to_string(),
            channels: vec![Channel::Email],
            min_severity: Severity::Low,
            region_ids: vec![],
            active: false,
        };
        assert!(!sub.matches("r1", Severity::Critical));
    }

    #[test]
    fn test_contact_address_resolution() {
        let contact = Contact {
            email: Some("ranger@example.org".to_string()),
            phone: None,
            push_token: None,
        };
        assert!(contact.address_for(Channel::Email).is_some());
        assert!(contact.address_for(Channel::Sms).is_none());
        assert!(contact.address_for(Channel::WhatsApp).is_none());
        assert!(contact.address_for(Channel::InApp).is_some());
    }
}
