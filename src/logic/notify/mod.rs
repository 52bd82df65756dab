//! Notification Service
//!
//! Resolves a user's contact record once, then dispatches through the
//! per-channel adapters with bulkhead isolation: every attempted channel
//! runs on its own thread, a slow or failing channel never blocks or fails
//! its siblings, and a panic inside an adapter is captured into that
//! channel's result. Overall success is an inclusive OR.

pub mod channels;
mod outbox;
mod types;

pub use channels::{
    default_adapters, ChannelAdapter, EmailAdapter, InAppAdapter, ProviderConfig, PushAdapter,
    SmsAdapter, WhatsAppAdapter,
};
pub use outbox::{Outbox, OutboxHandle};
pub use types::{
    AlertSummary, Channel, ChannelSendResult, Contact, InAppNotification, NotificationOutcome,
    Subscription,
};

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::logic::alert::Alert;
use crate::logic::model::Severity;
use crate::logic::store::{RegionDirectory, SubscriptionStore, UserDirectory};

// ============================================================================
// REPORTING
// ============================================================================

/// Outcome of one `send` call for one recipient
#[derive(Debug, Clone, Serialize)]
pub struct UserOutcome {
    pub user_id: String,
    pub outcome: NotificationOutcome,
}

/// Everything that happened downstream of one alert
#[derive(Debug, Clone, Serialize, Default)]
pub struct AlertNotifyReport {
    pub privileged: Vec<UserOutcome>,
    pub subscribers: Vec<UserOutcome>,
}

/// Running dispatch counters, per channel
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ChannelStats {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Aggregate dispatch statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotifyStats {
    pub per_channel: HashMap<Channel, ChannelStats>,
}

// ============================================================================
// SERVICE
// ============================================================================

/// Multi-channel notification service. Construct one per process and pass
/// it explicitly - collaborators are trait objects, not globals.
pub struct Notifier {
    users: Arc<dyn UserDirectory>,
    subscriptions: Arc<dyn SubscriptionStore>,
    regions: Arc<dyn RegionDirectory>,
    adapters: HashMap<Channel, Box<dyn ChannelAdapter>>,
    stats: Mutex<NotifyStats>,
}

/// Channels used to reach admin/government users on high-severity alerts;
/// the two transports that need no opt-in provisioning beyond a contact row.
const PRIVILEGED_CHANNELS: [Channel; 2] = [Channel::Email, Channel::InApp];

impl Notifier {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        subscriptions: Arc<dyn SubscriptionStore>,
        regions: Arc<dyn RegionDirectory>,
        adapters: Vec<Box<dyn ChannelAdapter>>,
    ) -> Self {
        let adapters = adapters.into_iter().map(|a| (a.channel(), a)).collect();
        Self {
            users,
            subscriptions,
            regions,
            adapters,
            stats: Mutex::new(NotifyStats::default()),
        }
    }

    /// Dispatch an alert summary to one user over the requested channels.
    ///
    /// Channels whose contact field is missing are skipped, not attempted;
    /// they do not appear in the result map. Attempted channels run
    /// concurrently and fail independently.
    pub fn send(
        &self,
        user_id: &str,
        requested: &[Channel],
        summary: &AlertSummary,
    ) -> NotificationOutcome {
        let Some(contact) = self.users.find_contact(user_id) else {
            log::warn!("No contact record for user {}, nothing sent", user_id);
            return NotificationOutcome::empty();
        };

        // Resolve targets up front; dedupe repeated channel requests
        let mut planned: Vec<(Channel, &dyn ChannelAdapter, String)> = Vec::new();
        for &channel in requested {
            if planned.iter().any(|(c, _, _)| *c == channel) {
                continue;
            }
            let Some(adapter) = self.adapters.get(&channel) else {
                log::debug!("No adapter registered for {}, skipping", channel.as_str());
                continue;
            };
            let target = match channel {
                Channel::InApp => Some(user_id.to_string()),
                _ => contact.address_for(channel),
            };
            match target {
                Some(target) => planned.push((channel, adapter.as_ref(), target)),
                None => {
                    log::debug!(
                        "User {} has no {} contact on file, skipping",
                        user_id,
                        channel.as_str()
                    );
                }
            }
        }

        // Bulkhead: one thread per channel, panics captured per channel
        let mut results: HashMap<Channel, ChannelSendResult> = HashMap::new();
        std::thread::scope(|scope| {
            let handles: Vec<_> = planned
                .iter()
                .map(|(channel, adapter, target)| {
                    let handle = scope.spawn(move || {
                        catch_unwind(AssertUnwindSafe(|| adapter.send(target, summary)))
                            .unwrap_or_else(|_| {
                                log::error!("{} adapter panicked", channel.as_str());
                                ChannelSendResult::failed("channel adapter panicked")
                            })
                    });
                    (*channel, handle)
                })
                .collect();

            for (channel, handle) in handles {
                let result = handle.join().unwrap_or_else(|_| {
                    ChannelSendResult::failed("channel dispatch thread panicked")
                });
                results.insert(channel, result);
            }
        });

        self.record_stats(&results);

        NotificationOutcome {
            success: results.values().any(|r| r.success),
            results,
        }
    }

    /// Fan an alert out to every matching active subscriber.
    ///
    /// A subscription matches when its region filter contains the alert's
    /// region (empty filter = all regions) and its minimum severity is at
    /// or below the alert's severity.
    pub fn notify_subscribers(&self, alert: &Alert) -> Vec<UserOutcome> {
        let district = match self.regions.find(&alert.region_id) {
            Some(region) => Some(region.district),
            None => {
                log::warn!("Alert {} references unknown region {}", alert.alert_code, alert.region_id);
                None
            }
        };
        let summary = AlertSummary::from_alert(alert, district);

        let subscriptions = match self.subscriptions.active_subscriptions() {
            Ok(subs) => subs,
            Err(e) => {
                log::error!("Subscription lookup failed: {}", e);
                return Vec::new();
            }
        };

        subscriptions
            .iter()
            .filter(|sub| sub.matches(&alert.region_id, alert.severity))
            .map(|sub| UserOutcome {
                user_id: sub.user_id.clone(),
                outcome: self.send(&sub.user_id, &sub.channels, &summary),
            })
            .collect()
    }

    /// Notify admin/government users. Only fires for High/Critical alerts.
    pub fn notify_privileged(&self, alert: &Alert) -> Vec<UserOutcome> {
        if alert.severity < Severity::High {
            return Vec::new();
        }

        let district = self.regions.find(&alert.region_id).map(|r| r.district);
        let summary = AlertSummary::from_alert(alert, district);

        self.users
            .active_privileged()
            .iter()
            .map(|user_id| UserOutcome {
                user_id: user_id.clone(),
                outcome: self.send(user_id, &PRIVILEGED_CHANNELS, &summary),
            })
            .collect()
    }

    /// Full post-persist fan-out for one alert: privileged roles first,
    /// then the subscriber base (subscribers self-filter by min severity).
    pub fn notify_alert(&self, alert: &Alert) -> AlertNotifyReport {
        AlertNotifyReport {
            privileged: self.notify_privileged(alert),
            subscribers: self.notify_subscribers(alert),
        }
    }

    pub fn stats(&self) -> NotifyStats {
        self.stats.lock().clone()
    }

    fn record_stats(&self, results: &HashMap<Channel, ChannelSendResult>) {
        let mut stats = self.stats.lock();
        for (channel, result) in results {
            let entry = stats.per_channel.entry(*channel).or_default();
            entry.attempted += 1;
            if result.success {
                entry.succeeded += 1;
            } else {
                entry.failed += 1;
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::alert::AlertStatus;
    use crate::logic::geo::BoundingBox;
    use crate::logic::store::{MemoryStore, Region, StaticRegions, StaticUsers};
    use chrono::Utc;
    use parking_lot::Mutex as PlMutex;
    use uuid::Uuid;

    /// Adapter that records targets and answers with a fixed result
    struct FakeAdapter {
        channel: Channel,
        succeed: bool,
        sent_to: PlMutex<Vec<String>>,
    }

    impl FakeAdapter {
        fn new(channel: Channel, succeed: bool) -> Self {
            Self { channel, succeed, sent_to: PlMutex::new(Vec::new()) }
        }
    }

    impl ChannelAdapter for FakeAdapter {
        fn channel(&self) -> Channel {
            self.channel
        }

        fn send(&self, target: &str, _summary: &AlertSummary) -> ChannelSendResult {
            self.sent_to.lock().push(target.to_string());
            if self.succeed {
                ChannelSendResult::ok(Some("msg-1".to_string()))
            } else {
                ChannelSendResult::failed("provider unreachable")
            }
        }
    }

    struct PanickingAdapter;

    impl ChannelAdapter for PanickingAdapter {
        fn channel(&self) -> Channel {
            Channel::Push
        }

        fn send(&self, _target: &str, _summary: &AlertSummary) -> ChannelSendResult {
            panic!("provider client bug")
        }
    }

    fn region() -> Region {
        Region {
            id: "r1".to_string(),
            district: "Alto Rio".to_string(),
            boundary: BoundingBox::new(-51.0, -11.0, -49.0, -9.0),
        }
    }

    fn alert(severity: Severity) -> Alert {
        let bbox = BoundingBox::new(-50.0, -10.0, -49.9, -9.9);
        Alert {
            id: Uuid::new_v4(),
            alert_code: "ALERT-20260829-0001".to_string(),
            region_id: "r1".to_string(),
            latitude: -9.95,
            longitude: -49.95,
            geometry: bbox.to_polygon(),
            area_hectares: 3.5,
            confidence: 0.88,
            severity,
            status: AlertStatus::Pending,
            priority: 9,
            detected_date: Utc::now(),
            ndvi_change: Some(-0.35),
            brightness_change: None,
            assigned_to: None,
            image_id: None,
        }
    }

    fn summary() -> AlertSummary {
        AlertSummary::from_alert(&alert(Severity::High), Some("Alto Rio".to_string()))
    }

    fn full_contact() -> Contact {
        Contact {
            email: Some("u@example.org".to_string()),
            phone: Some("+5511999990000".to_string()),
            push_token: None,
        }
    }

    #[test]
    fn test_channel_failure_is_isolated() {
        let users = Arc::new(StaticUsers::new().with_contact("u1", full_contact()));
        let store = Arc::new(MemoryStore::new());
        let regions = Arc::new(StaticRegions::new(vec![region()]));

        let notifier = Notifier::new(
            users,
            store,
            regions,
            vec![
                Box::new(FakeAdapter::new(Channel::Email, true)),
                Box::new(FakeAdapter::new(Channel::Sms, false)),
            ],
        );

        let outcome = notifier.send("u1", &[Channel::Email, Channel::Sms], &summary());
        assert!(outcome.success);
        assert!(outcome.results[&Channel::Email].success);
        assert!(!outcome.results[&Channel::Sms].success);
        assert!(outcome.results[&Channel::Sms].error.is_some());
    }

    #[test]
    fn test_missing_contact_field_skips_channel() {
        let contact = Contact {
            email: Some("u@example.org".to_string()),
            phone: None,
            push_token: None,
        };
        let users = Arc::new(StaticUsers::new().with_contact("u1", contact));
        let store = Arc::new(MemoryStore::new());
        let regions = Arc::new(StaticRegions::new(vec![region()]));

        let notifier = Notifier::new(
            users,
            store,
            regions,
            vec![
                Box::new(FakeAdapter::new(Channel::Email, true)),
                Box::new(FakeAdapter::new(Channel::Sms, true)),
            ],
        );

        let outcome = notifier.send("u1", &[Channel::Email, Channel::Sms], &summary());
        assert!(outcome.success);
        // SMS was never attempted, so it is absent from the result map
        assert!(outcome.results.contains_key(&Channel::Email));
        assert!(!outcome.results.contains_key(&Channel::Sms));
    }

    #[test]
    fn test_adapter_panic_captured() {
        let users = Arc::new(
            StaticUsers::new().with_contact(
                "u1",
                Contact {
                    email: Some("u@example.org".to_string()),
                    phone: None,
                    push_token: Some("tok-1".to_string()),
                },
            ),
        );
        let store = Arc::new(MemoryStore::new());
        let regions = Arc::new(StaticRegions::new(vec![region()]));

        let notifier = Notifier::new(
            users,
            store,
            regions,
            vec![
                Box::new(FakeAdapter::new(Channel::Email, true)),
                Box::new(PanickingAdapter),
            ],
        );

        let outcome = notifier.send("u1", &[Channel::Push, Channel::Email], &summary());
        assert!(outcome.success);
        assert!(!outcome.results[&Channel::Push].success);
        assert!(outcome.results[&Channel::Email].success);
    }

    #[test]
    fn test_subscriber_filtering() {
        let users = Arc::new(
            StaticUsers::new()
                .with_contact("sub-high", full_contact())
                .with_contact("sub-wildcard", full_contact())
                .with_contact("sub-other-region", full_contact()),
        );
        let store = Arc::new(MemoryStore::new());
        store.add_subscription(Subscription {
            user_id: "sub-high".to_string(),
            channels: vec![Channel::Email],
            min_severity: Severity::High,
            region_ids: vec!["r1".to_string()],
            active: true,
        });
        store.add_subscription(Subscription {
            user_id: "sub-wildcard".to_string(),
            channels: vec![Channel::Email],
            min_severity: Severity::Low,
            region_ids: vec![],
            active: true,
        });
        store.add_subscription(Subscription {
            user_id: "sub-other-region".to_string(),
            channels: vec![Channel::Email],
            min_severity: Severity::Low,
            region_ids: vec!["r9".to_string()],
            active: true,
        });

        let regions = Arc::new(StaticRegions::new(vec![region()]));
        let notifier = Notifier::new(
            users,
            store,
            regions,
            vec![Box::new(FakeAdapter::new(Channel::Email, true))],
        );

        // Medium severity: the High-threshold subscriber is excluded, the
        // wildcard-region subscriber is included regardless of region
        let outcomes = notifier.notify_subscribers(&alert(Severity::Medium));
        let ids: Vec<&str> = outcomes.iter().map(|o| o.user_id.as_str()).collect();
        assert_eq!(ids, vec!["sub-wildcard"]);
    }

    #[test]
    fn test_privileged_only_on_high_severity() {
        let users = Arc::new(
            StaticUsers::new()
                .with_contact("admin-1", full_contact())
                .with_privileged("admin-1"),
        );
        let store = Arc::new(MemoryStore::new());
        let regions = Arc::new(StaticRegions::new(vec![region()]));

        let notifier = Notifier::new(
            users,
            store.clone(),
            regions,
            vec![
                Box::new(FakeAdapter::new(Channel::Email, true)),
                Box::new(InAppAdapter::new(store.clone())),
            ],
        );

        assert!(notifier.notify_privileged(&alert(Severity::Medium)).is_empty());

        let outcomes = notifier.notify_privileged(&alert(Severity::Critical));
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].outcome.success);
        // The in-app channel materialised a notification row
        assert_eq!(store.in_app_notifications().len(), 1);
    }

    #[test]
    fn test_stats_accumulate() {
        let users = Arc::new(StaticUsers::new().with_contact("u1", full_contact()));
        let store = Arc::new(MemoryStore::new());
        let regions = Arc::new(StaticRegions::new(vec![region()]));

        let notifier = Notifier::new(
            users,
            store,
            regions,
            vec![
                Box::new(FakeAdapter::new(Channel::Email, true)),
                Box::new(FakeAdapter::new(Channel::Sms, false)),
            ],
        );

        notifier.send("u1", &[Channel::Email, Channel::Sms], &summary());
        notifier.send("u1", &[Channel::Email], &summary());

        let stats = notifier.stats();
        assert_eq!(stats.per_channel[&Channel::Email].attempted, 2);
        assert_eq!(stats.per_channel[&Channel::Email].succeeded, 2);
        assert_eq!(stats.per_channel[&Channel::Sms].failed, 1);
    }

    #[test]
    fn test_outbox_drains_on_shutdown() {
        let users = Arc::new(
            StaticUsers::new()
                .with_contact("admin-1", full_contact())
                .with_privileged("admin-1"),
        );
        let store = Arc::new(MemoryStore::new());
        let regions = Arc::new(StaticRegions::new(vec![region()]));

        let notifier = Arc::new(Notifier::new(
            users,
            store.clone(),
            regions,
            vec![Box::new(InAppAdapter::new(store.clone()))],
        ));

        let outbox = Outbox::spawn(notifier);
        outbox.handle().enqueue(alert(Severity::Critical));
        outbox.handle().enqueue(alert(Severity::Critical));
        outbox.shutdown();

        // Both jobs were processed before the worker stopped
        assert_eq!(store.in_app_notifications().len(), 2);
    }
}
