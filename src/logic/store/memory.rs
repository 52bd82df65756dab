//! In-memory reference store
//!
//! HashMap-backed, parking_lot-guarded. Used as the test fixture and for
//! embeddings that do not need durability.

use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::RwLock;

use super::{AlertStore, Region, RegionDirectory, SubscriptionStore, UserDirectory};
use crate::error::StoreError;
use crate::logic::alert::Alert;
use crate::logic::notify::{Contact, InAppNotification, Subscription};

/// In-memory alert + subscription store
#[derive(Default)]
pub struct MemoryStore {
    alerts: RwLock<Vec<Alert>>,
    in_app: RwLock<Vec<InAppNotification>>,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subscription(&self, sub: Subscription) {
        self.subscriptions.write().push(sub);
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.read().clone()
    }

    pub fn in_app_notifications(&self) -> Vec<InAppNotification> {
        self.in_app.read().clone()
    }
}

impl AlertStore for MemoryStore {
    fn insert(&self, alert: &Alert) -> Result<(), StoreError> {
        let mut alerts = self.alerts.write();
        if alerts.iter().any(|a| a.alert_code == alert.alert_code) {
            return Err(StoreError::DuplicateCode { code: alert.alert_code.clone() });
        }
        alerts.push(alert.clone());
        Ok(())
    }

    fn count_on_day(&self, day: NaiveDate) -> Result<u64, StoreError> {
        let count = self
            .alerts
            .read()
            .iter()
            .filter(|a| a.detected_date.date_naive() == day)
            .count();
        Ok(count as u64)
    }

    fn count_open_for(&self, user_id: &str) -> Result<u64, StoreError> {
        let count = self
            .alerts
            .read()
            .iter()
            .filter(|a| a.status.is_open() && a.assigned_to.as_deref() == Some(user_id))
            .count();
        Ok(count as u64)
    }

    fn find_by_code(&self, code: &str) -> Result<Option<Alert>, StoreError> {
        Ok(self.alerts.read().iter().find(|a| a.alert_code == code).cloned())
    }

    fn insert_in_app(&self, notification: &InAppNotification) -> Result<(), StoreError> {
        self.in_app.write().push(notification.clone());
        Ok(())
    }
}

impl SubscriptionStore for MemoryStore {
    fn active_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        Ok(self.subscriptions.read().iter().filter(|s| s.active).cloned().collect())
    }
}

/// Fixed region directory
#[derive(Default)]
pub struct StaticRegions {
    regions: HashMap<String, Region>,
}

impl StaticRegions {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions: regions.into_iter().map(|r| (r.id.clone(), r)).collect() }
    }
}

impl RegionDirectory for StaticRegions {
    fn find(&self, region_id: &str) -> Option<Region> {
        self.regions.get(region_id).cloned()
    }
}

/// Fixed user directory
#[derive(Default)]
pub struct StaticUsers {
    contacts: HashMap<String, Contact>,
    responders: Vec<String>,
    privileged: Vec<String>,
}

impl StaticUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contact(mut self, user_id: &str, contact: Contact) -> Self {
        self.contacts.insert(user_id.to_string(), contact);
        self
    }

    pub fn with_responder(mut self, user_id: &str) -> Self {
        self.responders.push(user_id.to_string());
        self
    }

    pub fn with_privileged(mut self, user_id: &str) -> Self {
        self.privileged.push(user_id.to_string());
        self
    }
}

impl UserDirectory for StaticUsers {
    fn find_contact(&self, user_id: &str) -> Option<Contact> {
        self.contacts.get(user_id).cloned()
    }

    fn active_responders(&self) -> Vec<String> {
        self.responders.clone()
    }

    fn active_privileged(&self) -> Vec<String> {
        self.privileged.clone()
    }
}
