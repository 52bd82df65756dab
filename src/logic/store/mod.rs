//! Store Module - External Collaborator Boundary
//!
//! The pipeline consumes a region lookup, a user/responder directory and a
//! persistence store owned by the surrounding web application. These traits
//! are that contract; `MemoryStore` and `SqliteStore` are reference
//! implementations (the memory store doubles as the test fixture).
//!
//! The store is the pipeline's sole serialization point: alert-code
//! uniqueness is enforced here, not with in-process locking, because
//! generation may span multiple processes.

mod memory;
mod sqlite;

pub use memory::{MemoryStore, StaticRegions, StaticUsers};
pub use sqlite::SqliteStore;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::logic::alert::Alert;
use crate::logic::geo::BoundingBox;
use crate::logic::notify::{Contact, InAppNotification, Subscription};

/// A monitored region (owned by the region directory)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub district: String,
    pub boundary: BoundingBox,
}

/// Persistence over Alert records and in-app notification rows
pub trait AlertStore: Send + Sync {
    /// Insert a new alert. Must reject a duplicate `alert_code` with
    /// `StoreError::DuplicateCode` - the generator relies on this to retry.
    fn insert(&self, alert: &Alert) -> Result<(), StoreError>;

    /// Number of alerts detected on the given calendar day (UTC)
    fn count_on_day(&self, day: NaiveDate) -> Result<u64, StoreError>;

    /// Number of open (pending / in-progress) alerts assigned to a user
    fn count_open_for(&self, user_id: &str) -> Result<u64, StoreError>;

    fn find_by_code(&self, code: &str) -> Result<Option<Alert>, StoreError>;

    /// Materialise an in-app notification row for the UI notification center
    fn insert_in_app(&self, notification: &InAppNotification) -> Result<(), StoreError>;
}

/// Read-only access to subscription records
pub trait SubscriptionStore: Send + Sync {
    fn active_subscriptions(&self) -> Result<Vec<Subscription>, StoreError>;
}

/// Region lookup
pub trait RegionDirectory: Send + Sync {
    fn find(&self, region_id: &str) -> Option<Region>;
}

/// User / responder directory
pub trait UserDirectory: Send + Sync {
    fn find_contact(&self, user_id: &str) -> Option<Contact>;

    /// Active field responders eligible for auto-assignment
    fn active_responders(&self) -> Vec<String>;

    /// Active admin / government users notified on high-severity alerts
    fn active_privileged(&self) -> Vec<String>;
}
