//! Alert Generator
//!
//! The pipeline's orchestrator and its only side-effecting component.
//! Per submission: Evaluate -> { Rejected | Persisted -> [Assigned] ->
//! [Notified] }. Alert creation and notification are not transactional:
//! once the store write commits, the alert is a success regardless of what
//! the channels do.

mod assign;
mod code;
mod types;

pub use types::{priority_for, Alert, AlertConfig, AlertStatus, SeverityThresholds};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{PipelineError, PipelineResult, StoreError};
use crate::logic::model::Detection;
use crate::logic::notify::{AlertNotifyReport, Notifier, OutboxHandle};
use crate::logic::store::{AlertStore, RegionDirectory, UserDirectory};

// ============================================================================
// TYPES
// ============================================================================

/// One submission for (batch) alert generation
#[derive(Debug, Clone)]
pub struct AlertRequest {
    pub detection: Detection,
    pub region_id: String,
    pub image_id: Option<String>,
}

/// How the generator hands alerts to the notifier.
///
/// `Inline` runs the fan-out synchronously and returns the report with the
/// alert. `Queued` makes the fire-and-forget explicit: the job goes to the
/// outbox worker after the store write commits, and the generator returns
/// immediately.
pub enum NotifyMode {
    Disabled,
    Inline(Arc<Notifier>),
    Queued(OutboxHandle),
}

/// A persisted alert plus what happened downstream of the persist
#[derive(Debug)]
pub struct GeneratedAlert {
    pub alert: Alert,
    /// Present only in `NotifyMode::Inline`
    pub notification: Option<AlertNotifyReport>,
}

/// Cooperative cancellation for batch runs: once set, no new items are
/// scheduled; the in-flight item completes and is reported.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ============================================================================
// GENERATOR
// ============================================================================

/// Alert generator. Construct one per process and pass it explicitly;
/// collaborators come in as trait objects, not globals.
pub struct AlertGenerator {
    config: AlertConfig,
    store: Arc<dyn AlertStore>,
    regions: Arc<dyn RegionDirectory>,
    users: Arc<dyn UserDirectory>,
    notify: NotifyMode,
}

impl AlertGenerator {
    pub fn new(
        config: AlertConfig,
        store: Arc<dyn AlertStore>,
        regions: Arc<dyn RegionDirectory>,
        users: Arc<dyn UserDirectory>,
        notify: NotifyMode,
    ) -> Self {
        Self { config, store, regions, users, notify }
    }

    /// Gate a detection and, if accepted, persist an alert.
    ///
    /// `Ok(None)` is the normal negative outcome: the detection fell below
    /// the confidence or area floor and nothing was written.
    pub fn generate(
        &self,
        detection: &Detection,
        region_id: &str,
        image_id: Option<&str>,
    ) -> PipelineResult<Option<GeneratedAlert>> {
        // Threshold gate - rejection is not an error and has no side effect
        if detection.confidence < self.config.min_confidence {
            log::debug!(
                "Detection rejected: confidence {:.2} below {:.2}",
                detection.confidence,
                self.config.min_confidence
            );
            return Ok(None);
        }
        if detection.area_hectares < self.config.min_area_ha {
            log::debug!(
                "Detection rejected: area {:.3} ha below {:.3} ha",
                detection.area_hectares,
                self.config.min_area_ha
            );
            return Ok(None);
        }

        if self.regions.find(region_id).is_none() {
            return Err(PipelineError::UnknownRegion { region_id: region_id.to_string() });
        }

        let severity = self.config.severity_thresholds.classify(detection.confidence);
        let priority = priority_for(severity, detection.confidence);
        let center = detection.bbox.center();

        // Auto-assignment happens in the same insert: assigned alerts start
        // in progress. No responder available is a normal outcome.
        let assigned_to = if self.config.auto_assign {
            let picked = assign::pick_least_loaded(self.users.as_ref(), self.store.as_ref())?;
            if picked.is_none() {
                log::info!("No active responder available, alert stays unassigned");
            }
            picked
        } else {
            None
        };
        let status = if assigned_to.is_some() { AlertStatus::InProgress } else { AlertStatus::Pending };

        let mut alert = Alert {
            id: Uuid::new_v4(),
            alert_code: String::new(),
            region_id: region_id.to_string(),
            latitude: center.lat,
            longitude: center.lon,
            geometry: detection.bbox.to_polygon(),
            area_hectares: detection.area_hectares,
            confidence: detection.confidence.clamp(0.0, 1.0),
            severity,
            status,
            priority,
            detected_date: Utc::now(),
            ndvi_change: detection.ndvi_change,
            brightness_change: Some(detection.features.brightness_change),
            assigned_to,
            image_id: image_id.map(str::to_string),
        };

        self.persist_with_fresh_code(&mut alert)?;

        log::info!(
            "Alert {} created: severity {}, priority {}, {:.2} ha in region {}",
            alert.alert_code,
            alert.severity.as_str(),
            alert.priority,
            alert.area_hectares,
            alert.region_id
        );

        // Notification never unwinds the persisted alert
        let notification = match &self.notify {
            NotifyMode::Disabled => None,
            NotifyMode::Inline(notifier) => Some(notifier.notify_alert(&alert)),
            NotifyMode::Queued(outbox) => {
                outbox.enqueue(alert.clone());
                None
            }
        };

        Ok(Some(GeneratedAlert { alert, notification }))
    }

    /// Count-then-increment code generation with store-arbitrated
    /// uniqueness: recompute the day count and retry on a duplicate code,
    /// bounded by the configured retry limit.
    fn persist_with_fresh_code(&self, alert: &mut Alert) -> PipelineResult<()> {
        let day = alert.detected_date.date_naive();

        for attempt in 1..=self.config.code_retry_limit {
            let sequence = self.store.count_on_day(day)? + 1;
            alert.alert_code = code::code_for(day, sequence);

            match self.store.insert(alert) {
                Ok(()) => return Ok(()),
                Err(StoreError::DuplicateCode { code }) => {
                    log::warn!(
                        "Alert code {} already taken (attempt {}/{}), recomputing",
                        code,
                        attempt,
                        self.config.code_retry_limit
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(PipelineError::CodeExhausted {
            attempts: self.config.code_retry_limit,
            last_code: alert.alert_code.clone(),
        })
    }

    /// Sequential batch generation with per-item failure isolation: a
    /// failed item is logged and skipped, the rest of the batch continues.
    pub fn generate_batch(&self, items: &[AlertRequest], cancel: Option<&CancelFlag>) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for (i, item) in items.iter().enumerate() {
            if cancel.is_some_and(CancelFlag::is_cancelled) {
                log::warn!("Batch cancelled after {} of {} items", i, items.len());
                break;
            }

            match self.generate(&item.detection, &item.region_id, item.image_id.as_deref()) {
                Ok(Some(generated)) => alerts.push(generated.alert),
                Ok(None) => {}
                Err(e) => {
                    log::error!("Batch item {} failed: {}", i, e);
                }
            }
        }

        alerts
    }
}

// ============================================================================
// TESTS
// ============================================================================
