//! SQLite reference store
//!
//! Schema applied on open. The UNIQUE index on `alert_code` is what makes
//! the count-then-increment code scheme safe: a concurrent generator racing
//! to the same code gets `StoreError::DuplicateCode` and retries with a
//! recomputed sequence.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode};
use uuid::Uuid;

use super::{AlertStore, SubscriptionStore};
use crate::error::StoreError;
use crate::logic::alert::{Alert, AlertStatus};
use crate::logic::geo::GeoPolygon;
use crate::logic::model::Severity;
use crate::logic::notify::{Channel, InAppNotification, Subscription};

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS alerts (
    id TEXT PRIMARY KEY,
    alert_code TEXT NOT NULL,
    region_id TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    geometry TEXT NOT NULL,
    area_hectares REAL NOT NULL,
    confidence REAL NOT NULL,
    severity TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    priority INTEGER NOT NULL,
    detected_date TEXT NOT NULL,
    ndvi_change REAL,
    brightness_change REAL,
    assigned_to TEXT,
    image_id TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_alerts_code ON alerts(alert_code);
CREATE INDEX IF NOT EXISTS idx_alerts_region ON alerts(region_id);
CREATE INDEX IF NOT EXISTS idx_alerts_status ON alerts(status);
CREATE INDEX IF NOT EXISTS idx_alerts_assigned ON alerts(assigned_to);

CREATE TABLE IF NOT EXISTS in_app_notifications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    alert_code TEXT NOT NULL,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    severity TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_in_app_user ON in_app_notifications(user_id);

CREATE TABLE IF NOT EXISTS subscriptions (
    user_id TEXT NOT NULL,
    channels TEXT NOT NULL,
    min_severity TEXT NOT NULL,
    region_ids TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);
"#;

/// SQLite-backed alert + subscription store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path and apply the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        log::info!("Alert store schema applied: {:?}", path);
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory SQLite database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn add_subscription(&self, sub: &Subscription) -> Result<(), StoreError> {
        let channels = sub
            .channels
            .iter()
            .map(Channel::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let regions = sub.region_ids.join(",");

        self.conn.lock().execute(
            "INSERT INTO subscriptions (user_id, channels, min_severity, region_ids, active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![sub.user_id, channels, sub.min_severity.as_str(), regions, sub.active],
        )?;
        Ok(())
    }
}

fn channel_from_str(s: &str) -> Option<Channel> {
    match s {
        "email" => Some(Channel::Email),
        "sms" => Some(Channel::Sms),
        "whatsapp" => Some(Channel::WhatsApp),
        "push" => Some(Channel::Push),
        "in_app" => Some(Channel::InApp),
        _ => None,
    }
}

fn row_to_alert(row: &rusqlite::Row<'_>) -> rusqlite::Result<Alert> {
    let id: String = row.get("id")?;
    let geometry: String = row.get("geometry")?;
    let severity: String = row.get("severity")?;
    let status: String = row.get("status")?;
    let detected: String = row.get("detected_date")?;

    Ok(Alert {
        id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
        alert_code: row.get("alert_code")?,
        region_id: row.get("region_id")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        geometry: serde_json::from_str::<GeoPolygon>(&geometry)
            .unwrap_or(GeoPolygon { ring: Vec::new() }),
        area_hectares: row.get("area_hectares")?,
        confidence: row.get("confidence")?,
        severity: Severity::from_str(&severity),
        status: AlertStatus::from_str(&status),
        priority: row.get("priority")?,
        detected_date: DateTime::parse_from_rfc3339(&detected)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        ndvi_change: row.get("ndvi_change")?,
        brightness_change: row.get("brightness_change")?,
        assigned_to: row.get("assigned_to")?,
        image_id: row.get("image_id")?,
    })
}

impl AlertStore for SqliteStore {
    fn insert(&self, alert: &Alert) -> Result<(), StoreError> {
        let geometry = serde_json::to_string(&alert.geometry)
            .map_err(|e| StoreError::Backend { message: e.to_string() })?;

        let result = self.conn.lock().execute(
            "INSERT INTO alerts (id, alert_code, region_id, latitude, longitude, geometry,
                                 area_hectares, confidence, severity, status, priority,
                                 detected_date, ndvi_change, brightness_change, assigned_to,
                                 image_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                alert.id.to_string(),
                alert.alert_code,
                alert.region_id,
                alert.latitude,
                alert.longitude,
                geometry,
                alert.area_hectares,
                alert.confidence,
                alert.severity.as_str(),
                alert.status.as_str(),
                alert.priority,
                alert.detected_date.to_rfc3339(),
                alert.ndvi_change,
                alert.brightness_change,
                alert.assigned_to,
                alert.image_id,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateCode { code: alert.alert_code.clone() })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn count_on_day(&self, day: NaiveDate) -> Result<u64, StoreError> {
        let count: u64 = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM alerts WHERE date(detected_date) = ?1",
            params![day.format("%Y-%m-%d").to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_open_for(&self, user_id: &str) -> Result<u64, StoreError> {
        let count: u64 = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM alerts
             WHERE assigned_to = ?1 AND status IN ('pending', 'in_progress')",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn find_by_code(&self, code: &str) -> Result<Option<Alert>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT * FROM alerts WHERE alert_code = ?1")?;
        let mut rows = stmt.query_map(params![code], row_to_alert)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn insert_in_app(&self, n: &InAppNotification) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO in_app_notifications (id, user_id, alert_code, title, body, severity, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                n.id.to_string(),
                n.user_id,
                n.alert_code,
                n.title,
                n.body,
                n.severity.as_str(),
                n.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl SubscriptionStore for SqliteStore {
    fn active_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT user_id, channels, min_severity, region_ids, active
             FROM subscriptions WHERE active = 1",
        )?;

        let rows = stmt.query_map([], |row| {
            let channels: String = row.get("channels")?;
            let min_severity: String = row.get("min_severity")?;
            let region_ids: String = row.get("region_ids")?;

            Ok(Subscription {
                user_id: row.get("user_id")?,
                channels: channels.split(',').filter_map(channel_from_str).collect(),
                min_severity: Severity::from_str(&min_severity),
                region_ids: region_ids
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                active: row.get("active")?,
            })
        })?;

        let mut subs = Vec::new();
        for row in rows {
            subs.push(row?);
        }
        Ok(subs)
    }
}
