//! Responder Auto-Assignment
//!
//! Least-current-load selection over the active field responders. Load is
//! the count of open (pending / in-progress) alerts already assigned to the
//! responder; ties go to the first responder found.

use crate::error::StoreError;
use crate::logic::store::{AlertStore, UserDirectory};

/// Pick the active responder with the fewest open alerts.
///
/// Returns `None` when no responder is available - the caller leaves the
/// alert unassigned, which is a normal outcome, not an error.
pub fn pick_least_loaded(
    users: &dyn UserDirectory,
    store: &dyn AlertStore,
) -> Result<Option<String>, StoreError> {
    let responders = users.active_responders();
    if responders.is_empty() {
        return Ok(None);
    }

    let mut best: Option<(String, u64)> = None;
    for responder in responders {
        let load = store.count_open_for(&responder)?;
        match &best {
            Some((_, best_load)) if load >= *best_load => {}
            _ => best = Some((responder, load)),
        }
    }

    Ok(best.map(|(id, _)| id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::alert::{Alert, AlertStatus};
    use crate::logic::geo::BoundingBox;
    use crate::logic::model::Severity;
    use crate::logic::store::{MemoryStore, StaticUsers};
    use chrono::Utc;
    use uuid::Uuid;

    fn open_alert(code: &str, assigned: &str) -> Alert {
        let bbox = BoundingBox::new(0.0, 0.0, 0.1, 0.1);
        Alert {
            id: Uuid::new_v4(),
            alert_code: code.to_string(),
            region_id: "r1".to_string(),
            latitude: 0.05,
            longitude: 0.05,
            geometry: bbox.to_polygon(),
            area_hectares: 3.0,
            confidence: 0.8,
            severity: Severity::High,
            status: AlertStatus::InProgress,
            priority: 9,
            detected_date: Utc::now(),
            ndvi_change: None,
            brightness_change: None,
            assigned_to: Some(assigned.to_string()),
            image_id: None,
        }
    }

    #[test]
    fn test_least_loaded_wins() {
        let store = MemoryStore::new();
        store.insert(&open_alert("ALERT-20260829-0001", "ranger-1")).unwrap();
        store.insert(&open_alert("ALERT-20260829-0002", "ranger-1")).unwrap();
        store.insert(&open_alert("ALERT-20260829-0003", "ranger-2")).unwrap();

        let users = StaticUsers::new().with_responder("ranger-1").with_responder("ranger-2");
        let picked = pick_least_loaded(&users, &store).unwrap();
        assert_eq!(picked.as_deref(), Some("ranger-2"));
    }

    #[test]
    fn test_tie_goes_to_first_found() {
        let store = MemoryStore::new();
        let users = StaticUsers::new().with_responder("ranger-a").with_responder("ranger-b");
        let picked = pick_least_loaded(&users, &store).unwrap();
        assert_eq!(picked.as_deref(), Some("ranger-a"));
    }

    #[test]
    fn test_no_responders_is_none() {
        let store = MemoryStore::new();
        let users = StaticUsers::new();
        assert!(pick_least_loaded(&users, &store).unwrap().is_none());
    }
}
