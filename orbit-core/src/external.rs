//! Snapshots of events living in an external calendar.
//!
//! Providers hand these over as JSON dumps of whatever their calendar
//! currently holds. Date fields are parsed leniently: a missing, null, or
//! unparsable value becomes `None` rather than failing the whole snapshot,
//! and the reconciler treats `None` as "cannot judge drift on this field".

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{OrbitError, OrbitResult};
use crate::payload::parse_timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExternalEventStatus {
    Tentative,
    Canceled,
    /// Unknown provider statuses fold into `Confirmed` so that only an
    /// explicit cancellation triggers cancel handling.
    #[default]
    #[serde(other)]
    Confirmed,
}

/// One event as the external calendar currently sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEventSnapshot {
    pub external_event_id: String,
    pub calendar_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub status: ExternalEventStatus,
    #[serde(default, deserialize_with = "lenient_instant", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_instant", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_instant", skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_all_day: Option<bool>,
}

impl ExternalEventSnapshot {
    /// Event length in whole minutes, when both ends are known and sane.
    pub fn duration_minutes(&self) -> Option<i64> {
        let start = self.start_date?;
        let end = self.end_date?;
        let minutes = (end - start).num_minutes();
        if minutes >= 0 {
            Some(minutes)
        } else {
            None
        }
    }
}

/// Absorb anything that isn't a well-formed RFC 3339 string.
fn lenient_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_timestamp))
}

/// Parse a provider dump (a JSON array of snapshots).
pub fn parse_snapshots(raw: &str) -> OrbitResult<Vec<ExternalEventSnapshot>> {
    serde_json::from_str(raw).map_err(|e| OrbitError::ExternalParse(e.to_string()))
}

/// Read and parse a provider dump file.
pub fn load_snapshots(path: &Path) -> OrbitResult<Vec<ExternalEventSnapshot>> {
    let raw = std::fs::read_to_string(path)?;
    parse_snapshots(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unparsable_dates_become_none() {
        let raw = r#"[
            {
                "externalEventId": "ext-1",
                "calendarId": "work",
                "title": "Harborview audit",
                "startDate": "not a date",
                "endDate": null,
                "lastModifiedAt": 1704103200
            }
        ]"#;

        let snapshots = parse_snapshots(raw).expect("Should parse dump");
        assert_eq!(snapshots.len(), 1);
        let snapshot = &snapshots[0];
        assert_eq!(snapshot.start_date, None);
        assert_eq!(snapshot.end_date, None);
        assert_eq!(snapshot.last_modified_at, None);
        assert_eq!(snapshot.status, ExternalEventStatus::Confirmed);
    }

    #[test]
    fn test_duration_requires_both_ends_in_order() {
        let raw = r#"[
            {
                "externalEventId": "ext-1",
                "calendarId": "work",
                "title": "Visit",
                "startDate": "2024-03-01T10:00:00Z",
                "endDate": "2024-03-01T11:30:00Z"
            },
            {
                "externalEventId": "ext-2",
                "calendarId": "work",
                "title": "Backwards",
                "startDate": "2024-03-01T10:00:00Z",
                "endDate": "2024-03-01T09:00:00Z"
            },
            {
                "externalEventId": "ext-3",
                "calendarId": "work",
                "title": "Open ended",
                "startDate": "2024-03-01T10:00:00Z"
            }
        ]"#;

        let snapshots = parse_snapshots(raw).expect("Should parse dump");
        assert_eq!(snapshots[0].duration_minutes(), Some(90));
        assert_eq!(snapshots[1].duration_minutes(), None);
        assert_eq!(snapshots[2].duration_minutes(), None);
    }

    #[test]
    fn test_unknown_status_folds_to_confirmed() {
        let raw = r#"[
            {
                "externalEventId": "ext-1",
                "calendarId": "work",
                "title": "Visit",
                "status": "needsAction"
            },
            {
                "externalEventId": "ext-2",
                "calendarId": "work",
                "title": "Gone",
                "status": "canceled"
            }
        ]"#;

        let snapshots = parse_snapshots(raw).expect("Should parse dump");
        assert_eq!(snapshots[0].status, ExternalEventStatus::Confirmed);
        assert_eq!(snapshots[1].status, ExternalEventStatus::Canceled);
    }
}
