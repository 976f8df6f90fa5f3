//! Drift detection between a linked pair of events.
//!
//! Comparison is field by field and deliberately conservative: a field the
//! external snapshot cannot express (missing or unparsable date, absent
//! duration) is no evidence of drift. When drift is found, the external
//! value wins and domain events are emitted to pull internal state toward
//! it.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::entity::calendar_event::{CalendarEvent, CalendarEventStatus};
use crate::event::{build_event, Event, EventDraft, EventType};
use crate::external::{ExternalEventSnapshot, ExternalEventStatus};
use crate::payload::{timestamp_value, Payload};

use super::link_marker::strip_link_marker;

/// Reschedules within this many milliseconds are dismissed as provider
/// rounding, not drift.
pub const RESCHEDULE_EPSILON_MS: i64 = 1_000;

/// Compare a linked internal/external pair and emit the events that resolve
/// whatever drift exists. An already-consistent pair emits nothing, so
/// running reconciliation twice in a row is a no-op.
///
/// An external cancellation takes precedence over everything else: it emits
/// exactly one cancel event and suppresses all other comparisons.
pub fn reconcile_event(
    internal: &CalendarEvent,
    external: &ExternalEventSnapshot,
    device_id: &str,
    at: DateTime<Utc>,
) -> Vec<Event> {
    if external.status == ExternalEventStatus::Canceled {
        if internal.status == CalendarEventStatus::Canceled {
            return Vec::new();
        }
        return vec![build_event(
            EventDraft::new(EventType::CalendarEventCanceled, internal.id.clone(), device_id).at(at),
        )];
    }

    let mut events = Vec::new();

    if let Some(external_start) = external.start_date {
        let drift_ms = (internal.scheduled_for - external_start)
            .num_milliseconds()
            .abs();
        if drift_ms > RESCHEDULE_EPSILON_MS {
            let mut payload = Payload::new();
            payload.insert("scheduledFor".to_string(), timestamp_value(external_start));
            events.push(build_event(
                EventDraft::new(
                    EventType::CalendarEventRescheduled,
                    internal.id.clone(),
                    device_id,
                )
                .with_payload(payload)
                .at(at),
            ));
        }
    }

    let mut changed = Payload::new();

    if internal.summary != external.title {
        changed.insert("summary".to_string(), Value::String(external.title.clone()));
    }

    let internal_notes = normalized_notes(internal.description.as_deref());
    let external_notes = normalized_notes(external.notes.as_deref());
    if internal_notes != external_notes {
        changed.insert(
            "description".to_string(),
            Value::String(external_notes.unwrap_or_default()),
        );
    }

    let internal_location = normalized_text(internal.location.as_deref());
    let external_location = normalized_text(external.location.as_deref());
    if internal_location != external_location {
        changed.insert(
            "location".to_string(),
            Value::String(external_location.unwrap_or_default()),
        );
    }

    if let Some(external_duration) = external.duration_minutes() {
        if internal.duration_minutes != Some(external_duration) {
            changed.insert(
                "durationMinutes".to_string(),
                Value::Number(external_duration.into()),
            );
        }
    }

    if !changed.is_empty() {
        events.push(build_event(
            EventDraft::new(EventType::CalendarEventUpdated, internal.id.clone(), device_id)
                .with_payload(changed)
                .at(at),
        ));
    }

    events
}

/// Notes compare with link markers stripped, and with "no notes" and
/// "empty notes" treated as the same thing.
fn normalized_notes(text: Option<&str>) -> Option<String> {
    let stripped = strip_link_marker(text?);
    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}

fn normalized_text(text: Option<&str>) -> Option<String> {
    let trimmed = text?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
