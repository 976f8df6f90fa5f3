//! The event log: typed, immutable records of mutation intent.
//!
//! Events are append-only. State is never edited in place; every change is
//! captured as an [`Event`] and snapshots are rebuilt by folding the log
//! (see [`crate::snapshot`]).

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OrbitError, OrbitResult};
use crate::payload::Payload;

/// A single record in the append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique event id, generated at build time.
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Id of the entity this event targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Free-form body, read through the guards in [`crate::payload`].
    #[serde(default)]
    pub payload: Payload,
    pub timestamp: DateTime<Utc>,
    /// Originating device, used as the ordering tiebreak on timestamp collisions.
    pub device_id: String,
}

/// Every event type the fold understands, in `<entity>.<action>` wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "organization.created")]
    OrganizationCreated,
    #[serde(rename = "organization.updated")]
    OrganizationUpdated,
    #[serde(rename = "organization.deleted")]
    OrganizationDeleted,

    #[serde(rename = "account.created")]
    AccountCreated,
    #[serde(rename = "account.updated")]
    AccountUpdated,
    #[serde(rename = "account.status.updated")]
    AccountStatusUpdated,
    #[serde(rename = "account.auditFrequency.updated")]
    AccountAuditFrequencyUpdated,
    #[serde(rename = "account.deleted")]
    AccountDeleted,

    #[serde(rename = "contact.created")]
    ContactCreated,
    #[serde(rename = "contact.updated")]
    ContactUpdated,
    #[serde(rename = "contact.deleted")]
    ContactDeleted,

    #[serde(rename = "note.created")]
    NoteCreated,
    #[serde(rename = "note.updated")]
    NoteUpdated,
    #[serde(rename = "note.linked")]
    NoteLinked,
    #[serde(rename = "note.unlinked")]
    NoteUnlinked,
    #[serde(rename = "note.deleted")]
    NoteDeleted,

    #[serde(rename = "calendarEvent.scheduled")]
    CalendarEventScheduled,
    #[serde(rename = "calendarEvent.updated")]
    CalendarEventUpdated,
    #[serde(rename = "calendarEvent.rescheduled")]
    CalendarEventRescheduled,
    #[serde(rename = "calendarEvent.completed")]
    CalendarEventCompleted,
    #[serde(rename = "calendarEvent.canceled")]
    CalendarEventCanceled,
    #[serde(rename = "calendarEvent.recurrence.created")]
    CalendarEventRecurrenceCreated,
    #[serde(rename = "calendarEvent.recurrence.updated")]
    CalendarEventRecurrenceUpdated,
    #[serde(rename = "calendarEvent.recurrence.deleted")]
    CalendarEventRecurrenceDeleted,

    #[serde(rename = "code.created")]
    CodeCreated,
    #[serde(rename = "code.updated")]
    CodeUpdated,
    #[serde(rename = "code.deleted")]
    CodeDeleted,
}

/// The entity families events can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Organization,
    Account,
    Contact,
    Note,
    CalendarEvent,
    Code,
}

impl EventType {
    /// Wire form of the event type, e.g. `account.auditFrequency.updated`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::OrganizationCreated => "organization.created",
            EventType::OrganizationUpdated => "organization.updated",
            EventType::OrganizationDeleted => "organization.deleted",
            EventType::AccountCreated => "account.created",
            EventType::AccountUpdated => "account.updated",
            EventType::AccountStatusUpdated => "account.status.updated",
            EventType::AccountAuditFrequencyUpdated => "account.auditFrequency.updated",
            EventType::AccountDeleted => "account.deleted",
            EventType::ContactCreated => "contact.created",
            EventType::ContactUpdated => "contact.updated",
            EventType::ContactDeleted => "contact.deleted",
            EventType::NoteCreated => "note.created",
            EventType::NoteUpdated => "note.updated",
            EventType::NoteLinked => "note.linked",
            EventType::NoteUnlinked => "note.unlinked",
            EventType::NoteDeleted => "note.deleted",
            EventType::CalendarEventScheduled => "calendarEvent.scheduled",
            EventType::CalendarEventUpdated => "calendarEvent.updated",
            EventType::CalendarEventRescheduled => "calendarEvent.rescheduled",
            EventType::CalendarEventCompleted => "calendarEvent.completed",
            EventType::CalendarEventCanceled => "calendarEvent.canceled",
            EventType::CalendarEventRecurrenceCreated => "calendarEvent.recurrence.created",
            EventType::CalendarEventRecurrenceUpdated => "calendarEvent.recurrence.updated",
            EventType::CalendarEventRecurrenceDeleted => "calendarEvent.recurrence.deleted",
            EventType::CodeCreated => "code.created",
            EventType::CodeUpdated => "code.updated",
            EventType::CodeDeleted => "code.deleted",
        }
    }

    /// Which entity family the event targets.
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            EventType::OrganizationCreated
            | EventType::OrganizationUpdated
            | EventType::OrganizationDeleted => EntityKind::Organization,
            EventType::AccountCreated
            | EventType::AccountUpdated
            | EventType::AccountStatusUpdated
            | EventType::AccountAuditFrequencyUpdated
            | EventType::AccountDeleted => EntityKind::Account,
            EventType::ContactCreated | EventType::ContactUpdated | EventType::ContactDeleted => {
                EntityKind::Contact
            }
            EventType::NoteCreated
            | EventType::NoteUpdated
            | EventType::NoteLinked
            | EventType::NoteUnlinked
            | EventType::NoteDeleted => EntityKind::Note,
            EventType::CalendarEventScheduled
            | EventType::CalendarEventUpdated
            | EventType::CalendarEventRescheduled
            | EventType::CalendarEventCompleted
            | EventType::CalendarEventCanceled
            | EventType::CalendarEventRecurrenceCreated
            | EventType::CalendarEventRecurrenceUpdated
            | EventType::CalendarEventRecurrenceDeleted => EntityKind::CalendarEvent,
            EventType::CodeCreated | EventType::CodeUpdated | EventType::CodeDeleted => {
                EntityKind::Code
            }
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-supplied intent for a new event. Missing id and timestamp are
/// filled in by [`build_event`].
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub event_type: EventType,
    pub entity_id: Option<String>,
    pub payload: Payload,
    pub device_id: String,
    /// When `None`, the event is stamped with the current instant.
    pub timestamp: Option<DateTime<Utc>>,
}

impl EventDraft {
    pub fn new(event_type: EventType, entity_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        EventDraft {
            event_type,
            entity_id: Some(entity_id.into()),
            payload: Payload::new(),
            device_id: device_id.into(),
            timestamp: None,
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Seal a draft into an immutable event, generating the id and stamping the
/// timestamp when the draft left it open.
pub fn build_event(draft: EventDraft) -> Event {
    Event {
        id: Uuid::new_v4().to_string(),
        event_type: draft.event_type,
        entity_id: draft.entity_id,
        payload: draft.payload,
        timestamp: draft.timestamp.unwrap_or_else(Utc::now),
        device_id: draft.device_id,
    }
}

/// Parse a serialized event log (a JSON array of events).
pub fn parse_event_log(raw: &str) -> OrbitResult<Vec<Event>> {
    serde_json::from_str(raw).map_err(|e| OrbitError::LogParse(e.to_string()))
}

/// Read and parse an event log file.
pub fn load_event_log(path: &Path) -> OrbitResult<Vec<Event>> {
    let raw = std::fs::read_to_string(path)?;
    parse_event_log(&raw)
}

/// Serialize an event log back to its on-disk form.
pub fn serialize_event_log(events: &[Event]) -> OrbitResult<String> {
    serde_json::to_string_pretty(events).map_err(|e| OrbitError::LogParse(e.to_string()))
}
