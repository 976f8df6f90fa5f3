//! Calendar events: audits, meetings, reminders.
//!
//! A calendar event may carry a recurrence rule, in which case the stored
//! value is the base event and concrete occurrences are materialized on
//! demand by [`crate::recurrence`]. Cancellation is the tombstone for
//! calendar events; they are never marked deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payload::{self, parse_timestamp, Payload};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalendarEventKind {
    Audit,
    #[default]
    Meeting,
    Reminder,
}

impl CalendarEventKind {
    pub fn from_wire(raw: &str) -> Option<CalendarEventKind> {
        match raw {
            "audit" => Some(CalendarEventKind::Audit),
            "meeting" => Some(CalendarEventKind::Meeting),
            "reminder" => Some(CalendarEventKind::Reminder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarEventKind::Audit => "audit",
            CalendarEventKind::Meeting => "meeting",
            CalendarEventKind::Reminder => "reminder",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalendarEventStatus {
    #[default]
    Scheduled,
    Completed,
    Canceled,
}

impl CalendarEventStatus {
    pub fn from_wire(raw: &str) -> Option<CalendarEventStatus> {
        match raw {
            "scheduled" => Some(CalendarEventStatus::Scheduled),
            "completed" => Some(CalendarEventStatus::Completed),
            "canceled" => Some(CalendarEventStatus::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarEventStatus::Scheduled => "scheduled",
            CalendarEventStatus::Completed => "completed",
            CalendarEventStatus::Canceled => "canceled",
        }
    }
}

/// How often a base event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceFrequency {
    pub fn from_wire(raw: &str) -> Option<RecurrenceFrequency> {
        match raw {
            "daily" => Some(RecurrenceFrequency::Daily),
            "weekly" => Some(RecurrenceFrequency::Weekly),
            "monthly" => Some(RecurrenceFrequency::Monthly),
            "yearly" => Some(RecurrenceFrequency::Yearly),
            _ => None,
        }
    }
}

/// A recurrence rule literal.
///
/// `frequency` and a positive `interval` are required for the literal to be
/// accepted at all; the remaining parts are optional and degrade
/// individually when malformed. Week days use 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: RecurrenceFrequency,
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_week_day: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_month_day: Option<Vec<u8>>,
}

impl RecurrenceRule {
    /// Parse a rule literal out of a payload value. Returns `None` when the
    /// value is not an object or the required parts are missing or invalid,
    /// in which case the caller keeps whatever rule it already had.
    pub fn from_value(value: &Value) -> Option<RecurrenceRule> {
        let rule = value.as_object()?;
        let frequency = rule
            .get("frequency")
            .and_then(Value::as_str)
            .and_then(RecurrenceFrequency::from_wire)?;
        let interval = rule
            .get("interval")
            .and_then(Value::as_u64)
            .filter(|interval| *interval >= 1)? as u32;

        Some(RecurrenceRule {
            frequency,
            interval,
            until: rule
                .get("until")
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
            count: rule
                .get("count")
                .and_then(Value::as_u64)
                .filter(|count| *count >= 1)
                .map(|count| count as u32),
            by_week_day: bounded_day_list(rule.get("byWeekDay"), 0, 6),
            by_month_day: bounded_day_list(rule.get("byMonthDay"), 1, 31),
        })
    }
}

/// Day list guard: out-of-range and non-integer entries are dropped one by
/// one; a list with nothing left behaves as if it were absent.
fn bounded_day_list(value: Option<&Value>, min: u64, max: u64) -> Option<Vec<u8>> {
    let items = value?.as_array()?;
    let days: Vec<u8> = items
        .iter()
        .filter_map(Value::as_u64)
        .filter(|day| (min..=max).contains(day))
        .map(|day| day as u8)
        .collect();
    if days.is_empty() {
        None
    } else {
        Some(days)
    }
}

/// Audit-specific details attached to audit-type events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditData {
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors_visited: Option<u32>,
}

impl AuditData {
    /// Guard for the nested `auditData` payload object. The account id is
    /// the one required part.
    pub fn from_object(object: &Payload) -> Option<AuditData> {
        let account_id = payload::get_string(object, "accountId")?;
        Some(AuditData {
            account_id,
            score: payload::get_f64(object, "score"),
            floors_visited: payload::get_i64(object, "floorsVisited")
                .filter(|floors| *floors >= 0)
                .map(|floors| floors as u32),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CalendarEventKind,
    pub status: CalendarEventStatus,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub scheduled_for: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<RecurrenceRule>,
    /// For a materialized occurrence, the id of its base event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_data: Option<AuditData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reduce a calendar event payload onto the existing snapshot.
///
/// A malformed `recurrenceRule` never clears an existing rule; rules are
/// removed only through the dedicated recurrence-deleted event.
pub fn build_calendar_event_from_payload(
    id: &str,
    payload: &Payload,
    timestamp: DateTime<Utc>,
    existing: Option<&CalendarEvent>,
) -> CalendarEvent {
    let mut event = match existing {
        Some(current) => current.clone(),
        None => CalendarEvent {
            id: id.to_string(),
            kind: CalendarEventKind::default(),
            status: CalendarEventStatus::default(),
            summary: String::new(),
            description: None,
            location: None,
            scheduled_for: timestamp,
            occurred_at: None,
            duration_minutes: None,
            recurrence_rule: None,
            recurrence_id: None,
            audit_data: None,
            created_at: timestamp,
            updated_at: timestamp,
        },
    };

    if let Some(kind) = payload::get_str(payload, "type").and_then(CalendarEventKind::from_wire) {
        event.kind = kind;
    }
    if let Some(status) =
        payload::get_str(payload, "status").and_then(CalendarEventStatus::from_wire)
    {
        event.status = status;
    }
    if let Some(summary) = payload::get_string(payload, "summary") {
        event.summary = summary;
    }
    if let Some(description) = payload::get_string(payload, "description") {
        event.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
    }
    if let Some(location) = payload::get_string(payload, "location") {
        event.location = if location.is_empty() { None } else { Some(location) };
    }
    if let Some(scheduled_for) = payload::get_timestamp(payload, "scheduledFor") {
        event.scheduled_for = scheduled_for;
    }
    if let Some(occurred_at) = payload::get_timestamp(payload, "occurredAt") {
        event.occurred_at = Some(occurred_at);
    }
    if let Some(duration) = payload::get_i64(payload, "durationMinutes").filter(|d| *d >= 0) {
        event.duration_minutes = Some(duration);
    }
    if let Some(rule) = payload.get("recurrenceRule").and_then(RecurrenceRule::from_value) {
        event.recurrence_rule = Some(rule);
    }
    if let Some(recurrence_id) = payload::get_string(payload, "recurrenceId") {
        event.recurrence_id = Some(recurrence_id);
    }
    if let Some(audit_data) =
        payload::get_object(payload, "auditData").and_then(AuditData::from_object)
    {
        event.audit_data = Some(audit_data);
    }

    event.updated_at = timestamp;
    event
}
