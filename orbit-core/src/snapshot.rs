//! Folding the event log into entity snapshots.
//!
//! The fold is a pure function of the canonically ordered log: same events,
//! same snapshot, byte for byte. Creation and update events run through the
//! per-kind payload reducers; lifecycle events (delete, cancel, link) are
//! small transitions applied here. Events targeting nothing, or transitions
//! aimed at entities that don't exist, are absorbed as no-ops so one bad
//! record can never poison a replay.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::entity::{
    build_account_from_payload, build_calendar_event_from_payload, build_code_from_payload,
    build_contact_from_payload, build_note_from_payload, build_organization_from_payload,
    link_note_target, unlink_note_target, Account, CalendarEvent, CalendarEventStatus, Code,
    Contact, Note, Organization,
};
use crate::event::{Event, EventType};
use crate::payload;

/// All entity state derived from the log, keyed by entity id. Ordered maps
/// keep serialized output stable across replays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub organizations: BTreeMap<String, Organization>,
    pub accounts: BTreeMap<String, Account>,
    pub contacts: BTreeMap<String, Contact>,
    pub notes: BTreeMap<String, Note>,
    pub calendar_events: BTreeMap<String, CalendarEvent>,
    pub codes: BTreeMap<String, Code>,
}

impl Snapshot {
    pub fn new() -> Snapshot {
        Snapshot::default()
    }

    /// Fold an ordered event sequence into a fresh snapshot. Callers sort
    /// with [`canonical_sort`] first when the source order is not trusted.
    pub fn replay<'a, I>(events: I) -> Snapshot
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut snapshot = Snapshot::new();
        for event in events {
            snapshot.apply(event);
        }
        snapshot
    }

    /// Apply one event in log order.
    pub fn apply(&mut self, event: &Event) {
        let Some(entity_id) = event.entity_id.as_deref() else {
            return;
        };
        let at = event.timestamp;

        match event.event_type {
            EventType::OrganizationCreated | EventType::OrganizationUpdated => {
                let organization = build_organization_from_payload(
                    entity_id,
                    &event.payload,
                    at,
                    self.organizations.get(entity_id),
                );
                self.organizations.insert(entity_id.to_string(), organization);
            }
            EventType::OrganizationDeleted => {
                if let Some(organization) = self.organizations.get_mut(entity_id) {
                    organization.deleted_at = Some(at);
                    organization.updated_at = at;
                }
            }

            EventType::AccountCreated
            | EventType::AccountUpdated
            | EventType::AccountStatusUpdated
            | EventType::AccountAuditFrequencyUpdated => {
                let account = build_account_from_payload(
                    entity_id,
                    &event.payload,
                    at,
                    self.accounts.get(entity_id),
                );
                self.accounts.insert(entity_id.to_string(), account);
            }
            EventType::AccountDeleted => {
                if let Some(account) = self.accounts.get_mut(entity_id) {
                    account.deleted_at = Some(at);
                    account.updated_at = at;
                }
            }

            EventType::ContactCreated | EventType::ContactUpdated => {
                let contact = build_contact_from_payload(
                    entity_id,
                    &event.payload,
                    at,
                    self.contacts.get(entity_id),
                );
                self.contacts.insert(entity_id.to_string(), contact);
            }
            EventType::ContactDeleted => {
                if let Some(contact) = self.contacts.get_mut(entity_id) {
                    contact.deleted_at = Some(at);
                    contact.updated_at = at;
                }
            }

            EventType::NoteCreated | EventType::NoteUpdated => {
                let note =
                    build_note_from_payload(entity_id, &event.payload, at, self.notes.get(entity_id));
                self.notes.insert(entity_id.to_string(), note);
            }
            EventType::NoteLinked => {
                if let (Some(note), Some(target_id)) = (
                    self.notes.get(entity_id),
                    payload::get_str(&event.payload, "targetId"),
                ) {
                    let linked = link_note_target(note, target_id, at);
                    self.notes.insert(entity_id.to_string(), linked);
                }
            }
            EventType::NoteUnlinked => {
                if let (Some(note), Some(target_id)) = (
                    self.notes.get(entity_id),
                    payload::get_str(&event.payload, "targetId"),
                ) {
                    let unlinked = unlink_note_target(note, target_id, at);
                    self.notes.insert(entity_id.to_string(), unlinked);
                }
            }
            EventType::NoteDeleted => {
                if let Some(note) = self.notes.get_mut(entity_id) {
                    note.deleted_at = Some(at);
                    note.updated_at = at;
                }
            }

            EventType::CalendarEventScheduled
            | EventType::CalendarEventUpdated
            | EventType::CalendarEventRescheduled
            | EventType::CalendarEventRecurrenceCreated
            | EventType::CalendarEventRecurrenceUpdated => {
                let calendar_event = build_calendar_event_from_payload(
                    entity_id,
                    &event.payload,
                    at,
                    self.calendar_events.get(entity_id),
                );
                self.calendar_events.insert(entity_id.to_string(), calendar_event);
            }
            EventType::CalendarEventCompleted => {
                let mut calendar_event = build_calendar_event_from_payload(
                    entity_id,
                    &event.payload,
                    at,
                    self.calendar_events.get(entity_id),
                );
                calendar_event.status = CalendarEventStatus::Completed;
                // The completion instant defaults to the event timestamp
                // unless the payload pins it.
                if calendar_event.occurred_at.is_none() {
                    calendar_event.occurred_at = Some(at);
                }
                self.calendar_events.insert(entity_id.to_string(), calendar_event);
            }
            EventType::CalendarEventCanceled => {
                if let Some(calendar_event) = self.calendar_events.get_mut(entity_id) {
                    calendar_event.status = CalendarEventStatus::Canceled;
                    calendar_event.updated_at = at;
                }
            }
            EventType::CalendarEventRecurrenceDeleted => {
                if let Some(calendar_event) = self.calendar_events.get_mut(entity_id) {
                    calendar_event.recurrence_rule = None;
                    calendar_event.updated_at = at;
                }
            }

            EventType::CodeCreated | EventType::CodeUpdated => {
                let code =
                    build_code_from_payload(entity_id, &event.payload, at, self.codes.get(entity_id));
                self.codes.insert(entity_id.to_string(), code);
            }
            EventType::CodeDeleted => {
                if let Some(code) = self.codes.get_mut(entity_id) {
                    code.deleted_at = Some(at);
                    code.updated_at = at;
                }
            }
        }
    }

    /// Calendar events that are still live (not canceled).
    pub fn active_calendar_events(&self) -> impl Iterator<Item = &CalendarEvent> {
        self.calendar_events
            .values()
            .filter(|event| event.status != CalendarEventStatus::Canceled)
    }

    /// Accounts that have not been deleted.
    pub fn active_accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts
            .values()
            .filter(|account| account.deleted_at.is_none())
    }
}

/// Order events the way every device orders them before folding: by
/// timestamp, tie-broken by device id, then event id. Later events win on
/// field conflicts, so this order is what makes replicas converge.
pub fn canonical_sort(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.device_id.cmp(&b.device_id))
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit_period::AuditFrequency;
    use crate::entity::AccountStatus;
    use crate::event::{build_event, EventDraft};
    use crate::payload::{parse_timestamp, Payload};
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn at(raw: &str) -> DateTime<Utc> {
        parse_timestamp(raw).expect("Should parse timestamp")
    }

    fn event(
        event_type: EventType,
        entity_id: &str,
        payload: serde_json::Value,
        timestamp: &str,
        device_id: &str,
    ) -> Event {
        let payload: Payload = payload
            .as_object()
            .expect("Should be a JSON object")
            .clone();
        build_event(
            EventDraft::new(event_type, entity_id, device_id)
                .with_payload(payload)
                .at(at(timestamp)),
        )
    }

    fn sample_log() -> Vec<Event> {
        vec![
            event(
                EventType::AccountCreated,
                "acc-1",
                json!({ "name": "Harborview", "frequency": "quarterly" }),
                "2024-01-05T09:00:00Z",
                "device-a",
            ),
            event(
                EventType::AccountUpdated,
                "acc-1",
                json!({ "address": "12 Pier Rd" }),
                "2024-01-06T09:00:00Z",
                "device-b",
            ),
            event(
                EventType::CalendarEventScheduled,
                "evt-1",
                json!({
                    "type": "audit",
                    "summary": "Harborview audit",
                    "scheduledFor": "2024-02-01T10:00:00Z",
                    "auditData": { "accountId": "acc-1" }
                }),
                "2024-01-07T09:00:00Z",
                "device-a",
            ),
            event(
                EventType::NoteCreated,
                "note-1",
                json!({ "body": "Dock gate sticks", "linkedEntityIds": ["acc-1"] }),
                "2024-01-08T09:00:00Z",
                "device-a",
            ),
        ]
    }

    #[test]
    fn test_replay_builds_entities() {
        let snapshot = Snapshot::replay(&sample_log());

        let account = snapshot.accounts.get("acc-1").expect("Should have account");
        assert_eq!(account.name, "Harborview");
        assert_eq!(account.address.as_deref(), Some("12 Pier Rd"));
        assert_eq!(account.audit_frequency, AuditFrequency::Quarterly);
        assert_eq!(account.created_at, at("2024-01-05T09:00:00Z"));
        assert_eq!(account.updated_at, at("2024-01-06T09:00:00Z"));

        assert!(snapshot.calendar_events.contains_key("evt-1"));
        assert!(snapshot.notes.contains_key("note-1"));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let log = sample_log();
        assert_eq!(Snapshot::replay(&log), Snapshot::replay(&log));
    }

    #[test]
    fn test_canonical_sort_orders_and_tiebreaks() {
        let mut events = vec![
            event(
                EventType::AccountUpdated,
                "acc-1",
                json!({ "name": "Late" }),
                "2024-01-02T00:00:00Z",
                "device-b",
            ),
            event(
                EventType::AccountUpdated,
                "acc-1",
                json!({ "name": "Tie B" }),
                "2024-01-01T00:00:00Z",
                "device-b",
            ),
            event(
                EventType::AccountCreated,
                "acc-1",
                json!({ "name": "Tie A" }),
                "2024-01-01T00:00:00Z",
                "device-a",
            ),
        ];
        canonical_sort(&mut events);

        assert_eq!(events[0].device_id, "device-a");
        assert_eq!(events[1].device_id, "device-b");
        assert_eq!(events[1].timestamp, at("2024-01-01T00:00:00Z"));
        assert_eq!(events[2].timestamp, at("2024-01-02T00:00:00Z"));

        // Most recent write wins on the contested field.
        let snapshot = Snapshot::replay(&events);
        assert_eq!(snapshot.accounts["acc-1"].name, "Late");
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut log = sample_log();
        log.push(event(
            EventType::CalendarEventCompleted,
            "evt-1",
            json!({ "auditData": { "accountId": "acc-1", "score": 88.0 } }),
            "2024-02-01T11:45:00Z",
            "device-a",
        ));
        log.push(event(
            EventType::AccountStatusUpdated,
            "acc-1",
            json!({ "status": "inactive" }),
            "2024-03-01T09:00:00Z",
            "device-a",
        ));
        log.push(event(
            EventType::NoteDeleted,
            "note-1",
            json!({}),
            "2024-03-02T09:00:00Z",
            "device-a",
        ));

        let snapshot = Snapshot::replay(&log);

        let completed = &snapshot.calendar_events["evt-1"];
        assert_eq!(completed.status, CalendarEventStatus::Completed);
        assert_eq!(completed.occurred_at, Some(at("2024-02-01T11:45:00Z")));
        assert_eq!(
            completed
                .audit_data
                .as_ref()
                .expect("Should keep audit data")
                .score,
            Some(88.0)
        );

        assert_eq!(snapshot.accounts["acc-1"].status, AccountStatus::Inactive);
        assert_eq!(
            snapshot.notes["note-1"].deleted_at,
            Some(at("2024-03-02T09:00:00Z"))
        );
    }

    #[test]
    fn test_cancel_is_the_calendar_tombstone() {
        let mut log = sample_log();
        log.push(event(
            EventType::CalendarEventCanceled,
            "evt-1",
            json!({}),
            "2024-01-20T09:00:00Z",
            "device-a",
        ));

        let snapshot = Snapshot::replay(&log);
        assert_eq!(
            snapshot.calendar_events["evt-1"].status,
            CalendarEventStatus::Canceled
        );
        assert_eq!(snapshot.active_calendar_events().count(), 0);
    }

    #[test]
    fn test_recurrence_lifecycle() {
        let mut log = sample_log();
        log.push(event(
            EventType::CalendarEventRecurrenceCreated,
            "evt-1",
            json!({ "recurrenceRule": { "frequency": "monthly", "interval": 3 } }),
            "2024-01-09T09:00:00Z",
            "device-a",
        ));

        let with_rule = Snapshot::replay(&log);
        assert!(with_rule.calendar_events["evt-1"].recurrence_rule.is_some());

        log.push(event(
            EventType::CalendarEventRecurrenceDeleted,
            "evt-1",
            json!({}),
            "2024-01-10T09:00:00Z",
            "device-a",
        ));

        let without_rule = Snapshot::replay(&log);
        assert_eq!(without_rule.calendar_events["evt-1"].recurrence_rule, None);
    }

    #[test]
    fn test_transitions_for_unknown_entities_are_no_ops() {
        let log = vec![
            event(
                EventType::AccountDeleted,
                "acc-ghost",
                json!({}),
                "2024-01-01T00:00:00Z",
                "device-a",
            ),
            event(
                EventType::NoteLinked,
                "note-ghost",
                json!({ "targetId": "acc-1" }),
                "2024-01-01T00:00:00Z",
                "device-a",
            ),
            event(
                EventType::CalendarEventCanceled,
                "evt-ghost",
                json!({}),
                "2024-01-01T00:00:00Z",
                "device-a",
            ),
        ];

        let snapshot = Snapshot::replay(&log);
        assert_eq!(snapshot, Snapshot::new());
    }

    #[test]
    fn test_event_without_entity_id_is_a_no_op() {
        let mut stray = event(
            EventType::AccountCreated,
            "acc-1",
            json!({ "name": "Harborview" }),
            "2024-01-01T00:00:00Z",
            "device-a",
        );
        stray.entity_id = None;

        let snapshot = Snapshot::replay(&[stray]);
        assert_eq!(snapshot, Snapshot::new());
    }

    #[test]
    fn test_note_link_and_unlink() {
        let mut log = sample_log();
        log.push(event(
            EventType::NoteLinked,
            "note-1",
            json!({ "targetId": "evt-1" }),
            "2024-01-09T09:00:00Z",
            "device-a",
        ));
        log.push(event(
            EventType::NoteUnlinked,
            "note-1",
            json!({ "targetId": "acc-1" }),
            "2024-01-10T09:00:00Z",
            "device-a",
        ));

        let snapshot = Snapshot::replay(&log);
        assert_eq!(snapshot.notes["note-1"].linked_entity_ids, vec!["evt-1"]);
    }
}
