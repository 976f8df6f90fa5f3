//! Entity snapshots and their payload reducers.
//!
//! Each entity kind pairs a plain data struct with a
//! `build_<kind>_from_payload` reducer. Reducers are pure: they take the
//! payload, the event timestamp, and the existing snapshot (if any), and
//! return a fresh value. Fields only change when the payload carries a
//! well-typed value for them; anything else falls back to the existing
//! value, or to a kind-specific default on first creation.

pub mod account;
pub mod calendar_event;
pub mod code;
pub mod contact;
pub mod note;
pub mod organization;

pub use account::{build_account_from_payload, Account, AccountStatus};
pub use calendar_event::{
    build_calendar_event_from_payload, AuditData, CalendarEvent, CalendarEventKind,
    CalendarEventStatus, RecurrenceFrequency, RecurrenceRule,
};
pub use code::{build_code_from_payload, Code};
pub use contact::{build_contact_from_payload, Contact};
pub use note::{build_note_from_payload, link_note_target, unlink_note_target, Note};
pub use organization::{build_organization_from_payload, Organization};
