//! Core domain engine for orbit.
//!
//! This crate holds everything shared by the CLI and sync tooling:
//! - the append-only event log (`event`) and its deterministic fold
//!   (`snapshot`) into entity state
//! - per-entity payload reducers (`entity`) with type-guarded field access
//!   (`payload`)
//! - audit cadence period math (`audit_period`)
//! - recurrence expansion for calendar events (`recurrence`)
//! - two-way reconciliation against external calendar snapshots
//!   (`external`, `reconcile`)

pub mod audit_period;
pub mod date_range;
pub mod entity;
pub mod error;
pub mod event;
pub mod external;
pub mod payload;
pub mod reconcile;
pub mod recurrence;
pub mod snapshot;

// Re-export the everyday types at the crate root for convenience
pub use entity::{
    Account, AccountStatus, AuditData, CalendarEvent, CalendarEventKind, CalendarEventStatus,
    Code, Contact, Note, Organization, RecurrenceFrequency, RecurrenceRule,
};
pub use error::{OrbitError, OrbitResult};
pub use event::{build_event, Event, EventDraft, EventType};
pub use snapshot::{canonical_sort, Snapshot};
