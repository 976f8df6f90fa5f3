//! Two-way reconciliation against an external calendar.
//!
//! The external calendar is treated as the source of truth for events the
//! user linked to it: drift is resolved by emitting domain events that move
//! internal state toward the external snapshot, never by editing state in
//! place. Unlinked external events that look like audits for known accounts
//! surface as import candidates instead.

pub mod diff;
pub mod import;
pub mod link_marker;

pub use diff::reconcile_event;
pub use import::{build_import_candidates, ImportCandidate};
pub use link_marker::{append_link_marker, extract_linked_id, link_marker, strip_link_marker};
