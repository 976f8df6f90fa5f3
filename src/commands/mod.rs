pub mod history;
pub mod occurrences;
pub mod reconcile;
pub mod snapshot;

use std::path::Path;

use anyhow::Result;
use orbit_core::event::Event;
use orbit_core::snapshot::Snapshot;

use crate::store;

/// Common context for log-backed commands, loaded once per invocation.
pub struct ReplayContext {
    pub events: Vec<Event>,
    pub snapshot: Snapshot,
}

impl ReplayContext {
    /// Load the log in canonical order and fold it into a snapshot.
    pub fn load(log_path: &Path) -> Result<Self> {
        let events = store::load_events(log_path)?;
        let snapshot = Snapshot::replay(&events);

        Ok(Self { events, snapshot })
    }
}
