//! Loading the working set from disk.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use orbit_core::event::{load_event_log, Event};
use orbit_core::external::{load_snapshots, ExternalEventSnapshot};
use orbit_core::snapshot::canonical_sort;

/// Load an event log and put it in canonical order.
pub fn load_events(path: &Path) -> Result<Vec<Event>> {
    let mut events = load_event_log(path)
        .with_context(|| format!("Could not load event log {}", path.display()))?;
    canonical_sort(&mut events);
    Ok(events)
}

/// Load an external provider dump.
pub fn load_external(path: &Path) -> Result<Vec<ExternalEventSnapshot>> {
    load_snapshots(path)
        .with_context(|| format!("Could not load external snapshot {}", path.display()))
}

/// Load an explicit link map: externalEventId to calendarEventId.
pub fn load_links(path: &Path) -> Result<HashMap<String, String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read links file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid links file {}", path.display()))
}
