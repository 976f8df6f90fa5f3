use std::path::Path;

use anyhow::Result;
use orbit_core::event::Event;
use orbit_core::snapshot::Snapshot;
use owo_colors::OwoColorize;

use crate::commands::ReplayContext;
use crate::render::{payload_keys, Render};

pub fn run(log_path: &Path, entity_id: &str, json: bool) -> Result<()> {
    let context = ReplayContext::load(log_path)?;

    let matching: Vec<&Event> = context
        .events
        .iter()
        .filter(|event| event.entity_id.as_deref() == Some(entity_id))
        .collect();

    if matching.is_empty() {
        anyhow::bail!("No events found for entity '{}'", entity_id);
    }

    let state = entity_state(&context.snapshot, entity_id);

    if json {
        let report = serde_json::json!({
            "entityId": entity_id,
            "events": matching,
            "state": state,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("{} events for {}", matching.len(), entity_id).bold()
    );
    for event in &matching {
        let keys = payload_keys(event);
        if keys.is_empty() {
            println!("  {}", event.render());
        } else {
            println!("  {} {}", event.render(), keys.dimmed());
        }
    }

    println!("\n{}", "Current state".bold());
    match state {
        Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
        None => println!("{}", "Nothing materialized; every event was a no-op".dimmed()),
    }

    Ok(())
}

/// Look the entity up across every snapshot map; ids are unique across
/// kinds in practice, but the first hit wins either way.
fn entity_state(snapshot: &Snapshot, entity_id: &str) -> Option<serde_json::Value> {
    if let Some(organization) = snapshot.organizations.get(entity_id) {
        return serde_json::to_value(organization).ok();
    }
    if let Some(account) = snapshot.accounts.get(entity_id) {
        return serde_json::to_value(account).ok();
    }
    if let Some(contact) = snapshot.contacts.get(entity_id) {
        return serde_json::to_value(contact).ok();
    }
    if let Some(note) = snapshot.notes.get(entity_id) {
        return serde_json::to_value(note).ok();
    }
    if let Some(calendar_event) = snapshot.calendar_events.get(entity_id) {
        return serde_json::to_value(calendar_event).ok();
    }
    if let Some(code) = snapshot.codes.get(entity_id) {
        return serde_json::to_value(code).ok();
    }
    None
}
