use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use orbit_core::entity::{Account, CalendarEvent};
use orbit_core::event::Event;
use orbit_core::reconcile::{build_import_candidates, extract_linked_id, reconcile_event};
use owo_colors::OwoColorize;

use crate::commands::ReplayContext;
use crate::render::{payload_keys, Render};
use crate::store;

pub fn run(
    log_path: &Path,
    external_path: &Path,
    links_path: Option<&Path>,
    device_id: &str,
    json: bool,
) -> Result<()> {
    let context = ReplayContext::load(log_path)?;
    let external_events = store::load_external(external_path)?;

    // Resolve links: the explicit file first, then markers embedded in the
    // external notes.
    let mut links: HashMap<String, String> = match links_path {
        Some(path) => store::load_links(path)?,
        None => HashMap::new(),
    };
    for external in &external_events {
        if let Some(linked_id) = external.notes.as_deref().and_then(extract_linked_id) {
            links
                .entry(external.external_event_id.clone())
                .or_insert(linked_id);
        }
    }

    let now = Utc::now();
    let mut emitted: Vec<Event> = Vec::new();
    let mut dangling_links: Vec<&str> = Vec::new();

    for external in &external_events {
        let Some(internal_id) = links.get(&external.external_event_id) else {
            continue;
        };
        match context.snapshot.calendar_events.get(internal_id) {
            Some(internal) => emitted.extend(reconcile_event(internal, external, device_id, now)),
            None => dangling_links.push(&external.external_event_id),
        }
    }

    let linked_ids: HashSet<String> = links.keys().cloned().collect();
    let accounts: Vec<Account> = context.snapshot.active_accounts().cloned().collect();
    let internal_events: Vec<CalendarEvent> = context
        .snapshot
        .calendar_events
        .values()
        .cloned()
        .collect();
    let candidates =
        build_import_candidates(&external_events, &accounts, &internal_events, &linked_ids);

    if json {
        let report = serde_json::json!({
            "events": emitted,
            "importCandidates": candidates,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if emitted.is_empty() {
        println!("{}", "Linked events are in sync".dimmed());
    } else {
        println!("{}", format!("{} events to apply", emitted.len()).bold());
        for event in &emitted {
            let keys = payload_keys(event);
            if keys.is_empty() {
                println!("  {}", event.render());
            } else {
                println!("  {} {}", event.render(), keys.dimmed());
            }
        }
    }

    if !candidates.is_empty() {
        println!("\n{}", "Import candidates".bold());
        for candidate in &candidates {
            println!("  {}", candidate.render());
        }
    }

    if !dangling_links.is_empty() {
        println!(
            "\n{}",
            format!(
                "{} external events link to calendar events that no longer exist: {}",
                dangling_links.len(),
                dangling_links.join(", ")
            )
            .yellow()
        );
    }

    Ok(())
}
