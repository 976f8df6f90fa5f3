use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use orbit_core::date_range::DateRange;
use orbit_core::entity::CalendarEvent;
use orbit_core::recurrence::expand_occurrences;
use owo_colors::OwoColorize;

use crate::commands::ReplayContext;

pub fn run(log_path: &Path, range: DateRange) -> Result<()> {
    let context = ReplayContext::load(log_path)?;
    let (from, to) = range.bounds();

    let mut occurrences: Vec<CalendarEvent> = Vec::new();
    for calendar_event in context.snapshot.active_calendar_events() {
        if calendar_event.recurrence_rule.is_some() {
            occurrences.extend(expand_occurrences(calendar_event, from, to)?);
        } else if range.contains(calendar_event.scheduled_for) {
            occurrences.push(calendar_event.clone());
        }
    }

    occurrences.sort_by(|a, b| {
        a.scheduled_for
            .cmp(&b.scheduled_for)
            .then_with(|| a.id.cmp(&b.id))
    });

    if occurrences.is_empty() {
        println!("{}", "No occurrences in this window".dimmed());
        return Ok(());
    }

    // Group occurrences by day and print
    let mut current_date: Option<String> = None;

    for occurrence in &occurrences {
        let date_label = format_date_label(occurrence.scheduled_for);

        if current_date.as_ref() != Some(&date_label) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", date_label.bold());
            current_date = Some(date_label);
        }

        let time = occurrence.scheduled_for.format("%H:%M");
        let kind_tag = format!("[{}]", occurrence.kind.as_str());
        let mut line = format!("  {} {} {}", time, occurrence.summary, kind_tag.dimmed());
        if occurrence.recurrence_id.is_some() {
            line.push_str(&format!(" {}", "(recurring)".dimmed()));
        }
        println!("{}", line);
    }

    Ok(())
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
fn format_date_label(at: DateTime<Utc>) -> String {
    let today = Utc::now().date_naive();
    let date = at.date_naive();

    let diff = (date - today).num_days();
    match diff {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d %Y").to_string(),
    }
}
