//! TUI rendering traits for orbit types.
//!
//! Extension traits that add colored terminal rendering to orbit-core types
//! using owo_colors.

use orbit_core::entity::{Account, AccountStatus, CalendarEvent, CalendarEventStatus};
use orbit_core::event::Event;
use orbit_core::reconcile::ImportCandidate;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for AccountStatus {
    fn render(&self) -> String {
        match self {
            AccountStatus::Active => self.as_str().green().to_string(),
            AccountStatus::Inactive => self.as_str().yellow().to_string(),
            AccountStatus::Archived => self.as_str().dimmed().to_string(),
        }
    }
}

impl Render for CalendarEventStatus {
    fn render(&self) -> String {
        match self {
            CalendarEventStatus::Scheduled => self.as_str().cyan().to_string(),
            CalendarEventStatus::Completed => self.as_str().green().to_string(),
            CalendarEventStatus::Canceled => self.as_str().red().to_string(),
        }
    }
}

impl Render for Account {
    fn render(&self) -> String {
        let mut line = format!(
            "{} {} audits {}",
            self.name,
            self.status.render(),
            self.audit_frequency.as_str()
        );
        if let (Some(pending), Some(effective_at)) = (
            self.audit_frequency_pending,
            self.audit_frequency_pending_effective_at,
        ) {
            line.push_str(
                &format!(" (then {} from {})", pending.as_str(), effective_at.format("%Y-%m-%d"))
                    .dimmed()
                    .to_string(),
            );
        }
        if self.deleted_at.is_some() {
            line.push_str(&format!(" {}", "(deleted)".dimmed()));
        }
        line
    }
}

impl Render for CalendarEvent {
    fn render(&self) -> String {
        format!(
            "{} {} {} {}",
            self.scheduled_for.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            self.summary,
            format!("[{}]", self.kind.as_str()).dimmed(),
            self.status.render()
        )
    }
}

impl Render for Event {
    fn render(&self) -> String {
        let target = self.entity_id.as_deref().unwrap_or("-");
        format!(
            "{} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            self.event_type,
            target.bold()
        )
    }
}

impl Render for ImportCandidate {
    fn render(&self) -> String {
        let when = match self.external.start_date {
            Some(start) => start.format("%Y-%m-%d %H:%M").to_string(),
            None => "unscheduled".to_string(),
        };
        match self.suggested_account_id.as_deref() {
            Some(account_id) => format!(
                "{} {} {} account {}",
                when.dimmed(),
                self.external.title,
                "for".dimmed(),
                account_id.green()
            ),
            None => format!(
                "{} {} {} ({})",
                when.dimmed(),
                self.external.title,
                "ambiguous".yellow(),
                self.matched_account_ids.join(", ")
            ),
        }
    }
}

/// One-line summary of an event payload: just the touched field names.
pub fn payload_keys(event: &Event) -> String {
    if event.payload.is_empty() {
        return String::new();
    }
    let keys: Vec<&str> = event.payload.keys().map(String::as_str).collect();
    format!("{{{}}}", keys.join(", "))
}
