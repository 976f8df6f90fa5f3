use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::ReplayContext;
use crate::render::Render;

pub fn run(log_path: &Path, json: bool) -> Result<()> {
    let context = ReplayContext::load(log_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&context.snapshot)?);
        return Ok(());
    }

    let snapshot = &context.snapshot;
    println!("{} events replayed", context.events.len());

    if !snapshot.organizations.is_empty() {
        println!("\n{}", "Organizations".bold());
        for organization in snapshot.organizations.values() {
            let mut line = format!("  {}", organization.name);
            if organization.deleted_at.is_some() {
                line.push_str(&format!(" {}", "(deleted)".dimmed()));
            }
            println!("{}", line);
        }
    }

    if !snapshot.accounts.is_empty() {
        println!("\n{}", "Accounts".bold());
        for account in snapshot.accounts.values() {
            println!("  {}", account.render());
        }
    }

    if !snapshot.contacts.is_empty() {
        println!("\n{}", "Contacts".bold());
        for contact in snapshot.contacts.values() {
            let mut line = format!("  {}", contact.name);
            if let Some(role) = contact.role.as_deref() {
                line.push_str(&format!(" {}", format!("({})", role).dimmed()));
            }
            if contact.deleted_at.is_some() {
                line.push_str(&format!(" {}", "(deleted)".dimmed()));
            }
            println!("{}", line);
        }
    }

    if !snapshot.calendar_events.is_empty() {
        println!("\n{}", "Calendar events".bold());
        for calendar_event in snapshot.calendar_events.values() {
            let mut line = format!("  {}", calendar_event.render());
            if calendar_event.recurrence_rule.is_some() {
                line.push_str(&format!(" {}", "(recurring)".dimmed()));
            }
            println!("{}", line);
        }
    }

    if !snapshot.notes.is_empty() {
        println!("\n{}", "Notes".bold());
        for note in snapshot.notes.values() {
            let preview: String = note.body.chars().take(60).collect();
            let mut line = format!("  {}", preview);
            if !note.linked_entity_ids.is_empty() {
                line.push_str(
                    &format!(" [{}]", note.linked_entity_ids.join(", "))
                        .dimmed()
                        .to_string(),
                );
            }
            if note.deleted_at.is_some() {
                line.push_str(&format!(" {}", "(deleted)".dimmed()));
            }
            println!("{}", line);
        }
    }

    if !snapshot.codes.is_empty() {
        println!("\n{}", "Codes".bold());
        for code in snapshot.codes.values() {
            let mut line = format!("  {} {}", code.label, code.value.dimmed());
            if code.deleted_at.is_some() {
                line.push_str(&format!(" {}", "(deleted)".dimmed()));
            }
            println!("{}", line);
        }
    }

    Ok(())
}
