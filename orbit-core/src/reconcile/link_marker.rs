//! The notes-field marker tying an external calendar event to ours.
//!
//! External calendars offer no custom fields, so the link is a plain
//! `crmOrbitId:<id>` token embedded in the event notes. Writers append it,
//! readers extract it, and comparisons strip it so the marker itself never
//! counts as content drift.

/// Marker token prefix. The id runs to the next whitespace.
pub const LINK_MARKER_PREFIX: &str = "crmOrbitId:";

/// The marker token for a calendar event id.
pub fn link_marker(event_id: &str) -> String {
    format!("{LINK_MARKER_PREFIX}{event_id}")
}

/// Append the marker to a notes body, preserving existing content.
pub fn append_link_marker(notes: Option<&str>, event_id: &str) -> String {
    let marker = link_marker(event_id);
    match notes.map(str::trim) {
        Some(body) if !body.is_empty() => format!("{body}\n\n{marker}"),
        _ => marker,
    }
}

/// Pull the linked event id out of a notes body, if a marker is present.
pub fn extract_linked_id(text: &str) -> Option<String> {
    let start = text.find(LINK_MARKER_PREFIX)? + LINK_MARKER_PREFIX.len();
    let id: String = text[start..]
        .chars()
        .take_while(|c| !c.is_whitespace())
        .collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Remove every marker token and tidy the leftover whitespace, leaving the
/// human-written content only.
pub fn strip_link_marker(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(position) = rest.find(LINK_MARKER_PREFIX) {
        out.push_str(&rest[..position]);
        let after = &rest[position + LINK_MARKER_PREFIX.len()..];
        let token_end = after
            .find(char::is_whitespace)
            .unwrap_or(after.len());
        rest = &after[token_end..];
    }
    out.push_str(rest);
    out.trim().to_string()
}
