use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::{self, Payload};

/// A free-form note, linkable to any number of other entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub body: String,
    /// Ids of entities this note is attached to, in link order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_entity_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reduce a note payload onto the existing snapshot.
pub fn build_note_from_payload(
    id: &str,
    payload: &Payload,
    timestamp: DateTime<Utc>,
    existing: Option<&Note>,
) -> Note {
    let mut note = match existing {
        Some(current) => current.clone(),
        None => Note {
            id: id.to_string(),
            body: String::new(),
            linked_entity_ids: Vec::new(),
            deleted_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        },
    };

    if let Some(body) = payload::get_string(payload, "body") {
        note.body = body;
    }
    if let Some(linked) = payload::get_str_list(payload, "linkedEntityIds") {
        note.linked_entity_ids = linked;
    }

    note.updated_at = timestamp;
    note
}

/// Attach a note to a target entity. Linking an already-linked target is a
/// no-op so replays stay stable.
pub fn link_note_target(note: &Note, target_id: &str, timestamp: DateTime<Utc>) -> Note {
    let mut linked = note.clone();
    if !linked.linked_entity_ids.iter().any(|id| id == target_id) {
        linked.linked_entity_ids.push(target_id.to_string());
    }
    linked.updated_at = timestamp;
    linked
}

/// Detach a note from a target entity.
pub fn unlink_note_target(note: &Note, target_id: &str, timestamp: DateTime<Utc>) -> Note {
    let mut unlinked = note.clone();
    unlinked.linked_entity_ids.retain(|id| id != target_id);
    unlinked.updated_at = timestamp;
    unlinked
}
