use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::{self, Payload};

/// An access code for a site: gate, lockbox, alarm panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Code {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reduce a code payload onto the existing snapshot.
pub fn build_code_from_payload(
    id: &str,
    payload: &Payload,
    timestamp: DateTime<Utc>,
    existing: Option<&Code>,
) -> Code {
    let mut code = match existing {
        Some(current) => current.clone(),
        None => Code {
            id: id.to_string(),
            account_id: None,
            label: String::new(),
            value: String::new(),
            notes: None,
            deleted_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        },
    };

    if let Some(label) = payload::get_string(payload, "label") {
        code.label = label;
    }
    if let Some(value) = payload::get_string(payload, "value") {
        code.value = value;
    }
    if let Some(account_id) = payload::get_string(payload, "accountId") {
        code.account_id = Some(account_id);
    }
    if let Some(notes) = payload::get_string(payload, "notes") {
        code.notes = if notes.is_empty() { None } else { Some(notes) };
    }

    code.updated_at = timestamp;
    code
}
