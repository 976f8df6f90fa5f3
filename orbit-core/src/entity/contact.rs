use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::{self, Payload};

/// A person attached to an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reduce a contact payload onto the existing snapshot.
pub fn build_contact_from_payload(
    id: &str,
    payload: &Payload,
    timestamp: DateTime<Utc>,
    existing: Option<&Contact>,
) -> Contact {
    let mut contact = match existing {
        Some(current) => current.clone(),
        None => Contact {
            id: id.to_string(),
            account_id: None,
            name: String::new(),
            email: None,
            phone: None,
            role: None,
            deleted_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        },
    };

    if let Some(name) = payload::get_string(payload, "name") {
        contact.name = name;
    }
    if let Some(account_id) = payload::get_string(payload, "accountId") {
        contact.account_id = Some(account_id);
    }
    if let Some(email) = payload::get_string(payload, "email") {
        contact.email = optional(email);
    }
    if let Some(phone) = payload::get_string(payload, "phone") {
        contact.phone = optional(phone);
    }
    if let Some(role) = payload::get_string(payload, "role") {
        contact.role = optional(role);
    }

    contact.updated_at = timestamp;
    contact
}

/// An empty string in an update payload clears the field.
fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
