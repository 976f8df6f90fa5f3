use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::{self, Payload};

/// A customer organization, the top grouping above accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reduce an organization payload onto the existing snapshot.
pub fn build_organization_from_payload(
    id: &str,
    payload: &Payload,
    timestamp: DateTime<Utc>,
    existing: Option<&Organization>,
) -> Organization {
    let mut organization = match existing {
        Some(current) => current.clone(),
        None => Organization {
            id: id.to_string(),
            name: String::new(),
            deleted_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        },
    };

    if let Some(name) = payload::get_string(payload, "name") {
        organization.name = name;
    }

    organization.updated_at = timestamp;
    organization
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::parse_timestamp;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().expect("Should be a JSON object").clone()
    }

    #[test]
    fn test_creation_from_payload() {
        let at = parse_timestamp("2024-01-01T09:00:00Z").expect("Should parse timestamp");
        let organization =
            build_organization_from_payload("org-1", &payload(json!({ "name": "Vista" })), at, None);

        assert_eq!(organization.id, "org-1");
        assert_eq!(organization.name, "Vista");
        assert_eq!(organization.created_at, at);
        assert_eq!(organization.updated_at, at);
    }

    #[test]
    fn test_malformed_name_falls_back_to_existing() {
        let created = parse_timestamp("2024-01-01T09:00:00Z").expect("Should parse timestamp");
        let updated = parse_timestamp("2024-01-02T09:00:00Z").expect("Should parse timestamp");
        let first =
            build_organization_from_payload("org-1", &payload(json!({ "name": "Vista" })), created, None);

        let second = build_organization_from_payload(
            "org-1",
            &payload(json!({ "name": 42 })),
            updated,
            Some(&first),
        );

        assert_eq!(second.name, "Vista");
        assert_eq!(second.created_at, created);
        assert_eq!(second.updated_at, updated);
    }
}
