//! Accounts: the audited customer sites.
//!
//! Besides plain profile fields, an account carries its audit cadence state.
//! The cadence fields mirror [`AuditCadence`]: the pending pair is either
//! fully absent (stable) or fully present (a change is scheduled), never
//! half-set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit_period::{month_start, AuditCadence, AuditFrequency, ChangeTiming};
use crate::payload::{self, Payload};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    Archived,
}

impl AccountStatus {
    pub fn from_wire(raw: &str) -> Option<AccountStatus> {
        match raw {
            "active" => Some(AccountStatus::Active),
            "inactive" => Some(AccountStatus::Inactive),
            "archived" => Some(AccountStatus::Archived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    pub name: String,
    /// Alternate names external calendars may use for this account.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub status: AccountStatus,
    pub audit_frequency: AuditFrequency,
    /// Month start the current cadence counts periods from.
    pub audit_frequency_anchor_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_frequency_updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_frequency_pending: Option<AuditFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_frequency_pending_effective_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// View the stored cadence fields as an [`AuditCadence`].
    pub fn audit_cadence(&self) -> AuditCadence {
        match (
            self.audit_frequency_pending,
            self.audit_frequency_pending_effective_at,
        ) {
            (Some(pending_frequency), Some(pending_effective_at)) => AuditCadence::PendingChange {
                frequency: self.audit_frequency,
                anchor_at: self.audit_frequency_anchor_at,
                pending_frequency,
                pending_effective_at,
            },
            _ => AuditCadence::Stable {
                frequency: self.audit_frequency,
                anchor_at: self.audit_frequency_anchor_at,
            },
        }
    }

    /// The audit frequency in force at `at`.
    pub fn effective_audit_frequency_at(&self, at: DateTime<Utc>) -> AuditFrequency {
        self.audit_cadence().effective_frequency_at(at)
    }

    fn set_cadence(&mut self, cadence: AuditCadence) {
        match cadence {
            AuditCadence::Stable {
                frequency,
                anchor_at,
            } => {
                self.audit_frequency = frequency;
                self.audit_frequency_anchor_at = anchor_at;
                self.audit_frequency_pending = None;
                self.audit_frequency_pending_effective_at = None;
            }
            AuditCadence::PendingChange {
                frequency,
                anchor_at,
                pending_frequency,
                pending_effective_at,
            } => {
                self.audit_frequency = frequency;
                self.audit_frequency_anchor_at = anchor_at;
                self.audit_frequency_pending = Some(pending_frequency);
                self.audit_frequency_pending_effective_at = Some(pending_effective_at);
            }
        }
    }
}

/// Reduce an account payload onto the existing snapshot.
///
/// A `frequency` field on a fresh account sets the initial cadence anchored
/// to the creation month; on an existing account it runs a cadence change,
/// honoring the optional `timing` field (`immediate` when absent or
/// malformed).
pub fn build_account_from_payload(
    id: &str,
    payload: &Payload,
    timestamp: DateTime<Utc>,
    existing: Option<&Account>,
) -> Account {
    let is_new = existing.is_none();
    let mut account = match existing {
        Some(current) => current.clone(),
        None => Account {
            id: id.to_string(),
            organization_id: None,
            name: String::new(),
            aliases: Vec::new(),
            address: None,
            status: AccountStatus::default(),
            audit_frequency: AuditFrequency::default(),
            audit_frequency_anchor_at: month_start(timestamp),
            audit_frequency_updated_at: None,
            audit_frequency_pending: None,
            audit_frequency_pending_effective_at: None,
            deleted_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        },
    };

    if let Some(name) = payload::get_string(payload, "name") {
        account.name = name;
    }
    if let Some(aliases) = payload::get_str_list(payload, "aliases") {
        account.aliases = aliases;
    }
    if let Some(organization_id) = payload::get_string(payload, "organizationId") {
        account.organization_id = Some(organization_id);
    }
    if let Some(address) = payload::get_string(payload, "address") {
        // An empty string in an update payload clears the field.
        account.address = if address.is_empty() { None } else { Some(address) };
    }
    if let Some(status) = payload::get_str(payload, "status").and_then(AccountStatus::from_wire) {
        account.status = status;
    }

    if let Some(frequency) =
        payload::get_str(payload, "frequency").and_then(AuditFrequency::from_wire)
    {
        if is_new {
            account.set_cadence(AuditCadence::initial(frequency, timestamp));
        } else {
            let timing = payload::get_str(payload, "timing")
                .and_then(ChangeTiming::from_wire)
                .unwrap_or_default();
            let cadence = account.audit_cadence().with_change(frequency, timing, timestamp);
            account.set_cadence(cadence);
            account.audit_frequency_updated_at = Some(timestamp);
        }
    }

    account.updated_at = timestamp;
    account
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::parse_timestamp;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().expect("Should be a JSON object").clone()
    }

    fn at(raw: &str) -> DateTime<Utc> {
        parse_timestamp(raw).expect("Should parse timestamp")
    }

    #[test]
    fn test_creation_defaults_and_anchor() {
        let account = build_account_from_payload(
            "acc-1",
            &payload(json!({ "name": "Harborview" })),
            at("2024-02-20T14:00:00Z"),
            None,
        );

        assert_eq!(account.name, "Harborview");
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.audit_frequency, AuditFrequency::Monthly);
        assert_eq!(
            account.audit_frequency_anchor_at,
            at("2024-02-01T00:00:00Z")
        );
        assert_eq!(account.audit_frequency_pending, None);
        assert_eq!(account.audit_frequency_updated_at, None);
    }

    #[test]
    fn test_creation_with_explicit_frequency() {
        let account = build_account_from_payload(
            "acc-1",
            &payload(json!({ "name": "Harborview", "frequency": "quarterly" })),
            at("2024-02-20T14:00:00Z"),
            None,
        );

        assert_eq!(account.audit_frequency, AuditFrequency::Quarterly);
        assert_eq!(
            account.audit_frequency_anchor_at,
            at("2024-02-01T00:00:00Z")
        );
        // The initial cadence is not an update.
        assert_eq!(account.audit_frequency_updated_at, None);
    }

    #[test]
    fn test_next_period_change_sets_pending_pair() {
        let account = build_account_from_payload(
            "acc-1",
            &payload(json!({ "name": "Harborview", "frequency": "monthly" })),
            at("2024-01-05T09:00:00Z"),
            None,
        );
        let changed = build_account_from_payload(
            "acc-1",
            &payload(json!({ "frequency": "annual", "timing": "nextPeriod" })),
            at("2024-05-12T10:00:00Z"),
            Some(&account),
        );

        assert_eq!(changed.audit_frequency, AuditFrequency::Monthly);
        assert_eq!(changed.audit_frequency_pending, Some(AuditFrequency::Annual));
        assert_eq!(
            changed.audit_frequency_pending_effective_at,
            Some(at("2024-06-01T00:00:00Z"))
        );
        assert_eq!(
            changed.audit_frequency_updated_at,
            Some(at("2024-05-12T10:00:00Z"))
        );

        assert_eq!(
            changed.effective_audit_frequency_at(at("2024-05-31T00:00:00Z")),
            AuditFrequency::Monthly
        );
        assert_eq!(
            changed.effective_audit_frequency_at(at("2024-06-01T00:00:00Z")),
            AuditFrequency::Annual
        );
    }

    #[test]
    fn test_immediate_change_clears_pending_pair() {
        let account = build_account_from_payload(
            "acc-1",
            &payload(json!({ "name": "Harborview" })),
            at("2024-01-05T09:00:00Z"),
            None,
        );
        let pending = build_account_from_payload(
            "acc-1",
            &payload(json!({ "frequency": "annual", "timing": "nextPeriod" })),
            at("2024-03-10T10:00:00Z"),
            Some(&account),
        );
        let immediate = build_account_from_payload(
            "acc-1",
            &payload(json!({ "frequency": "quarterly", "timing": "immediate" })),
            at("2024-03-20T10:00:00Z"),
            Some(&pending),
        );

        assert_eq!(immediate.audit_frequency, AuditFrequency::Quarterly);
        assert_eq!(
            immediate.audit_frequency_anchor_at,
            at("2024-03-01T00:00:00Z")
        );
        assert_eq!(immediate.audit_frequency_pending, None);
        assert_eq!(immediate.audit_frequency_pending_effective_at, None);
    }

    #[test]
    fn test_malformed_timing_defaults_to_immediate() {
        let account = build_account_from_payload(
            "acc-1",
            &payload(json!({ "name": "Harborview" })),
            at("2024-01-05T09:00:00Z"),
            None,
        );
        let changed = build_account_from_payload(
            "acc-1",
            &payload(json!({ "frequency": "semiAnnual", "timing": "whenever" })),
            at("2024-04-02T09:00:00Z"),
            Some(&account),
        );

        assert_eq!(changed.audit_frequency, AuditFrequency::SemiAnnual);
        assert_eq!(changed.audit_frequency_pending, None);
    }

    #[test]
    fn test_malformed_fields_fall_back() {
        let account = build_account_from_payload(
            "acc-1",
            &payload(json!({ "name": "Harborview", "aliases": ["HV"] })),
            at("2024-01-05T09:00:00Z"),
            None,
        );
        let updated = build_account_from_payload(
            "acc-1",
            &payload(json!({
                "name": null,
                "aliases": "HV2",
                "status": "paused",
                "frequency": "fortnightly"
            })),
            at("2024-01-06T09:00:00Z"),
            Some(&account),
        );

        assert_eq!(updated.name, "Harborview");
        assert_eq!(updated.aliases, vec!["HV".to_string()]);
        assert_eq!(updated.status, AccountStatus::Active);
        assert_eq!(updated.audit_frequency, AuditFrequency::Monthly);
    }
}
