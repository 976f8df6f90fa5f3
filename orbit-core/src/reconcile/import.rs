//! Import candidates: external events that look like audits we don't have.
//!
//! An unlinked external event whose title matches an account name or alias
//! is offered to the user as an import candidate. Matching never guesses:
//! with several matching accounts a single suggestion is made only when
//! prior audit history points at exactly one of them, otherwise the choice
//! is left open and every match is listed.

use std::collections::HashSet;

use serde::Serialize;

use crate::entity::account::Account;
use crate::entity::calendar_event::{CalendarEvent, CalendarEventKind};
use crate::external::{ExternalEventSnapshot, ExternalEventStatus};

/// An external event proposed for import, with the accounts it could
/// belong to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCandidate {
    pub external: ExternalEventSnapshot,
    /// Every account whose name or alias equals the external title.
    pub matched_account_ids: Vec<String>,
    /// Set only when the match is unambiguous, by name or by history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_account_id: Option<String>,
}

/// Scan a provider dump for importable audit candidates.
///
/// Already-linked and canceled external events are never candidates, and
/// an external event matching no account at all is ignored rather than
/// guessed about.
pub fn build_import_candidates(
    external_events: &[ExternalEventSnapshot],
    accounts: &[Account],
    internal_events: &[CalendarEvent],
    linked_external_ids: &HashSet<String>,
) -> Vec<ImportCandidate> {
    external_events
        .iter()
        .filter(|external| external.status != ExternalEventStatus::Canceled)
        .filter(|external| !linked_external_ids.contains(&external.external_event_id))
        .filter_map(|external| {
            let matched: Vec<String> = accounts
                .iter()
                .filter(|account| account.deleted_at.is_none())
                .filter(|account| {
                    account.name == external.title
                        || account.aliases.iter().any(|alias| alias == &external.title)
                })
                .map(|account| account.id.clone())
                .collect();
            if matched.is_empty() {
                return None;
            }

            let suggested = if matched.len() == 1 {
                Some(matched[0].clone())
            } else {
                history_pick(&external.title, internal_events, &matched)
            };

            Some(ImportCandidate {
                external: external.clone(),
                matched_account_ids: matched,
                suggested_account_id: suggested,
            })
        })
        .collect()
}

/// Disambiguate via prior audit events with the same summary: a suggestion
/// is made only when they all point at the same matched account.
fn history_pick(
    title: &str,
    internal_events: &[CalendarEvent],
    matched_account_ids: &[String],
) -> Option<String> {
    let mut pick: Option<&str> = None;
    for event in internal_events {
        if event.kind != CalendarEventKind::Audit || event.summary != title {
            continue;
        }
        let Some(audit_data) = event.audit_data.as_ref() else {
            continue;
        };
        let account_id = audit_data.account_id.as_str();
        if !matched_account_ids.iter().any(|id| id == account_id) {
            continue;
        }
        match pick {
            None => pick = Some(account_id),
            Some(existing) if existing == account_id => {}
            Some(_) => return None,
        }
    }
    pick.map(str::to_string)
}
