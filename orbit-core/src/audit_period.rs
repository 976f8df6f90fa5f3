//! Audit cadence periods.
//!
//! Accounts are audited on a month-granularity cadence counted from an
//! anchor month. All arithmetic here works on month starts (first of the
//! month, 00:00:00 UTC), so period boundaries are stable regardless of the
//! time of day an event was recorded.
//!
//! A cadence change can take effect immediately or at the next period
//! boundary. Until that boundary passes, the cadence carries the old
//! frequency plus the scheduled one, and queries resolve whichever applies
//! at the asked instant.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// How often an account must be audited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditFrequency {
    #[default]
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl AuditFrequency {
    /// Period length in whole months.
    pub fn months(&self) -> u32 {
        match self {
            AuditFrequency::Monthly => 1,
            AuditFrequency::Quarterly => 3,
            AuditFrequency::SemiAnnual => 6,
            AuditFrequency::Annual => 12,
        }
    }

    /// Parse the payload form, e.g. `"quarterly"`.
    pub fn from_wire(raw: &str) -> Option<AuditFrequency> {
        match raw {
            "monthly" => Some(AuditFrequency::Monthly),
            "quarterly" => Some(AuditFrequency::Quarterly),
            "semiAnnual" => Some(AuditFrequency::SemiAnnual),
            "annual" => Some(AuditFrequency::Annual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditFrequency::Monthly => "monthly",
            AuditFrequency::Quarterly => "quarterly",
            AuditFrequency::SemiAnnual => "semiAnnual",
            AuditFrequency::Annual => "annual",
        }
    }
}

/// When a cadence change takes effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChangeTiming {
    #[default]
    Immediate,
    NextPeriod,
}

impl ChangeTiming {
    pub fn from_wire(raw: &str) -> Option<ChangeTiming> {
        match raw {
            "immediate" => Some(ChangeTiming::Immediate),
            "nextPeriod" => Some(ChangeTiming::NextPeriod),
            _ => None,
        }
    }
}

/// Floor an instant to the start of its month.
pub fn month_start(at: DateTime<Utc>) -> DateTime<Utc> {
    month_start_of_index(month_index(at))
}

/// Months since year 0 for the month containing `at`. Supports ordering and
/// signed distance between months.
pub fn month_index(at: DateTime<Utc>) -> i32 {
    at.year() * 12 + at.month0() as i32
}

/// The month start for a [`month_index`] value.
pub(crate) fn month_start_of_index(index: i32) -> DateTime<Utc> {
    let year = index.div_euclid(12);
    let month0 = index.rem_euclid(12) as u32;
    Utc.with_ymd_and_hms(year, month0 + 1, 1, 0, 0, 0)
        .single()
        .expect("First of month must be a valid UTC instant")
}

/// Shift a month start by a signed number of months. The result is always a
/// month start; a mid-month input is floored first.
pub fn add_months(start: DateTime<Utc>, months: i32) -> DateTime<Utc> {
    month_start_of_index(month_index(start) + months)
}

/// Start of the period containing `target`, for periods of `period_months`
/// counted from `anchor`. Holds for targets before the anchor as well: the
/// division must floor, not truncate toward zero, so that e.g. a target one
/// month before the anchor lands in the period starting `period_months`
/// before it.
pub fn period_start_from_anchor(
    anchor: DateTime<Utc>,
    period_months: u32,
    target: DateTime<Utc>,
) -> DateTime<Utc> {
    let span = period_months.max(1) as i32;
    let delta = month_index(target) - month_index(anchor);
    let periods = delta.div_euclid(span);
    add_months(month_start(anchor), periods * span)
}

/// The cadence state carried on an account: either stable, or stable plus a
/// change scheduled for a known boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditCadence {
    Stable {
        frequency: AuditFrequency,
        anchor_at: DateTime<Utc>,
    },
    PendingChange {
        frequency: AuditFrequency,
        anchor_at: DateTime<Utc>,
        pending_frequency: AuditFrequency,
        pending_effective_at: DateTime<Utc>,
    },
}

impl AuditCadence {
    /// Cadence for a freshly created account: anchored to the month of
    /// creation.
    pub fn initial(frequency: AuditFrequency, created_at: DateTime<Utc>) -> AuditCadence {
        AuditCadence::Stable {
            frequency,
            anchor_at: month_start(created_at),
        }
    }

    /// The recorded (possibly superseded-in-the-future) frequency.
    pub fn frequency(&self) -> AuditFrequency {
        match self {
            AuditCadence::Stable { frequency, .. } => *frequency,
            AuditCadence::PendingChange { frequency, .. } => *frequency,
        }
    }

    pub fn anchor_at(&self) -> DateTime<Utc> {
        match self {
            AuditCadence::Stable { anchor_at, .. } => *anchor_at,
            AuditCadence::PendingChange { anchor_at, .. } => *anchor_at,
        }
    }

    /// Collapse a pending change whose boundary has passed by `at`. The new
    /// frequency re-anchors at its effective boundary, so later periods are
    /// counted from there.
    pub fn normalized_at(&self, at: DateTime<Utc>) -> AuditCadence {
        match *self {
            AuditCadence::PendingChange {
                pending_frequency,
                pending_effective_at,
                ..
            } if at >= pending_effective_at => AuditCadence::Stable {
                frequency: pending_frequency,
                anchor_at: pending_effective_at,
            },
            other => other,
        }
    }

    /// The frequency in force at `at`.
    pub fn effective_frequency_at(&self, at: DateTime<Utc>) -> AuditFrequency {
        self.normalized_at(at).frequency()
    }

    /// Start of the audit period containing `at`.
    pub fn period_start_at(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self.normalized_at(at) {
            AuditCadence::Stable {
                frequency,
                anchor_at,
            }
            | AuditCadence::PendingChange {
                frequency,
                anchor_at,
                ..
            } => period_start_from_anchor(anchor_at, frequency.months(), at),
        }
    }

    /// First boundary strictly after the period containing `at`. A pending
    /// change that would land earlier wins.
    pub fn next_boundary_at(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let normalized = self.normalized_at(at);
        let natural = add_months(
            normalized.period_start_at(at),
            normalized.frequency().months() as i32,
        );
        match normalized {
            AuditCadence::PendingChange {
                pending_effective_at,
                ..
            } if pending_effective_at < natural => pending_effective_at,
            _ => natural,
        }
    }

    /// Apply a frequency change requested at `at`.
    ///
    /// Immediate changes re-anchor to the month of the request. Next-period
    /// changes keep the current cadence running and schedule the new
    /// frequency for the upcoming boundary. An already-pending change is
    /// replaced, not stacked.
    pub fn with_change(
        &self,
        new_frequency: AuditFrequency,
        timing: ChangeTiming,
        at: DateTime<Utc>,
    ) -> AuditCadence {
        let current = self.normalized_at(at);
        match timing {
            ChangeTiming::Immediate => AuditCadence::Stable {
                frequency: new_frequency,
                anchor_at: month_start(at),
            },
            ChangeTiming::NextPeriod => {
                let boundary = add_months(
                    current.period_start_at(at),
                    current.frequency().months() as i32,
                );
                AuditCadence::PendingChange {
                    frequency: current.frequency(),
                    anchor_at: current.anchor_at(),
                    pending_frequency: new_frequency,
                    pending_effective_at: boundary,
                }
            }
        }
    }
}
