//! Materializing recurring calendar events into concrete occurrences.
//!
//! Base events store a [`RecurrenceRule`]; nothing is persisted per
//! occurrence. Expansion walks the rule's own timeline starting at the base
//! instant, so `count` caps the total occurrences of the rule, not the
//! number that happen to fall inside the queried window. Candidates that
//! don't exist on the calendar (Feb 30, Feb 29 off leap years) are skipped
//! outright and never count as occurrences.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use crate::audit_period::{month_index, month_start_of_index};
use crate::entity::calendar_event::{CalendarEvent, RecurrenceFrequency};
use crate::error::{OrbitError, OrbitResult};

/// Materialize the occurrences of `base` falling inside
/// `[range_start, range_end]`, both ends inclusive, in ascending order.
///
/// An event without a recurrence rule expands to nothing; callers decide
/// separately whether the plain event itself is in range.
pub fn expand_occurrences(
    base: &CalendarEvent,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> OrbitResult<Vec<CalendarEvent>> {
    let Some(rule) = base.recurrence_rule.as_ref() else {
        return Ok(Vec::new());
    };
    if range_start > range_end {
        return Err(OrbitError::InvalidRange(format!(
            "window start {range_start} is after window end {range_end}"
        )));
    }
    if rule.interval == 0 {
        return Err(OrbitError::InvalidRecurrence(
            "interval must be at least 1".to_string(),
        ));
    }

    let mut expansion = Expansion {
        base,
        until: rule.until,
        count: rule.count,
        range_start,
        range_end,
        emitted: 0,
        occurrences: Vec::new(),
    };

    match rule.frequency {
        RecurrenceFrequency::Daily => expansion.run_daily(rule.interval),
        RecurrenceFrequency::Weekly => {
            expansion.run_weekly(rule.interval, rule.by_week_day.as_deref())
        }
        RecurrenceFrequency::Monthly => {
            expansion.run_monthly(rule.interval, rule.by_month_day.as_deref())
        }
        RecurrenceFrequency::Yearly => expansion.run_yearly(rule.interval),
    }

    Ok(expansion.occurrences)
}

enum Step {
    Continue,
    Done,
}

struct Expansion<'a> {
    base: &'a CalendarEvent,
    until: Option<DateTime<Utc>>,
    count: Option<u32>,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    emitted: u32,
    occurrences: Vec<CalendarEvent>,
}

impl Expansion<'_> {
    /// Account for the next occurrence on the rule timeline. Callers feed
    /// occurrences strictly ascending, never before the base instant, so
    /// the first admitted one is the base occurrence itself.
    fn admit(&mut self, occurs_at: DateTime<Utc>) -> Step {
        if let Some(until) = self.until {
            if occurs_at > until {
                return Step::Done;
            }
        }
        if let Some(count) = self.count {
            if self.emitted >= count {
                return Step::Done;
            }
        }
        let is_base = self.emitted == 0;
        self.emitted += 1;
        if occurs_at > self.range_end {
            return Step::Done;
        }
        if occurs_at >= self.range_start {
            self.occurrences
                .push(occurrence(self.base, occurs_at, is_base));
        }
        Step::Continue
    }

    fn run_daily(&mut self, interval: u32) {
        let step = Duration::days(interval as i64);
        let mut occurs_at = self.base.scheduled_for;
        while let Step::Continue = self.admit(occurs_at) {
            occurs_at = occurs_at + step;
        }
    }

    fn run_weekly(&mut self, interval: u32, by_week_day: Option<&[u8]>) {
        let Some(days) = by_week_day else {
            // No day list: repeat on the base weekday.
            let step = Duration::weeks(interval as i64);
            let mut occurs_at = self.base.scheduled_for;
            while let Step::Continue = self.admit(occurs_at) {
                occurs_at = occurs_at + step;
            }
            return;
        };
        let days = sorted_days(days);

        let base_at = self.base.scheduled_for;
        let time_of_day = base_at.time();
        let base_date = base_at.date_naive();
        // Weeks run Sunday through Saturday, day 0 = Sunday.
        let week_origin =
            base_date - Duration::days(base_date.weekday().num_days_from_sunday() as i64);
        let week_step = 7 * interval as i64;

        'weeks: for week in 0i64.. {
            let week_start = week_origin + Duration::days(week * week_step);
            if week_start.and_time(NaiveTime::MIN).and_utc() > self.range_end {
                break;
            }
            for &day in &days {
                let occurs_on = week_start + Duration::days(day as i64);
                let occurs_at = occurs_on.and_time(time_of_day).and_utc();
                if occurs_at < base_at {
                    continue;
                }
                if let Step::Done = self.admit(occurs_at) {
                    break 'weeks;
                }
            }
        }
    }

    fn run_monthly(&mut self, interval: u32, by_month_day: Option<&[u8]>) {
        let base_at = self.base.scheduled_for;
        let time_of_day = base_at.time();
        let days = match by_month_day {
            Some(days) => sorted_days(days),
            None => vec![base_at.day() as u8],
        };
        let base_month = month_index(base_at);
        let step = interval as i32;

        'months: for period in 0i32.. {
            let month_begin = month_start_of_index(base_month + period * step);
            if month_begin > self.range_end {
                break;
            }
            for &day in &days {
                let Some(occurs_on) =
                    NaiveDate::from_ymd_opt(month_begin.year(), month_begin.month(), day as u32)
                else {
                    // Day doesn't exist in this month: skipped, not counted.
                    continue;
                };
                let occurs_at = occurs_on.and_time(time_of_day).and_utc();
                if occurs_at < base_at {
                    continue;
                }
                if let Step::Done = self.admit(occurs_at) {
                    break 'months;
                }
            }
        }
    }

    fn run_yearly(&mut self, interval: u32) {
        let base_at = self.base.scheduled_for;
        let time_of_day = base_at.time();
        let (month, day) = (base_at.month(), base_at.day());
        let step = interval as i32;

        for period in 0i32.. {
            let year = base_at.year() + period * step;
            if month_start_of_index(year * 12) > self.range_end {
                break;
            }
            // Feb 29 only materializes in leap years.
            let Some(occurs_on) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            let occurs_at = occurs_on.and_time(time_of_day).and_utc();
            if let Step::Done = self.admit(occurs_at) {
                break;
            }
        }
    }
}

fn sorted_days(days: &[u8]) -> Vec<u8> {
    let mut days = days.to_vec();
    days.sort_unstable();
    days.dedup();
    days
}

/// Clone the base into a materialized occurrence. The base occurrence keeps
/// the base id and rule; every later one points back through
/// `recurrence_id` and drops the rule so it cannot be expanded again.
fn occurrence(base: &CalendarEvent, occurs_at: DateTime<Utc>, is_base: bool) -> CalendarEvent {
    let mut instance = base.clone();
    instance.scheduled_for = occurs_at;
    if !is_base {
        instance.recurrence_id = Some(base.id.clone());
        instance.recurrence_rule = None;
    }
    instance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::calendar_event::build_calendar_event_from_payload;
    use crate::payload::parse_timestamp;
    use serde_json::json;

    fn at(raw: &str) -> DateTime<Utc> {
        parse_timestamp(raw).expect("Should parse timestamp")
    }

    fn base_event(scheduled_for: &str, rule: serde_json::Value) -> CalendarEvent {
        let payload = json!({
            "summary": "Recurring visit",
            "scheduledFor": scheduled_for,
            "recurrenceRule": rule
        });
        build_calendar_event_from_payload(
            "evt-base",
            payload.as_object().expect("Should be a JSON object"),
            at("2023-12-01T00:00:00Z"),
            None,
        )
    }

    fn starts(occurrences: &[CalendarEvent]) -> Vec<String> {
        occurrences
            .iter()
            .map(|occurrence| occurrence.scheduled_for.to_rfc3339())
            .collect()
    }

    #[test]
    fn test_count_is_consumed_from_the_rule_origin() {
        // Two total occurrences, both before the window: nothing comes back.
        let base = base_event(
            "2024-01-01T10:00:00Z",
            json!({ "frequency": "daily", "interval": 1, "count": 2 }),
        );

        let occurrences = expand_occurrences(
            &base,
            at("2024-01-10T00:00:00Z"),
            at("2024-01-20T00:00:00Z"),
        )
        .expect("Should expand");

        assert!(occurrences.is_empty());
    }

    #[test]
    fn test_weekly_by_week_day() {
        // 2024-01-01 is a Monday; days 1 and 3 are Monday and Wednesday.
        let base = base_event(
            "2024-01-01T10:00:00Z",
            json!({ "frequency": "weekly", "interval": 1, "byWeekDay": [1, 3] }),
        );

        let occurrences = expand_occurrences(
            &base,
            at("2024-01-01T00:00:00Z"),
            at("2024-01-10T23:59:59Z"),
        )
        .expect("Should expand");

        assert_eq!(
            starts(&occurrences),
            vec![
                "2024-01-01T10:00:00+00:00",
                "2024-01-03T10:00:00+00:00",
                "2024-01-08T10:00:00+00:00",
                "2024-01-10T10:00:00+00:00",
            ]
        );

        // The base occurrence keeps its identity and rule; the rest point
        // back at it and cannot be re-expanded.
        assert_eq!(occurrences[0].id, "evt-base");
        assert_eq!(occurrences[0].recurrence_id, None);
        assert!(occurrences[0].recurrence_rule.is_some());
        for instance in &occurrences[1..] {
            assert_eq!(instance.id, "evt-base");
            assert_eq!(instance.recurrence_id.as_deref(), Some("evt-base"));
            assert_eq!(instance.recurrence_rule, None);
        }
    }

    #[test]
    fn test_monthly_by_month_day_skips_missing_days() {
        let base = base_event(
            "2024-01-15T09:00:00Z",
            json!({ "frequency": "monthly", "interval": 1, "byMonthDay": [15, 30] }),
        );

        let occurrences = expand_occurrences(
            &base,
            at("2024-01-01T00:00:00Z"),
            at("2024-03-31T23:59:59Z"),
        )
        .expect("Should expand");

        // February 30 does not exist and is skipped outright.
        assert_eq!(
            starts(&occurrences),
            vec![
                "2024-01-15T09:00:00+00:00",
                "2024-01-30T09:00:00+00:00",
                "2024-02-15T09:00:00+00:00",
                "2024-03-15T09:00:00+00:00",
                "2024-03-30T09:00:00+00:00",
            ]
        );
    }

    #[test]
    fn test_skipped_days_do_not_consume_count() {
        // February and April have no 31st and must not consume the count:
        // the third occurrence lands in May, not March.
        let base = base_event(
            "2024-01-31T08:00:00Z",
            json!({ "frequency": "monthly", "interval": 1, "byMonthDay": [31], "count": 3 }),
        );

        let occurrences = expand_occurrences(
            &base,
            at("2024-01-01T00:00:00Z"),
            at("2024-12-31T23:59:59Z"),
        )
        .expect("Should expand");

        assert_eq!(
            starts(&occurrences),
            vec![
                "2024-01-31T08:00:00+00:00",
                "2024-03-31T08:00:00+00:00",
                "2024-05-31T08:00:00+00:00",
            ]
        );
    }

    #[test]
    fn test_yearly_until_is_inclusive() {
        let base = base_event(
            "2024-01-01T00:00:00Z",
            json!({ "frequency": "yearly", "interval": 1, "until": "2026-01-01T00:00:00Z" }),
        );

        let occurrences = expand_occurrences(
            &base,
            at("2024-01-01T00:00:00Z"),
            at("2027-01-01T00:00:00Z"),
        )
        .expect("Should expand");

        assert_eq!(
            starts(&occurrences),
            vec![
                "2024-01-01T00:00:00+00:00",
                "2025-01-01T00:00:00+00:00",
                "2026-01-01T00:00:00+00:00",
            ]
        );
    }

    #[test]
    fn test_weekly_without_day_list_steps_by_interval() {
        let base = base_event(
            "2024-01-02T10:00:00Z",
            json!({ "frequency": "weekly", "interval": 2 }),
        );

        let occurrences = expand_occurrences(
            &base,
            at("2024-01-01T00:00:00Z"),
            at("2024-02-01T00:00:00Z"),
        )
        .expect("Should expand");

        assert_eq!(
            starts(&occurrences),
            vec![
                "2024-01-02T10:00:00+00:00",
                "2024-01-16T10:00:00+00:00",
                "2024-01-30T10:00:00+00:00",
            ]
        );
    }

    #[test]
    fn test_event_without_rule_expands_to_nothing() {
        let payload = json!({ "summary": "One-off", "scheduledFor": "2024-01-05T10:00:00Z" });
        let event = build_calendar_event_from_payload(
            "evt-1",
            payload.as_object().expect("Should be a JSON object"),
            at("2024-01-01T00:00:00Z"),
            None,
        );

        let occurrences = expand_occurrences(
            &event,
            at("2024-01-01T00:00:00Z"),
            at("2024-01-31T00:00:00Z"),
        )
        .expect("Should expand");

        assert!(occurrences.is_empty());
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let base = base_event(
            "2024-01-01T10:00:00Z",
            json!({ "frequency": "daily", "interval": 1 }),
        );

        let result = expand_occurrences(
            &base,
            at("2024-02-01T00:00:00Z"),
            at("2024-01-01T00:00:00Z"),
        );

        assert!(matches!(result, Err(OrbitError::InvalidRange(_))));
    }

    #[test]
    fn test_occurrences_come_back_ascending() {
        let base = base_event(
            "2024-01-10T10:00:00Z",
            json!({ "frequency": "monthly", "interval": 1, "byMonthDay": [5, 20] }),
        );

        let occurrences = expand_occurrences(
            &base,
            at("2024-01-01T00:00:00Z"),
            at("2024-03-31T00:00:00Z"),
        )
        .expect("Should expand");

        // January 5 predates the base instant and is not an occurrence.
        assert_eq!(
            starts(&occurrences),
            vec![
                "2024-01-20T10:00:00+00:00",
                "2024-02-05T10:00:00+00:00",
                "2024-02-20T10:00:00+00:00",
                "2024-03-05T10:00:00+00:00",
                "2024-03-20T10:00:00+00:00",
            ]
        );
        let mut sorted = occurrences.clone();
        sorted.sort_by_key(|occurrence| occurrence.scheduled_for);
        assert_eq!(starts(&sorted), starts(&occurrences));
    }
}
