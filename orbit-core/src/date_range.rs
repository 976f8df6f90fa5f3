//! Query windows for occurrence listings.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::{OrbitError, OrbitResult};
use crate::payload::parse_timestamp;

/// Days on either side of now covered when no explicit window is given.
pub const DEFAULT_WINDOW_DAYS: i64 = 90;

/// An inclusive time window. `None` ends are unbounded and resolve to wide
/// fixed limits through [`DateRange::bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl Default for DateRange {
    fn default() -> Self {
        let now = Utc::now();
        DateRange {
            from: Some(now - Duration::days(DEFAULT_WINDOW_DAYS)),
            to: Some(now + Duration::days(DEFAULT_WINDOW_DAYS)),
        }
    }
}

impl DateRange {
    /// Build a window from optional CLI-style arguments.
    ///
    /// Accepts RFC 3339 instants or plain `YYYY-MM-DD` dates; a plain date
    /// covers the whole day on whichever end it appears. The literal
    /// `start` leaves the lower end unbounded. With no arguments at all the
    /// default window around now applies.
    pub fn from_args(from: Option<&str>, to: Option<&str>) -> OrbitResult<DateRange> {
        if from.is_none() && to.is_none() {
            return Ok(DateRange::default());
        }

        let from = match from {
            None => None,
            Some("start") => None,
            Some(raw) => Some(parse_instant(raw, NaiveTime::MIN)?),
        };
        let to = match to {
            None => None,
            Some(raw) => Some(parse_instant(raw, end_of_day())?),
        };

        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(OrbitError::InvalidRange(format!(
                    "window start {from} is after window end {to}"
                )));
            }
        }

        Ok(DateRange { from, to })
    }

    /// Concrete inclusive bounds, with unbounded ends pinned far out.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = self.from.unwrap_or_else(|| fixed_utc(1970, 1, 1));
        let to = self.to.unwrap_or_else(|| fixed_utc(2100, 1, 1));
        (from, to)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let (from, to) = self.bounds();
        at >= from && at <= to
    }
}

fn parse_instant(raw: &str, time_of_day: NaiveTime) -> OrbitResult<DateTime<Utc>> {
    if let Some(at) = parse_timestamp(raw) {
        return Ok(at);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        OrbitError::InvalidRange(format!(
            "Unrecognized date '{raw}', expected RFC 3339 or YYYY-MM-DD"
        ))
    })?;
    Ok(date.and_time(time_of_day).and_utc())
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).expect("End of day must be a valid time")
}

fn fixed_utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("Fixed bound must be a valid UTC instant")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_dates_cover_whole_days() {
        let range = DateRange::from_args(Some("2024-01-01"), Some("2024-01-10"))
            .expect("Should parse range");

        let from = range.from.expect("Should have a lower bound");
        let to = range.to.expect("Should have an upper bound");
        assert_eq!(from.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2024-01-10T23:59:59+00:00");

        assert!(range.contains(parse_timestamp("2024-01-10T10:00:00Z").unwrap()));
        assert!(!range.contains(parse_timestamp("2024-01-11T00:00:00Z").unwrap()));
    }

    #[test]
    fn test_rfc3339_instants_are_taken_verbatim() {
        let range = DateRange::from_args(Some("2024-01-01T08:30:00Z"), None)
            .expect("Should parse range");

        assert_eq!(
            range.from.expect("Should have a lower bound").to_rfc3339(),
            "2024-01-01T08:30:00+00:00"
        );
        assert_eq!(range.to, None);
    }

    #[test]
    fn test_start_keyword_unbounds_the_lower_end() {
        let range =
            DateRange::from_args(Some("start"), Some("2024-06-01")).expect("Should parse range");

        assert_eq!(range.from, None);
        let (from, _) = range.bounds();
        assert_eq!(from.to_rfc3339(), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let result = DateRange::from_args(Some("2024-02-01"), Some("2024-01-01"));
        assert!(matches!(result, Err(OrbitError::InvalidRange(_))));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result = DateRange::from_args(Some("next tuesday"), None);
        assert!(matches!(result, Err(OrbitError::InvalidRange(_))));
    }

    #[test]
    fn test_default_window_wraps_now() {
        let range = DateRange::from_args(None, None).expect("Should build default range");
        assert!(range.contains(Utc::now()));
    }
}
