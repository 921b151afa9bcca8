use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::error::AttendanceError;

/// Normalize a client-supplied date to its UTC calendar day.
///
/// Accepts plain `YYYY-MM-DD`, RFC 3339 timestamps with any offset, and bare
/// `YYYY-MM-DDTHH:MM:SS[.fff]`. Timestamped inputs are converted to UTC
/// before the time-of-day is discarded, so same-instant submissions from
/// different local timezones land on the same stored date. Both read and
/// write paths go through here.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, AttendanceError> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }

    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts.date());
    }

    Err(AttendanceError::validation(format!("invalid date: {raw}")))
}

/// Half-open `[day, day + 1)` bounds for range queries, so values stored
/// with a time component still match.
pub fn day_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    (day, day.succ_opt().unwrap_or(NaiveDate::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_date_passes_through() {
        assert_eq!(
            normalize_date("2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn rfc3339_is_normalized_to_utc_day() {
        // 23:30 in UTC-5 is already March 2nd in UTC.
        assert_eq!(
            normalize_date("2024-03-01T23:30:00-05:00").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
        assert_eq!(
            normalize_date("2024-03-01T10:00:00+02:00").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn bare_datetime_drops_time_of_day() {
        assert_eq!(
            normalize_date("2024-03-01T08:15:00").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(
            normalize_date("2024-03-01T08:15:00.250").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(
            normalize_date("  2024-03-01 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn garbage_is_a_validation_error() {
        assert!(matches!(
            normalize_date("yesterday"),
            Err(AttendanceError::Validation(_))
        ));
        assert!(matches!(
            normalize_date("2024-13-40"),
            Err(AttendanceError::Validation(_))
        ));
    }

    #[test]
    fn day_bounds_are_half_open() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, end) = day_bounds(day);
        assert_eq!(start, day);
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
