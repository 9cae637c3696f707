use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Calendar day of a UTC instant. Daily performance entries are keyed by this.
pub fn day_of(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Elapsed time from `since` to `now`. Negative if `since` lies in the future.
pub fn elapsed_since(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(since)
}

/// Whether `instant` falls inside `[start, end]`, with an open end when `end` is `None`.
pub fn within_window(instant: DateTime<Utc>, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
    start <= instant && end.map_or(true, |end| end >= instant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_of_truncates_to_utc_day() {
        let instant = Utc.with_ymd_and_hms(2026, 3, 14, 23, 59, 59).unwrap();
        assert_eq!(day_of(instant), NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
    }

    #[test]
    fn test_within_window_open_end() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        assert!(within_window(now, start, None));
        assert!(!within_window(now, start, Some(start)));
        assert!(within_window(start, start, Some(start)));
    }
}
