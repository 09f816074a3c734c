use chrono::{DateTime, NaiveDate, Utc};

/// Parse a calendar date from either an ISO-8601 date (`2026-03-14`) or a
/// full RFC 3339 date-time. Time-of-day is discarded.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    raw.parse::<DateTime<Utc>>().ok().map(|dt| dt.date_naive())
}

/// The current UTC calendar date. Date-only comparisons all use UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
