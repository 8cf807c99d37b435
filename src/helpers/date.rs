//! Date helper functions

use chrono::{DateTime, Local, TimeZone};

/// "January 5, 2025"
pub fn long_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%B %-d, %Y").to_string()
}

/// "Jan 5, 2025"
pub fn short_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%b %-d, %Y").to_string()
}

/// "Jan 5"
pub fn month_day<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%b %-d").to_string()
}

/// ISO 8601, for `<time datetime>` and feeds
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.to_rfc3339()
}

/// Relative time against a fixed `now` (like "2 hours ago")
pub fn relative_to(date: &DateTime<Local>, now: &DateTime<Local>) -> String {
    let duration = now.signed_duration_since(*date);

    if duration.num_seconds() < 0 {
        return "in the future".to_string();
    }

    let minutes = duration.num_minutes();
    let hours = duration.num_hours();
    let days = duration.num_days();

    match (minutes, hours, days) {
        (0, _, _) => "a few seconds ago".to_string(),
        (1, _, _) => "a minute ago".to_string(),
        (m, 0, _) => format!("{} minutes ago", m),
        (_, 1, _) => "an hour ago".to_string(),
        (_, h, 0) => format!("{} hours ago", h),
        (_, _, 1) => "yesterday".to_string(),
        (_, _, d) if d < 30 => format!("{} days ago", d),
        (_, _, d) if d < 365 => match d / 30 {
            1 => "a month ago".to_string(),
            months => format!("{} months ago", months),
        },
        (_, _, d) => match d / 365 {
            1 => "a year ago".to_string(),
            years => format!("{} years ago", years),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_display_dates() {
        let date = Local.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();
        assert_eq!(long_date(&date), "January 5, 2025");
        assert_eq!(short_date(&date), "Jan 5, 2025");
        assert_eq!(month_day(&date), "Jan 5");
    }

    #[test]
    fn test_relative_to() {
        let now = Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(relative_to(&(now - Duration::seconds(10)), &now), "a few seconds ago");
        assert_eq!(relative_to(&(now - Duration::minutes(5)), &now), "5 minutes ago");
        assert_eq!(relative_to(&(now - Duration::hours(1)), &now), "an hour ago");
        assert_eq!(relative_to(&(now - Duration::days(1)), &now), "yesterday");
        assert_eq!(relative_to(&(now - Duration::days(12)), &now), "12 days ago");
        assert_eq!(relative_to(&(now - Duration::days(65)), &now), "2 months ago");
        assert_eq!(relative_to(&(now + Duration::days(1)), &now), "in the future");
    }
}
