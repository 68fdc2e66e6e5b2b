use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

// `%.f` also matches when there is no fractional part.
const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f %:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an article date.
///
/// Accepts RFC 3339 timestamps, YAML-style timestamps with a space before the
/// offset, and naive datetimes and plain `YYYY-MM-DD` dates, which are taken to
/// be in UTC.
pub fn parse_article_date(date: &str) -> Option<DateTime<FixedOffset>> {
    let date = date.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(date) {
        return Some(datetime);
    }

    if let Some(datetime) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(date, format).ok())
    {
        return Some(datetime);
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(date, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)
        })?;

    Some(Utc.from_utc_datetime(&naive).into())
}

/// Formats an article date for display in the given timezone.
pub fn format_date(date: &str, format: &str, timezone: Tz) -> Option<String> {
    let date = parse_article_date(date)?.with_timezone(&timezone);

    Some(date.format(format).to_string())
}
