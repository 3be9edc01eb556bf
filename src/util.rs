use crate::error::{PulseError, Result};
use crate::window::{API_DATETIME_FORMAT, Window};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Build a window from user-supplied bounds, rejecting `start > end`.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    format: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Window> {
    let start = start.map(|s| parse_user_date(s, format, now)).transpose()?;
    let end = end.map(|e| parse_user_date(e, format, now)).transpose()?;

    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(PulseError::InvalidDate(format!(
                "Invalid window: start ({s}) is after end ({e})"
            )));
        }
    }

    let mut window = Window::new();
    if let Some(s) = start {
        window = window.with_start(s);
    }
    if let Some(e) = end {
        window = window.with_end(e);
    }
    Ok(window)
}

/// With an explicit chrono `format`, only that format is accepted. Otherwise
/// the API format, RFC 3339, `YYYY-MM-DD` and "N days ago" style inputs are tried.
pub fn parse_user_date(
    input: &str,
    format: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Some(format) = format {
        return parse_with_format(input, format).ok_or_else(|| {
            PulseError::InvalidDate(format!("'{input}' does not match format '{format}'"))
        });
    }

    if let Some(dt) = parse_with_format(input, API_DATETIME_FORMAT) {
        return Ok(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Some(dt) = parse_with_format(input, "%Y-%m-%d") {
        return Ok(dt);
    }

    if let Some(seconds) = parse_natural_duration(input) {
        let overflow = || PulseError::InvalidDate(format!("'{input}' is too far in the past"));
        let ago = seconds
            .ok_or_else(overflow)
            .and_then(|secs| i64::try_from(secs).map_err(|_| overflow()))
            .and_then(|secs| chrono::Duration::try_seconds(secs).ok_or_else(overflow))?;
        return now.checked_sub_signed(ago).ok_or_else(overflow);
    }

    Err(PulseError::InvalidDate(format!(
        "'{input}' is not a date \
         (expected {API_DATETIME_FORMAT}, RFC 3339, YYYY-MM-DD or 'N days ago')"
    )))
}

fn parse_with_format(input: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    // Date-only formats
    NaiveDate::parse_from_str(input, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

const SECONDS_PER_DAY: u64 = 86_400;

/// "N days/weeks/months ago" as seconds. The outer `None` means the input is
/// not in that shape, the inner one that the count overflows.
fn parse_natural_duration(input: &str) -> Option<Option<u64>> {
    let input = input.trim().to_lowercase();

    [(" days ago", 1), (" weeks ago", 7), (" months ago", 30)]
        .into_iter()
        .find_map(|(suffix, days)| {
            let n = input.strip_suffix(suffix)?.trim().parse::<u64>().ok()?;
            Some(n.checked_mul(days * SECONDS_PER_DAY))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::parse_api_timestamp;

    fn now() -> DateTime<Utc> {
        parse_api_timestamp("2024-03-15T12:00:00Z").unwrap()
    }

    #[test]
    fn accepts_the_usual_date_shapes() {
        let expected = parse_api_timestamp("2024-01-02T00:00:00Z").unwrap();
        assert_eq!(parse_user_date("2024-01-02T00:00:00Z", None, now()).unwrap(), expected);
        assert_eq!(
            parse_user_date("2024-01-02T00:00:00+00:00", None, now()).unwrap(),
            expected
        );
        assert_eq!(parse_user_date("2024-01-02", None, now()).unwrap(), expected);
        assert_eq!(
            parse_user_date("2 weeks ago", None, now()).unwrap(),
            parse_api_timestamp("2024-03-01T12:00:00Z").unwrap()
        );
    }

    #[test]
    fn explicit_format_is_strict() {
        let parsed = parse_user_date("02.01.2024", Some("%d.%m.%Y"), now()).unwrap();
        assert_eq!(parsed, parse_api_timestamp("2024-01-02T00:00:00Z").unwrap());
        assert!(parse_user_date("2024-01-02", Some("%d.%m.%Y"), now()).is_err());
    }

    #[test]
    fn rejects_inverted_window() {
        assert!(resolve_window(Some("2024-02-01"), Some("2024-01-01"), None, now()).is_err());
        let window = resolve_window(Some("2024-01-01"), None, None, now()).unwrap();
        assert!(window.end.is_none());
        assert!(window.start.is_some());
    }

    #[test]
    fn huge_relative_dates_are_errors() {
        for input in [
            "300000000000000 days ago",
            "30000000000000 weeks ago",
            "18446744073709551615 months ago",
            "3000000000000 days ago",
        ] {
            let err = parse_user_date(input, None, now()).unwrap_err();
            assert!(err.to_string().contains("too far in the past"), "{input}: {err}");
        }
        assert_eq!(
            parse_user_date("3 months ago", None, now()).unwrap(),
            parse_api_timestamp("2023-12-16T12:00:00Z").unwrap()
        );
    }
}
