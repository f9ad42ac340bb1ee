//! Display helpers for addresses, dates and form inputs

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

const DATETIME_LOCAL: &str = "%Y-%m-%dT%H:%M";
const DATETIME_LOCAL_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Invalid date and time: {0}")]
    InvalidDateTime(String),

    #[error("Date and time does not exist in the local time zone: {0}")]
    NonexistentLocalTime(String),

    #[error("Date and time is before the epoch: {0}")]
    BeforeEpoch(String),
}

/// Parameters for [`truncate`]
#[derive(Debug, Clone, Copy)]
pub struct TruncateParams<'a> {
    pub text: &'a str,
    pub start_chars: usize,
    pub end_chars: usize,
    pub max_length: usize,
}

/// Shorten `text` to its head and tail, padding the head with dots up to
/// `max_length`. Text within the limit is returned unchanged.
///
/// ```
/// use dappvotes_client::format::{truncate, TruncateParams};
///
/// let short = truncate(TruncateParams {
///     text: "0x5fbdb2315678afecb367f032d93f642f64180aa3",
///     start_chars: 4,
///     end_chars: 4,
///     max_length: 11,
/// });
/// assert_eq!(short, "0x5f...0aa3");
/// ```
pub fn truncate(params: TruncateParams<'_>) -> String {
    let chars: Vec<char> = params.text.chars().collect();
    if chars.len() <= params.max_length {
        return params.text.to_string();
    }

    let start_len = params.start_chars.min(chars.len());
    let end_len = params.end_chars.min(chars.len());

    let mut start: String = chars[..start_len].iter().collect();
    let end: String = chars[chars.len() - end_len..].iter().collect();

    let mut width = start_len + end_len;
    while width < params.max_length {
        start.push('.');
        width += 1;
    }

    start + &end
}

/// UTC calendar date such as `Sun, Jan 5, 2025`
pub fn format_date(timestamp_ms: u64) -> Option<String> {
    let millis = i64::try_from(timestamp_ms).ok()?;
    let date: DateTime<Utc> = DateTime::from_timestamp_millis(millis)?;
    Some(date.format("%a, %b %-d, %Y").to_string())
}

/// Local `YYYY-MM-DDTHH:MM`, the value format of a datetime-local input
pub fn format_timestamp(timestamp_ms: u64) -> Option<String> {
    let millis = i64::try_from(timestamp_ms).ok()?;
    let date = Local.timestamp_millis_opt(millis).single()?;
    Some(date.format(DATETIME_LOCAL).to_string())
}

/// Milliseconds since the epoch for a local `YYYY-MM-DDTHH:MM[:SS]` value
pub fn parse_datetime_local(value: &str) -> Result<u64, FormatError> {
    let trimmed = value.trim();
    let naive = NaiveDateTime::parse_from_str(trimmed, DATETIME_LOCAL)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, DATETIME_LOCAL_SECONDS))
        .map_err(|_| FormatError::InvalidDateTime(value.to_string()))?;

    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| FormatError::NonexistentLocalTime(value.to_string()))?;

    u64::try_from(local.timestamp_millis())
        .map_err(|_| FormatError::BeforeEpoch(value.to_string()))
}

/// Current wall clock in milliseconds
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_pads_with_dots() {
        let out = truncate(TruncateParams {
            text: "abcdefghijklmnopqrstuvwxyz",
            start_chars: 3,
            end_chars: 2,
            max_length: 10,
        });
        assert_eq!(out, "abc.....yz");
        assert_eq!(out.chars().count(), 10);
    }

    #[test]
    fn test_truncate_leaves_short_text() {
        let out = truncate(TruncateParams {
            text: "short",
            start_chars: 1,
            end_chars: 1,
            max_length: 5,
        });
        assert_eq!(out, "short");
    }

    #[test]
    fn test_truncate_without_room_for_dots() {
        let out = truncate(TruncateParams {
            text: "abcdefgh",
            start_chars: 4,
            end_chars: 3,
            max_length: 6,
        });
        assert_eq!(out, "abcdfgh");
    }

    #[test]
    fn test_format_date_is_utc() {
        // 2025-01-05T23:30:00Z
        assert_eq!(format_date(1_736_119_800_000).unwrap(), "Sun, Jan 5, 2025");
        assert_eq!(format_date(0).unwrap(), "Thu, Jan 1, 1970");
    }

    #[test]
    fn test_datetime_local_round_trip() {
        let ms = parse_datetime_local("2024-03-15T09:45").unwrap();
        assert_eq!(format_timestamp(ms).unwrap(), "2024-03-15T09:45");
        assert_eq!(parse_datetime_local("2024-03-15T09:45:00").unwrap(), ms);
    }

    #[test]
    fn test_parse_datetime_local_rejects_garbage() {
        assert!(matches!(
            parse_datetime_local("next tuesday"),
            Err(FormatError::InvalidDateTime(_))
        ));
        assert!(parse_datetime_local("").is_err());
    }
}
