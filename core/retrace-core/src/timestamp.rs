//! Timestamp parsing, formatting, and relative-age rendering.
//!
//! History entries store epoch seconds; older history files carried
//! human-formatted strings that the persistence layer reparses through
//! [`parse_legacy`] during migration. Display helpers render either an
//! absolute stamp (configured strftime format) or a relative age.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDateTime};

use crate::settings::{Settings, TimestampMode};
use crate::types::Entry;

/// Current default display format.
pub const DEFAULT_FORMAT: &str = "%Y-%m-%d @ %H:%M:%S";

/// Historical default, still accepted when migrating old history files.
pub const OLD_DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current time in epoch seconds.
pub fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Whether `format` is a well-formed strftime string.
pub fn is_valid_format(format: &str) -> bool {
    StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

/// Parses a legacy human-formatted timestamp into epoch seconds.
///
/// Tries the configured format first, then the two historical defaults.
pub fn parse_legacy(value: &str, configured_format: &str) -> Option<i64> {
    for format in [configured_format, DEFAULT_FORMAT, OLD_DEFAULT_FORMAT] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc().timestamp());
        }
    }
    tracing::debug!(
        timestamp = %value,
        "timestamp does not match the configured format or either default"
    );
    None
}

/// Formats epoch seconds with the given strftime format (UTC).
///
/// Returns `None` for out-of-range epochs. `format` must have passed
/// [`is_valid_format`]; settings loading guarantees that for the
/// configured format.
pub fn format_epoch(epoch: i64, format: &str) -> Option<String> {
    DateTime::from_timestamp(epoch, 0).map(|dt| dt.format(format).to_string())
}

/// Renders the relative age between two epoch timestamps.
///
/// `precision` limits how many adjacent magnitudes are shown, counted from
/// the largest non-zero one: `"2 weeks, 3 days ago"` at precision 2.
pub fn approximate_age(from: i64, to: i64, precision: usize) -> String {
    let mut rem = (to - from).max(0) as u64;
    let seconds = rem % 60;
    rem /= 60;
    let minutes = rem % 60;
    rem /= 60;
    let hours = rem % 24;
    let mut days = rem / 24;
    let years = days / 365;
    days %= 365;
    let months = days / 30;
    days %= 30;
    let weeks = days / 7;
    days %= 7;

    let magnitudes = [
        (years, "years"),
        (months, "months"),
        (weeks, "weeks"),
        (days, "days"),
        (hours, "hours"),
        (minutes, "minutes"),
        (seconds, "seconds"),
    ];

    let mut parts: Vec<String> = Vec::new();
    let mut first: Option<usize> = None;
    for (i, (value, unit)) in magnitudes.iter().enumerate() {
        if *value == 0 {
            continue;
        }
        match first {
            None => first = Some(i),
            Some(f) if f + precision <= i => break,
            Some(_) => {}
        }
        let unit = if *value == 1 {
            // strip plural s
            &unit[..unit.len() - 1]
        } else {
            *unit
        };
        parts.push(format!("{} {}", value, unit));
    }

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(", ")
    }
}

/// Renders the display stamp for a history entry, honoring the configured
/// timestamp mode and relative/absolute preference.
///
/// `bucket_label` is the access kind the entry came from ("opened" or
/// "closed"). In `file_modified` mode, or when the entry predates epoch
/// timestamps, the file's mtime is used with the label "modified".
/// Returns `None` when no usable timestamp exists.
pub fn entry_stamp(entry: &Entry, bucket_label: &str, settings: &Settings) -> Option<String> {
    let (action, stamp) =
        if settings.timestamp_mode == TimestampMode::HistoryAccess && entry.timestamp > 0 {
            (bucket_label, entry.timestamp)
        } else if let Some(mtime) = file_mtime(&entry.filename) {
            ("modified", mtime)
        } else {
            return None;
        };

    if settings.timestamp_relative {
        Some(format!(
            "{} {} ago",
            action,
            approximate_age(stamp, now_epoch(), 2)
        ))
    } else {
        format_epoch(stamp, &settings.timestamp_format)
            .map(|formatted| format!("{} at {}", action, formatted))
    }
}

fn file_mtime(path: &str) -> Option<i64> {
    std::fs::metadata(path)
        .ok()?
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_formats_are_valid() {
        assert!(is_valid_format(DEFAULT_FORMAT));
        assert!(is_valid_format(OLD_DEFAULT_FORMAT));
    }

    #[test]
    fn rejects_bad_format() {
        assert!(!is_valid_format("%Q-%Z!"));
    }

    #[test]
    fn parses_current_default_format() {
        let epoch = parse_legacy("2020-01-02 @ 03:04:05", DEFAULT_FORMAT).unwrap();
        assert_eq!(format_epoch(epoch, DEFAULT_FORMAT).unwrap(), "2020-01-02 @ 03:04:05");
    }

    #[test]
    fn falls_back_to_old_default_format() {
        // configured format will not match, the old default will
        let epoch = parse_legacy("2020-01-02 03:04:05", "%d/%m/%Y %H:%M").unwrap();
        assert_eq!(
            format_epoch(epoch, OLD_DEFAULT_FORMAT).unwrap(),
            "2020-01-02 03:04:05"
        );
    }

    #[test]
    fn unparseable_timestamp_is_none() {
        assert_eq!(parse_legacy("not a timestamp", DEFAULT_FORMAT), None);
    }

    #[test]
    fn age_renders_two_magnitudes() {
        let two_weeks_three_days = 14 * 86400 + 3 * 86400;
        assert_eq!(
            approximate_age(0, two_weeks_three_days, 2),
            "2 weeks, 3 days"
        );
    }

    #[test]
    fn age_strips_plural_for_one() {
        assert_eq!(approximate_age(0, 61, 2), "1 minute, 1 second");
    }

    #[test]
    fn age_skips_zero_magnitudes_within_window() {
        // one hour and one second: minutes are zero, precision window
        // is measured from hours so seconds fall outside it
        assert_eq!(approximate_age(0, 3601, 2), "1 hour");
    }

    #[test]
    fn age_of_zero_duration() {
        assert_eq!(approximate_age(5, 5, 2), "0 seconds");
    }

    #[test]
    fn age_clamps_negative_durations() {
        assert_eq!(approximate_age(10, 5, 2), "0 seconds");
    }

    #[test]
    fn stamp_uses_access_timestamp_in_history_mode() {
        let settings = Settings {
            timestamp_relative: false,
            ..Settings::default()
        };
        let entry = Entry::new("/does/not/exist", 0, 0, 1577934245);
        let stamp = entry_stamp(&entry, "closed", &settings).unwrap();
        assert_eq!(stamp, "closed at 2020-01-02 @ 03:04:05");
    }

    #[test]
    fn stamp_is_none_without_timestamp_or_file() {
        let settings = Settings::default();
        let entry = Entry::new("/does/not/exist", 0, 0, 0);
        assert_eq!(entry_stamp(&entry, "opened", &settings), None);
    }

    #[test]
    fn stamp_falls_back_to_mtime_in_file_modified_mode() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let settings = Settings {
            timestamp_mode: TimestampMode::FileModified,
            timestamp_relative: true,
            ..Settings::default()
        };
        let entry = Entry::new(temp.path().to_string_lossy(), 0, 0, 1577934245);
        let stamp = entry_stamp(&entry, "opened", &settings).unwrap();
        assert!(stamp.starts_with("modified"), "got: {stamp}");
        assert!(stamp.ends_with("ago"), "got: {stamp}");
    }
}
