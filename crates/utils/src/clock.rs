//! Wall-clock helpers for agenda times submitted as `HH:MM` or `HH:MM:SS`.

use chrono::NaiveTime;

/// Parse a time-of-day string, accepting both `HH:MM` and `HH:MM:SS`.
///
/// Returns `None` for anything else (empty string, extra components,
/// out-of-range values).
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Format a time-of-day as the `HH:MM:SS` string the API responds with.
pub fn format_hms(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}
