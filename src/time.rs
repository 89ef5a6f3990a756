//! Clock-time conversions between minutes since midnight and display strings.

use chrono::{DateTime, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: u32 = 24 * 60;
const LAST_MINUTE: u32 = MINUTES_PER_DAY - 1;

static TWELVE_HOUR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0?[1-9]|1[0-2]):([0-5][0-9])\s*([AaPp][Mm])$").expect("valid 12h pattern")
});
static TWENTY_FOUR_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]?[0-9]|2[0-3]):([0-5][0-9])$").expect("valid 24h pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClockStyle {
    #[default]
    #[serde(rename = "12h")]
    Hour12, // "9:30 AM"
    #[serde(rename = "24h")]
    Hour24, // "09:30"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("invalid time format (use H:MM AM/PM or HH:MM): {0}")]
    InvalidFormat(String),
}

impl std::str::FromStr for ClockStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "12h" | "12" => Ok(ClockStyle::Hour12),
            "24h" | "24" => Ok(ClockStyle::Hour24),
            other => Err(format!("unknown clock style `{other}`; expected 12h or 24h")),
        }
    }
}

/// Parse manually entered text such as "9:30 AM", "1:30pm" or "13:30".
pub fn parse_display_time(text: &str) -> Result<u32, TimeParseError> {
    let input = text.trim();
    if let Some(caps) = TWELVE_HOUR.captures(input) {
        let hour = caps[1].parse::<u32>().unwrap_or_default();
        let minute = caps[2].parse::<u32>().unwrap_or_default();
        let meridiem = if caps[3].eq_ignore_ascii_case("pm") {
            Meridiem::Pm
        } else {
            Meridiem::Am
        };
        return Ok(to_minutes(hour, minute, Some(meridiem)));
    }
    if let Some(caps) = TWENTY_FOUR_HOUR.captures(input) {
        let hour = caps[1].parse::<u32>().unwrap_or_default();
        let minute = caps[2].parse::<u32>().unwrap_or_default();
        return Ok(to_minutes(hour, minute, None));
    }
    Err(TimeParseError::InvalidFormat(input.to_string()))
}

/// Normalize an hour/minute pair to minutes since midnight.
///
/// With a meridiem the hour is read on a 12-hour clock (12 AM is midnight,
/// 12 PM is noon); without one it is taken as-is. The result never leaves
/// `0..=1439`.
pub fn to_minutes(hour: u32, minute: u32, meridiem: Option<Meridiem>) -> u32 {
    let hour_24 = match meridiem {
        Some(Meridiem::Am) if hour == 12 => 0,
        Some(Meridiem::Pm) if hour < 12 => hour + 12,
        _ => hour,
    };
    (hour_24 * 60 + minute).min(LAST_MINUTE)
}

pub fn format_display(minutes: i64, style: ClockStyle) -> String {
    let clamped = minutes.clamp(0, LAST_MINUTE as i64) as u32;
    let hour = clamped / 60;
    let minute = clamped % 60;
    match style {
        ClockStyle::Hour12 => {
            let period = if hour >= 12 { "PM" } else { "AM" };
            let display_hour = match hour % 12 {
                0 => 12,
                h => h,
            };
            format!("{}:{:02} {}", display_hour, minute, period)
        }
        ClockStyle::Hour24 => format!("{:02}:{:02}", hour, minute),
    }
}

/// Read a stored start time: either a display string or a date-time.
///
/// Date-times keep the wall-clock time they were written with; no timezone
/// conversion happens here.
pub fn minutes_from_stored(text: &str) -> Option<u32> {
    let raw = text.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(minutes) = parse_display_time(raw) {
        return Some(minutes);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(to_minutes(dt.hour(), dt.minute(), None));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| to_minutes(dt.hour(), dt.minute(), None))
}

pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    match (hours, mins) {
        (0, m) => format!("{} min", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("13:30", 810)]
    #[case("1:30 pm", 810)]
    #[case("1:30PM", 810)]
    #[case("9:30 AM", 570)]
    #[case("09:30", 570)]
    #[case("12:00 AM", 0)]
    #[case("12:15 PM", 735)]
    #[case("0:00", 0)]
    #[case("23:59", 1439)]
    #[case("  7:05 am ", 425)]
    fn parses_both_clock_styles(#[case] input: &str, #[case] expected: u32) {
        assert_eq!(parse_display_time(input), Ok(expected));
    }

    #[rstest]
    #[case("0:30 AM")]
    #[case("13:00 PM")]
    #[case("24:00")]
    #[case("9:60")]
    #[case("9")]
    #[case("9:5")]
    #[case("noon")]
    #[case("")]
    fn rejects_malformed_entry(#[case] input: &str) {
        assert!(matches!(
            parse_display_time(input),
            Err(TimeParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn twelve_hour_normalization() {
        assert_eq!(to_minutes(12, 0, Some(Meridiem::Am)), 0);
        assert_eq!(to_minutes(12, 0, Some(Meridiem::Pm)), 720);
        assert_eq!(to_minutes(3, 45, Some(Meridiem::Pm)), 945);
        assert_eq!(to_minutes(3, 45, Some(Meridiem::Am)), 225);
        assert_eq!(to_minutes(15, 45, None), 945);
        assert_eq!(to_minutes(30, 0, None), 1439);
    }

    #[test]
    fn formats_and_clamps() {
        assert_eq!(format_display(570, ClockStyle::Hour12), "9:30 AM");
        assert_eq!(format_display(0, ClockStyle::Hour12), "12:00 AM");
        assert_eq!(format_display(720, ClockStyle::Hour12), "12:00 PM");
        assert_eq!(format_display(785, ClockStyle::Hour24), "13:05");
        assert_eq!(format_display(-15, ClockStyle::Hour24), "00:00");
        assert_eq!(format_display(5000, ClockStyle::Hour12), "11:59 PM");
    }

    #[test]
    fn every_minute_survives_display_round_trip() {
        for style in [ClockStyle::Hour12, ClockStyle::Hour24] {
            for m in 0..MINUTES_PER_DAY {
                let text = format_display(m as i64, style);
                assert_eq!(parse_display_time(&text), Ok(m), "{text}");
            }
        }
    }

    #[test]
    fn stored_start_times_normalize() {
        assert_eq!(minutes_from_stored("09:15"), Some(555));
        assert_eq!(minutes_from_stored("2:00 PM"), Some(840));
        assert_eq!(minutes_from_stored("2023-01-01T09:30:00.000Z"), Some(570));
        assert_eq!(minutes_from_stored("2023-01-01T18:45:00+02:00"), Some(1125));
        assert_eq!(minutes_from_stored("2023-01-01T06:10"), Some(370));
        assert_eq!(minutes_from_stored("someday"), None);
        assert_eq!(minutes_from_stored("   "), None);
    }

    #[test]
    fn clock_style_parses_from_cli_text() {
        assert_eq!("24h".parse::<ClockStyle>(), Ok(ClockStyle::Hour24));
        assert_eq!("12H".parse::<ClockStyle>(), Ok(ClockStyle::Hour12));
        assert!("36h".parse::<ClockStyle>().is_err());
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(format_duration(45), "45 min");
        assert_eq!(format_duration(120), "2h");
        assert_eq!(format_duration(95), "1h 35m");
    }
}
