//! Time utilities: wall-clock times, weekday arithmetic and "today" providers.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::Result;
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A time of day with minute resolution, serialized as `HH:MM`.
///
/// `24:00` is allowed as the end-of-day boundary so a block can close exactly at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self((hour * 60 + minute) as u16))
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes <= MINUTES_PER_DAY).then_some(Self(minutes as u16))
    }

    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = anyhow::Error;

    /// Parse a 24-hour `HH:MM` string.
    fn from_str(s: &str) -> Result<Self> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("invalid clock time '{s}': expected HH:MM"))?;
        let hour: u32 = h
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid hour in '{s}': {e}"))?;
        let minute: u32 = m
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid minute in '{s}': {e}"))?;

        if hour == 24 && minute == 0 {
            return Ok(Self(MINUTES_PER_DAY as u16));
        }
        Self::from_hm(hour, minute).ok_or_else(|| anyhow::anyhow!("clock time out of range: {s}"))
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

static MERIDIEM_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?::(\d{2}))?(am|pm)?$").expect("Invalid meridiem time pattern")
});

/// Parse "3pm", "3:30 pm", "9am" or "15:00" into a 24-hour clock time.
///
/// 12am is midnight and 12pm is noon. Returns `None` for anything that does not land on a
/// real time of day (e.g. "13pm", "9:75").
pub fn parse_meridiem_time(raw: &str) -> Option<ClockTime> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let caps = MERIDIEM_TIME.captures(&compact)?;

    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;

    match caps.get(3).map(|m| m.as_str()) {
        Some("pm") if hour != 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    ClockTime::from_hm(hour, minute)
}

/// Map a full or three-letter English weekday name, any case.
pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.to_lowercase().as_str() {
        "sunday" | "sun" => Some(Weekday::Sun),
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        _ => None,
    }
}

/// Days from `today` until the next `target`, always in `1..=7`.
pub fn days_until_weekday(today: NaiveDate, target: Weekday) -> u64 {
    let from = today.weekday().num_days_from_sunday();
    let to = target.num_days_from_sunday();
    match (to + 7 - from) % 7 {
        0 => 7,
        d => u64::from(d),
    }
}

/// Next occurrence of `target` strictly after `today` (a same-day match rolls a full week).
pub fn next_weekday(today: NaiveDate, target: Weekday) -> Option<NaiveDate> {
    today.checked_add_days(Days::new(days_until_weekday(today, target)))
}

/// Calendar date of `now` in an IANA timezone like "America/Chicago".
pub fn today_in_tz(now: DateTime<Utc>, tz: &str) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(now.with_timezone(&tz).date_naive())
}

/// Source of the current calendar date for relative phrases ("today", "next friday").
pub trait DateProvider {
    fn today(&self) -> NaiveDate;
}

/// Pinned date; what tests use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDate(pub NaiveDate);

impl DateProvider for FixedDate {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Wall clock read in a configured timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemDate {
    tz: Tz,
}

impl SystemDate {
    pub fn new(tz: &str) -> Result<Self> {
        let tz: Tz = tz
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
        Ok(Self { tz })
    }
}

impl DateProvider for SystemDate {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_meridiem_noon_and_midnight() {
        assert_eq!(parse_meridiem_time("12am").unwrap().to_string(), "00:00");
        assert_eq!(parse_meridiem_time("12pm").unwrap().to_string(), "12:00");
        assert_eq!(parse_meridiem_time("12:30am").unwrap().to_string(), "00:30");
    }

    #[test]
    fn test_meridiem_variants() {
        assert_eq!(parse_meridiem_time("3pm").unwrap().to_string(), "15:00");
        assert_eq!(parse_meridiem_time("9:30 AM").unwrap().to_string(), "09:30");
        assert_eq!(parse_meridiem_time("15:00").unwrap().to_string(), "15:00");
        assert_eq!(parse_meridiem_time("7").unwrap().to_string(), "07:00");
    }

    #[test]
    fn test_meridiem_rejects_impossible_times() {
        assert!(parse_meridiem_time("13pm").is_none());
        assert!(parse_meridiem_time("25").is_none());
        assert!(parse_meridiem_time("9:75am").is_none());
        assert!(parse_meridiem_time("noon").is_none());
    }

    #[test]
    fn test_clock_time_round_trips_through_json() {
        let t: ClockTime = "18:05".parse().unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"18:05\"");
        let back: ClockTime = serde_json::from_str("\"18:05\"").unwrap();
        assert_eq!(back, t);
        assert!("18".parse::<ClockTime>().is_err());
        assert_eq!("24:00".parse::<ClockTime>().unwrap().minutes(), MINUTES_PER_DAY);
    }

    #[test]
    fn test_next_weekday_same_day_rolls_a_week() {
        // 2026-03-02 is a Monday.
        let monday = date(2026, 3, 2);
        assert_eq!(next_weekday(monday, Weekday::Mon), Some(date(2026, 3, 9)));
        assert_eq!(next_weekday(monday, Weekday::Tue), Some(date(2026, 3, 3)));
        assert_eq!(next_weekday(monday, Weekday::Sun), Some(date(2026, 3, 8)));
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(weekday_from_name("FRIDAY"), Some(Weekday::Fri));
        assert_eq!(weekday_from_name("thu"), Some(Weekday::Thu));
        assert_eq!(weekday_from_name("thurs"), None);
    }

    #[test]
    fn test_today_in_chicago_lags_utc_after_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 2, 21, 3, 0, 0).unwrap();
        assert_eq!(today_in_tz(now, "America/Chicago").unwrap(), date(2026, 2, 20));
        assert_eq!(today_in_tz(now, "UTC").unwrap(), date(2026, 2, 21));
        assert!(today_in_tz(now, "Mars/Olympus").is_err());
    }

    #[test]
    fn test_fixed_date_provider() {
        let p = FixedDate(date(2026, 1, 1));
        assert_eq!(p.today(), date(2026, 1, 1));
        assert!(SystemDate::new("Europe/Berlin").is_ok());
    }
}
