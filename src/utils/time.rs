use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: i32 = 1440;

/// Minutes elapsed since 00:00 (seconds are dropped)
pub fn minutes_of_day(t: NaiveTime) -> i32 {
    (t.hour() * 60 + t.minute()) as i32
}

/// Parses a wall-clock time written as `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn format_clock(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Serde adapter keeping clock times as `"HH:MM"` on the wire.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_clock(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_clock(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid time `{raw}`, expected HH:MM")))
    }
}

pub mod hhmm_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_str(&super::format_clock(*t)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_clock(s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid time `{s}`, expected HH:MM"))),
        }
    }
}

/// Inclusive calendar range `[from, to]`. A range whose `to` precedes `from`
/// is empty rather than invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn is_empty(&self) -> bool {
        self.to < self.from
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        !self.is_empty() && day >= self.from && day <= self.to
    }
}

/// Date bounds where either side may be open.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DateBounds {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateBounds {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.is_none_or(|from| day >= from) && self.to.is_none_or(|to| day <= to)
    }
}

impl From<DateRange> for DateBounds {
    fn from(range: DateRange) -> Self {
        Self {
            from: Some(range.from),
            to: Some(range.to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_short_and_long_clock_formats() {
        assert_eq!(parse_clock("08:30"), Some(t(8, 30)));
        assert_eq!(parse_clock(" 23:05:59 "), NaiveTime::from_hms_opt(23, 5, 59));
        assert_eq!(parse_clock("25:00"), None);
        assert_eq!(parse_clock("nope"), None);
    }

    #[test]
    fn minutes_of_day_drops_seconds() {
        assert_eq!(minutes_of_day(t(0, 0)), 0);
        assert_eq!(minutes_of_day(t(23, 59)), 1439);
        assert_eq!(
            minutes_of_day(NaiveTime::from_hms_opt(7, 3, 45).unwrap()),
            423
        );
    }

    #[test]
    fn inverted_range_is_empty() {
        let a = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let range = DateRange::new(a, b);
        assert!(range.is_empty());
        assert!(!range.contains(a));
        assert!(DateRange::new(b, a).contains(a));
        assert!(DateRange::new(a, a).contains(a));
    }
}
