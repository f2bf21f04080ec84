use crate::error::WeatherError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses ISO-8601 date or date-time text into a UTC-naive timestamp.
///
/// Accepts a bare date (midnight), date-times with `T` or space separator and
/// hour, minute, second or sub-second precision, and offset-carrying forms,
/// which are shifted to UTC.
pub fn parse_iso_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(dt) = input.parse::<DateTime<FixedOffset>>() {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f%:z") {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
    {
        return Some(dt);
    }
    if let Some(dt) = parse_hour_precision(input) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// `YYYY-MM-DDTHH` or `YYYY-MM-DD HH`. chrono refuses a format that stops at
/// `%H`, so the hour is split off by hand.
fn parse_hour_precision(input: &str) -> Option<NaiveDateTime> {
    let (date, hour) = input.split_once(|c: char| c == 'T' || c == ' ')?;
    if hour.len() != 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(hour.parse().ok()?, 0, 0)
}

/// A half-open observation window `[start, end)` in UTC.
///
/// `start <= end` is not enforced; an inverted period simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ObservationPeriod {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Parses both bounds, failing on the first one that is not ISO-8601.
    pub fn parse(start: &str, end: &str) -> Result<Self, WeatherError> {
        let parse = |input: &str| {
            parse_iso_datetime(input).ok_or_else(|| WeatherError::DateParse {
                input: input.to_string(),
            })
        };
        Ok(Self {
            start: parse(start)?,
            end: parse(end)?,
        })
    }

    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start <= time && time < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
