//! Date parsing for the club's spreadsheet exports and weekly course dates.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::Serialize;
use thiserror::Error;

const DATE_FORMAT: &str = "%d.%m.%Y";
const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";
const ISO_FORMAT: &str = "%Y-%m-%d";

/// German weekday names as they appear in the `Wochentag` column.
const WEEKDAY_NAMES: [(&str, Weekday); 7] = [
    ("Montag", Weekday::Mon),
    ("Dienstag", Weekday::Tue),
    ("Mittwoch", Weekday::Wed),
    ("Donnerstag", Weekday::Thu),
    ("Freitag", Weekday::Fri),
    ("Samstag", Weekday::Sat),
    ("Sonntag", Weekday::Sun),
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unable to parse date: {0}")]
pub struct InvalidDate(pub String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown weekday: {0:?}")]
pub struct UnknownWeekday(pub String);

/// Parses `dd.mm.yyyy`, falling back to `dd.mm.yyyy HH:MM:SS`.
pub fn parse_date(value: &str) -> Result<NaiveDate, InvalidDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).map(|dt| dt.date()))
        .map_err(|_| InvalidDate(value.to_string()))
}

/// Parses an ISO `yyyy-mm-dd` date as used in URLs and query strings.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, InvalidDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_FORMAT).map_err(|_| InvalidDate(value.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

pub fn weekday_from_name(name: &str) -> Result<Weekday, UnknownWeekday> {
    let name = name.trim();
    WEEKDAY_NAMES
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, weekday)| *weekday)
        .ok_or_else(|| UnknownWeekday(name.to_string()))
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES
        .iter()
        .find(|(_, candidate)| *candidate == weekday)
        .map(|(name, _)| *name)
        .unwrap_or_default()
}

/// The course dates around a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurrences {
    pub previous: NaiveDate,
    pub current: NaiveDate,
    pub next: NaiveDate,
}

impl Occurrences {
    /// `current` is the first day on or after `reference` that falls on
    /// `weekday`; the others are one week either side of it.
    pub fn around(weekday: Weekday, reference: NaiveDate) -> Self {
        let offset = (i64::from(weekday.num_days_from_sunday())
            - i64::from(reference.weekday().num_days_from_sunday()))
        .rem_euclid(7);
        let current = reference + Duration::days(offset);
        Self {
            previous: current - Duration::days(7),
            current,
            next: current + Duration::days(7),
        }
    }

    pub fn for_course_day(weekday_name: &str, reference: NaiveDate) -> Result<Self, UnknownWeekday> {
        weekday_from_name(weekday_name).map(|weekday| Self::around(weekday, reference))
    }

    pub fn to_iso_strings(&self) -> [String; 3] {
        [
            format_date(self.previous),
            format_date(self.current),
            format_date(self.next),
        ]
    }
}
