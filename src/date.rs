//! Partial dates and the travel-date normalizer
//!
//! Users rarely type a full date. "12 aug" says nothing about the year and
//! "september 2022" says nothing about the day. The normalizer parses what it
//! can, uses a reference day only to check that the result is a real calendar
//! date, and then keeps nothing but the components the user actually wrote.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use flyme::date::{is_ambiguous, normalize};
//!
//! let today = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
//!
//! let date = normalize("12 aug 2022", today).unwrap();
//! assert_eq!(date.to_string(), "2022-08-12");
//! assert!(!is_ambiguous(&date));
//!
//! let date = normalize("september 2022", today).unwrap();
//! assert_eq!(date.to_string(), "2022-09-XX");
//! assert!(is_ambiguous(&date));
//! ```

use crate::error::{DateError, DateResult};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, trace};

const MONTHS: [(&str, u32); 24] = [
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

const FILLER_WORDS: &[&str] = &[
    "the", "of", "on", "in", "from", "to", "until", "till", "by", "at", "and", "for", "a",
    "monday", "mon", "tuesday", "tue", "tues", "wednesday", "wed", "thursday", "thu", "thurs",
    "friday", "fri", "saturday", "sat", "sunday", "sun",
];

/// A calendar date whose year, month or day may be unknown
///
/// Canonical form is `YYYY-MM-DD` with `XXXX`/`XX` standing in for the
/// unknown components, e.g. `XXXX-08-12` or `2022-09-XX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialDate {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

impl PartialDate {
    /// Build a partial date from its components
    ///
    /// Fails if a known month or day is out of range, or if all three are
    /// known and do not form a real date.
    pub fn new(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> DateResult<Self> {
        let date = Self { year, month, day };
        if !(0..=9999).contains(&year.unwrap_or(0))
            || !(1..=12).contains(&month.unwrap_or(1))
            || !(1..=31).contains(&day.unwrap_or(1))
        {
            return Err(DateError::OutOfRange(date.to_string()));
        }
        if let (Some(y), Some(m), Some(d)) = (year, month, day) {
            if NaiveDate::from_ymd_opt(y, m, d).is_none() {
                return Err(DateError::OutOfRange(date.to_string()));
            }
        }
        Ok(date)
    }

    /// Year, if stated
    pub fn year(&self) -> Option<i32> {
        self.year
    }

    /// Month (1-12), if stated
    pub fn month(&self) -> Option<u32> {
        self.month
    }

    /// Day of month, if stated
    pub fn day(&self) -> Option<u32> {
        self.day
    }

    /// True when no component is unknown
    pub fn is_definite(&self) -> bool {
        self.year.is_some() && self.month.is_some() && self.day.is_some()
    }

    /// The concrete date, only for definite dates
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        match (self.year, self.month, self.day) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d),
            _ => None,
        }
    }
}

impl From<NaiveDate> for PartialDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: Some(date.year()),
            month: Some(date.month()),
            day: Some(date.day()),
        }
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(y) => write!(f, "{:04}", y)?,
            None => f.write_str("XXXX")?,
        }
        match self.month {
            Some(m) => write!(f, "-{:02}", m)?,
            None => f.write_str("-XX")?,
        }
        match self.day {
            Some(d) => write!(f, "-{:02}", d),
            None => f.write_str("-XX"),
        }
    }
}

impl FromStr for PartialDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DateError::InvalidFormat(s.to_string());
        let parts: Vec<&str> = s.trim().split('-').collect();
        let [year, month, day] = parts.as_slice() else {
            return Err(invalid());
        };

        fn component<T: FromStr>(part: &str, width: usize) -> Option<Option<T>> {
            if part.len() != width {
                return None;
            }
            if part.chars().all(|c| c == 'X' || c == 'x') {
                return Some(None);
            }
            if !part.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            part.parse().ok().map(Some)
        }

        let year = component::<i32>(year, 4).ok_or_else(invalid)?;
        let month = component::<u32>(month, 2).ok_or_else(invalid)?;
        let day = component::<u32>(day, 2).ok_or_else(invalid)?;
        Self::new(year, month, day)
    }
}

impl Serialize for PartialDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PartialDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// True iff at least one component of the date is unknown
pub fn is_ambiguous(date: &PartialDate) -> bool {
    !date.is_definite()
}

/// Normalize free-text date into a [`PartialDate`]
///
/// `today` fills omitted components while checking the date is valid; the
/// filled values never reach the output.
pub fn normalize(text: &str, today: NaiveDate) -> DateResult<PartialDate> {
    let parts = parse_components(text)?;

    if !parts.fits_calendar(today) {
        return Err(DateError::OutOfRange(text.to_string()));
    }

    debug!(
        input = %text,
        parser_guess = %parts.resolve(today),
        year_stated = parts.year.is_some(),
        month_stated = parts.month.is_some(),
        day_stated = parts.day.is_some(),
        "Normalized date"
    );

    PartialDate::new(parts.year, parts.month, parts.day)
}

/// Components literally present in a date string
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct DateParts {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

impl DateParts {
    fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none()
    }

    fn set_year(&mut self, year: i32, input: &str) -> DateResult<()> {
        if self.year.replace(year).is_some() {
            return Err(DateError::Conflict(input.to_string()));
        }
        Ok(())
    }

    fn set_month(&mut self, month: u32, input: &str) -> DateResult<()> {
        if !(1..=12).contains(&month) || self.month.replace(month).is_some() {
            return Err(DateError::Conflict(input.to_string()));
        }
        Ok(())
    }

    fn set_day(&mut self, day: u32, input: &str) -> DateResult<()> {
        if !(1..=31).contains(&day) || self.day.replace(day).is_some() {
            return Err(DateError::Conflict(input.to_string()));
        }
        Ok(())
    }

    /// Feb 29 without a year is accepted: some year has it.
    fn fits_calendar(&self, today: NaiveDate) -> bool {
        match (self.month, self.day) {
            (Some(m), Some(d)) => match self.year {
                Some(y) => NaiveDate::from_ymd_opt(y, m, d).is_some(),
                None => {
                    NaiveDate::from_ymd_opt(today.year(), m, d).is_some()
                        || NaiveDate::from_ymd_opt(2000, m, d).is_some()
                }
            },
            _ => true,
        }
    }

    /// Full date with the reference day standing in for missing components.
    ///
    /// The reference day is clamped to the end of the month.
    fn resolve(&self, today: NaiveDate) -> NaiveDate {
        let year = self.year.unwrap_or(today.year());
        let month = self.month.unwrap_or(today.month());
        let day = self.day.unwrap_or(today.day());
        (1..=day)
            .rev()
            .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
            .unwrap_or(today)
    }
}

fn numeric_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,4})[/.\-](\d{1,2})(?:[/.\-](\d{2,4}))?\b")
            .expect("numeric date pattern is valid")
    })
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<num>\d+)(?P<ord>st|nd|rd|th)?|(?P<word>[a-z]+)")
            .expect("date token pattern is valid")
    })
}

fn month_number(word: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, number)| *number)
}

fn two_digit_year(value: u32) -> i32 {
    2000 + value as i32
}

fn parse_components(text: &str) -> DateResult<DateParts> {
    let input = text.trim().to_lowercase();
    if input.is_empty() {
        return Err(DateError::Empty(text.to_string()));
    }

    let mut parts = DateParts::default();
    let mut rest = input.clone();

    if let Some(caps) = numeric_date_regex().captures(&input) {
        let first = &caps[1];
        let second: u32 = caps[2]
            .parse()
            .map_err(|_| DateError::Conflict(text.to_string()))?;
        let third = caps.get(3).map(|m| m.as_str());

        if first.len() == 4 {
            // 2022-08-12, 2022/08
            let year: i32 = first
                .parse()
                .map_err(|_| DateError::Conflict(text.to_string()))?;
            parts.set_year(year, text)?;
            parts.set_month(second, text)?;
            if let Some(day) = third {
                if day.len() > 2 {
                    return Err(DateError::Conflict(text.to_string()));
                }
                let day = day
                    .parse()
                    .map_err(|_| DateError::Conflict(text.to_string()))?;
                parts.set_day(day, text)?;
            }
        } else if first.len() <= 2 {
            // Month first, unless the first number cannot be a month.
            let first: u32 = first
                .parse()
                .map_err(|_| DateError::Conflict(text.to_string()))?;
            if first <= 12 {
                parts.set_month(first, text)?;
                parts.set_day(second, text)?;
            } else {
                parts.set_day(first, text)?;
                parts.set_month(second, text)?;
            }
            if let Some(year) = third {
                let value: u32 = year
                    .parse()
                    .map_err(|_| DateError::Conflict(text.to_string()))?;
                match year.len() {
                    2 => parts.set_year(two_digit_year(value), text)?,
                    4 => parts.set_year(value as i32, text)?,
                    _ => return Err(DateError::Conflict(text.to_string())),
                }
            }
        } else {
            return Err(DateError::Conflict(text.to_string()));
        }

        trace!(input = %text, matched = %&caps[0], "Numeric date form");
        rest = input.replacen(&caps[0], " ", 1);
    }

    for caps in token_regex().captures_iter(&rest) {
        if let Some(word) = caps.name("word") {
            let word = word.as_str();
            if let Some(month) = month_number(word) {
                parts.set_month(month, text)?;
            } else if !FILLER_WORDS.contains(&word) {
                return Err(DateError::UnknownToken {
                    input: text.to_string(),
                    token: word.to_string(),
                });
            }
            continue;
        }

        let digits = caps.name("num").map(|m| m.as_str()).unwrap_or_default();
        let value: u32 = digits
            .parse()
            .map_err(|_| DateError::Conflict(text.to_string()))?;

        if caps.name("ord").is_some() {
            parts.set_day(value, text)?;
            continue;
        }

        match digits.len() {
            4 => parts.set_year(value as i32, text)?,
            1 | 2 if parts.day.is_none() && (1..=31).contains(&value) => {
                parts.set_day(value, text)?
            }
            // A zero can be neither a day nor a year.
            1 | 2 if parts.year.is_none() && value > 0 => {
                parts.set_year(two_digit_year(value), text)?
            }
            _ => return Err(DateError::Conflict(text.to_string())),
        }
    }

    if parts.is_empty() {
        return Err(DateError::Empty(text.to_string()));
    }

    Ok(parts)
}
