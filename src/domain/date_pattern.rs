//! Date patterns and date arithmetic for date entries
//!
//! Patterns use the familiar letter syntax (`yyyy/MM/dd HH:mm`) and are
//! translated once into a chrono format string.

use chrono::format::{Item, StrftimeItems};
use chrono::{
    DateTime, Days, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default pattern for date entries
pub const DEFAULT_DATE_PATTERN: &str = "yyyy/MM/dd HH:mm";

#[derive(Debug, Error, PartialEq)]
pub enum DatePatternError {
    #[error("Unsupported pattern letter '{0}' in date pattern '{1}'")]
    UnsupportedLetter(char, String),

    #[error("Unterminated quote in date pattern '{0}'")]
    UnterminatedQuote(String),

    #[error("Invalid date pattern '{0}'")]
    Invalid(String),
}

/// A compiled date pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    strftime: String,
}

impl Default for DatePattern {
    fn default() -> Self {
        Self {
            source: DEFAULT_DATE_PATTERN.to_string(),
            strftime: "%Y/%m/%d %H:%M".to_string(),
        }
    }
}

impl DatePattern {
    pub fn new(pattern: &str) -> Result<Self, DatePatternError> {
        let strftime = translate(pattern)?;

        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(DatePatternError::Invalid(pattern.to_string()));
        }

        Ok(Self {
            source: pattern.to_string(),
            strftime,
        })
    }

    /// Returns the pattern as given
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the translated chrono format string
    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    pub fn format(&self, value: &DateTime<Local>) -> String {
        value.format(&self.strftime).to_string()
    }

    /// Parses `text` as a local date-time
    ///
    /// Patterns without a time part parse at midnight; patterns without a
    /// date part parse on 1970-01-01.
    pub fn parse(&self, text: &str) -> Option<DateTime<Local>> {
        let naive = NaiveDateTime::parse_from_str(text, &self.strftime)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, &self.strftime)
                    .ok()
                    .map(|date| date.and_time(NaiveTime::MIN))
            })
            .or_else(|| {
                NaiveTime::parse_from_str(text, &self.strftime)
                    .ok()
                    .map(|time| NaiveDate::default().and_time(time))
            })?;

        Local.from_local_datetime(&naive).earliest()
    }
}

/// Translates pattern letters into chrono specifiers
fn translate(pattern: &str) -> Result<String, DatePatternError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            loop {
                match chars.get(i).copied() {
                    None => return Err(DatePatternError::UnterminatedQuote(pattern.to_string())),
                    Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                        out.push('\'');
                        i += 2;
                    }
                    Some('\'') => {
                        i += 1;
                        break;
                    }
                    Some(literal) => {
                        push_literal(&mut out, literal);
                        i += 1;
                    }
                }
            }
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&n| n == c).count();
        let spec = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('D', _) => "%j",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('S', _) => "%3f",
            ('a', _) => "%p",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('z', _) => "%Z",
            ('Z', _) => "%z",
            _ => {
                return Err(DatePatternError::UnsupportedLetter(
                    c,
                    pattern.to_string(),
                ))
            }
        };
        out.push_str(spec);
        i += run;
    }

    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Unit for date increments and decrements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl DateUnit {
    pub const ALL: [DateUnit; 8] = [
        DateUnit::Millisecond,
        DateUnit::Second,
        DateUnit::Minute,
        DateUnit::Hour,
        DateUnit::Day,
        DateUnit::Week,
        DateUnit::Month,
        DateUnit::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateUnit::Millisecond => "millisecond",
            DateUnit::Second => "second",
            DateUnit::Minute => "minute",
            DateUnit::Hour => "hour",
            DateUnit::Day => "day",
            DateUnit::Week => "week",
            DateUnit::Month => "month",
            DateUnit::Year => "year",
        }
    }

    /// Moves `value` by `amount` units; `None` on overflow
    ///
    /// Month and year steps clamp to the last day of a shorter month.
    pub fn shift(&self, value: DateTime<Local>, amount: i64) -> Option<DateTime<Local>> {
        let duration = match self {
            DateUnit::Millisecond => Duration::try_milliseconds(amount)?,
            DateUnit::Second => Duration::try_seconds(amount)?,
            DateUnit::Minute => Duration::try_minutes(amount)?,
            DateUnit::Hour => Duration::try_hours(amount)?,
            DateUnit::Day => return shift_days(value, amount),
            DateUnit::Week => return shift_days(value, amount.checked_mul(7)?),
            DateUnit::Month => return shift_months(value, amount),
            DateUnit::Year => return shift_months(value, amount.checked_mul(12)?),
        };
        value.checked_add_signed(duration)
    }
}

/// Calendar-day steps keep the wall-clock time across offset changes
fn shift_days(value: DateTime<Local>, days: i64) -> Option<DateTime<Local>> {
    let count = Days::new(days.unsigned_abs());
    let naive = value.naive_local();
    let shifted = if days >= 0 {
        naive.checked_add_days(count)?
    } else {
        naive.checked_sub_days(count)?
    };
    Local.from_local_datetime(&shifted).earliest()
}

fn shift_months(value: DateTime<Local>, months: i64) -> Option<DateTime<Local>> {
    let count = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        value.checked_add_months(count)
    } else {
        value.checked_sub_months(count)
    }
}

impl fmt::Display for DateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        DateUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == lower)
            .ok_or_else(|| {
                let names: Vec<_> = DateUnit::ALL.iter().map(DateUnit::as_str).collect();
                format!("unknown unit '{}', expected one of: {}", s, names.join(", "))
            })
    }
}
