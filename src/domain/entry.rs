//! Typed property edits
//!
//! An [`Entry`] describes one change to a property: set it, add to it,
//! subtract from it, or delete it. Values can be treated as plain strings,
//! integers (with a decimal pattern) or dates (with a date pattern and a
//! unit for arithmetic).
//!
//! ## Value resolution for `=`
//!
//! | value | default | property exists | result |
//! |-------|---------|-----------------|--------|
//! | set | unset | any | value |
//! | unset | set | yes | unchanged |
//! | unset | set | no | default |
//! | set | set | yes | value |
//! | set | set | no | default |
//!
//! For `+` and `-` the existing value is used, falling back to the default.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::date_pattern::{DatePattern, DatePatternError, DateUnit};
use super::number::{NumberPattern, NumberPatternError};

/// Value that stands for the current time in date entries
pub const NOW: &str = "now";

#[derive(Debug, Error, PartialEq)]
pub enum EntryError {
    #[error("key is mandatory")]
    MissingKey,

    #[error("\"value\" and/or \"default\" must be specified (key: {0})")]
    MissingValue(String),

    #[error("- is not supported for string properties (key: {0})")]
    StringDecrement(String),

    #[error("pattern is not supported for string properties (key: {0})")]
    PatternOnString(String),

    #[error("Value not an integer on {0}")]
    NotAnInteger(String),

    #[error("Result out of range on {0}")]
    OutOfRange(String),

    #[error(transparent)]
    DatePattern(#[from] DatePatternError),

    #[error(transparent)]
    NumberPattern(#[from] NumberPatternError),
}

/// How the property value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    String,
    Int,
    Date,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::String => "string",
            EntryType::Int => "int",
            EntryType::Date => "date",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(EntryType::String),
            "int" => Ok(EntryType::Int),
            "date" => Ok(EntryType::Date),
            _ => Err(format!("unknown type '{}', expected one of: string, int, date", s)),
        }
    }
}

/// What the entry does to the property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operation {
    #[default]
    #[serde(rename = "=")]
    Set,
    #[serde(rename = "+")]
    Increment,
    #[serde(rename = "-")]
    Decrement,
    #[serde(rename = "del")]
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Set => "=",
            Operation::Increment => "+",
            Operation::Decrement => "-",
            Operation::Delete => "del",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Operation::Set),
            "+" => Ok(Operation::Increment),
            "-" => Ok(Operation::Decrement),
            "del" => Ok(Operation::Delete),
            _ => Err(format!("unknown operation '{}', expected one of: =, +, -, del", s)),
        }
    }
}

/// Result of evaluating an entry against the current value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Store this value under the key
    Set(String),
    /// Remove the key
    Remove,
}

/// One edit to a property
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub key: String,

    #[serde(rename = "type")]
    pub kind: EntryType,

    pub operation: Operation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    pub unit: DateUnit,
}

impl Entry {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, kind: EntryType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_unit(mut self, unit: DateUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Checks the entry is self-consistent
    pub fn validate(&self) -> Result<(), EntryError> {
        if self.key.is_empty() {
            return Err(EntryError::MissingKey);
        }
        if self.kind == EntryType::String && self.operation == Operation::Decrement {
            return Err(EntryError::StringDecrement(self.key.clone()));
        }
        if self.value.is_none() && self.default.is_none() && self.operation != Operation::Delete {
            return Err(EntryError::MissingValue(self.key.clone()));
        }
        if self.kind == EntryType::String && self.pattern.is_some() {
            return Err(EntryError::PatternOnString(self.key.clone()));
        }
        Ok(())
    }

    /// Computes what happens to the property given its current value
    ///
    /// `now` is the time used for date entries whose value is `now` or
    /// cannot be parsed.
    pub fn evaluate(&self, old: Option<&str>, now: DateTime<Local>) -> Result<Outcome, EntryError> {
        self.validate()?;

        let new_value = match (self.operation, self.kind) {
            (Operation::Delete, _) => return Ok(Outcome::Remove),
            (_, EntryType::String) => self.evaluate_string(old),
            (_, EntryType::Int) => self.evaluate_int(old)?,
            (_, EntryType::Date) => self.evaluate_date(old, now)?,
        };

        Ok(Outcome::Set(new_value))
    }

    /// Picks the starting value from value, default and the existing value
    fn current_value<'a>(&'a self, old: Option<&'a str>) -> Option<&'a str> {
        let value = self.value.as_deref();
        let default = self.default.as_deref();

        if self.operation != Operation::Set {
            return old.or(default);
        }

        match (value, default, old) {
            (Some(v), None, _) => Some(v),
            (None, Some(_), Some(o)) => Some(o),
            (None, Some(d), None) => Some(d),
            (Some(v), Some(_), Some(_)) => Some(v),
            (Some(_), Some(d), None) => Some(d),
            (None, None, _) => None,
        }
    }

    fn evaluate_string(&self, old: Option<&str>) -> String {
        let current = self.current_value(old).unwrap_or_default();
        match self.operation {
            Operation::Increment => format!("{}{}", current, self.value.as_deref().unwrap_or_default()),
            _ => current.to_string(),
        }
    }

    fn evaluate_int(&self, old: Option<&str>) -> Result<String, EntryError> {
        let pattern = match &self.pattern {
            Some(p) => NumberPattern::new(p)?,
            None => NumberPattern::default(),
        };

        let current = self
            .current_value(old)
            .and_then(|v| pattern.parse(v))
            .unwrap_or(0);

        let step = || {
            self.value
                .as_deref()
                .and_then(|v| pattern.parse(v))
                .unwrap_or(1)
        };

        let result = match self.operation {
            Operation::Increment => current.checked_add(step()),
            Operation::Decrement => current.checked_sub(step()),
            _ => Some(current),
        }
        .ok_or_else(|| EntryError::OutOfRange(self.key.clone()))?;

        Ok(pattern.format(result))
    }

    fn evaluate_date(&self, old: Option<&str>, now: DateTime<Local>) -> Result<String, EntryError> {
        let pattern = match &self.pattern {
            Some(p) => DatePattern::new(p)?,
            None => DatePattern::default(),
        };

        let current = match self.current_value(old).unwrap_or(NOW) {
            NOW => now,
            text => pattern.parse(text).unwrap_or(now),
        };

        let result = match self.operation {
            Operation::Increment | Operation::Decrement => {
                let offset: i64 = self
                    .value
                    .as_deref()
                    .and_then(|v| v.trim().parse().ok())
                    .ok_or_else(|| EntryError::NotAnInteger(self.key.clone()))?;
                let offset = if self.operation == Operation::Decrement {
                    -offset
                } else {
                    offset
                };
                self.unit
                    .shift(current, offset)
                    .ok_or_else(|| EntryError::OutOfRange(self.key.clone()))?
            }
            _ => current,
        };

        Ok(pattern.format(&result))
    }
}
