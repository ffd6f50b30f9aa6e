//! Decimal patterns for integer entries
//!
//! Supports the integer subset of the usual decimal pattern syntax: `0` for
//! a mandatory digit, `#` for an optional one and `,` for grouping, e.g.
//! `#,##0` or `0000`. A fractional part in the pattern is accepted and
//! ignored since entries hold integers.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NumberPatternError {
    #[error("Unsupported character '{0}' in number pattern '{1}'")]
    Unsupported(char, String),

    #[error("Empty number pattern")]
    Empty,
}

/// Default pattern, grouping thousands
pub const DEFAULT_NUMBER_PATTERN: &str = "#,##0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberPattern {
    /// Minimum number of integer digits (zero padded)
    min_digits: usize,

    /// Digits per group, if grouping is enabled
    grouping: Option<usize>,
}

impl Default for NumberPattern {
    fn default() -> Self {
        Self {
            min_digits: 1,
            grouping: Some(3),
        }
    }
}

impl NumberPattern {
    /// Compiles a pattern such as `#,##0` or `000`
    pub fn new(pattern: &str) -> Result<Self, NumberPatternError> {
        let integer = pattern.split('.').next().unwrap_or_default();
        if integer.is_empty() {
            return Err(NumberPatternError::Empty);
        }

        if let Some(bad) = pattern
            .chars()
            .find(|c| !matches!(c, '0' | '#' | ',' | '.'))
        {
            return Err(NumberPatternError::Unsupported(bad, pattern.to_string()));
        }

        let min_digits = integer.chars().filter(|&c| c == '0').count();
        let grouping = integer
            .rfind(',')
            .map(|pos| integer.len() - pos - 1)
            .filter(|&size| size > 0);

        Ok(Self {
            min_digits,
            grouping,
        })
    }

    /// Parses the leading number of `text`, ignoring grouping separators
    ///
    /// Returns `None` when `text` does not start with a number.
    pub fn parse(&self, text: &str) -> Option<i64> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let mut value: i64 = 0;
        let mut seen = false;
        for c in digits.chars() {
            match c {
                '0'..='9' => {
                    value = value
                        .checked_mul(10)?
                        .checked_add(i64::from(c as u8 - b'0'))?;
                    seen = true;
                }
                ',' if self.grouping.is_some() && seen => {}
                _ => break,
            }
        }

        if !seen {
            return None;
        }
        Some(if negative { -value } else { value })
    }

    /// Formats `value` with padding and grouping
    pub fn format(&self, value: i64) -> String {
        let mut digits = value.unsigned_abs().to_string();
        while digits.len() < self.min_digits {
            digits.insert(0, '0');
        }

        let grouped = match self.grouping {
            Some(size) => {
                let mut out = String::with_capacity(digits.len() + digits.len() / size);
                for (i, c) in digits.chars().enumerate() {
                    if i > 0 && (digits.len() - i) % size == 0 {
                        out.push(',');
                    }
                    out.push(c);
                }
                out
            }
            None => digits,
        };

        if value < 0 {
            format!("-{}", grouped)
        } else {
            grouped
        }
    }
}
