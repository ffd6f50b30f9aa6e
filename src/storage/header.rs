//! Date-stamp comment written at the top of stored files
//!
//! The stamp uses the SMTP date style, e.g. `Fri, 17 May 2024 09:30:00 +0200`.

use chrono::{DateTime, Local, NaiveDateTime};

const STAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";
const STAMP_PREFIX: &str = "%a, %d %b %Y %H:%M:%S";

/// Formats a date stamp
pub fn date_stamp(at: &DateTime<Local>) -> String {
    at.format(STAMP_FORMAT).to_string()
}

/// Date stamp for the current time
pub fn current_date_stamp() -> String {
    date_stamp(&Local::now())
}

/// Returns true if `text` starts with a date stamp
///
/// Only the date and time are checked; whatever follows them (normally the
/// zone offset) is ignored.
pub fn is_date_stamp(text: &str) -> bool {
    NaiveDateTime::parse_and_remainder(text, STAMP_PREFIX).is_ok()
}
