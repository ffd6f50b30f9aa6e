//! Domain models for propedit
//!
//! Text-format rules and edit semantics without any I/O concerns.

mod escape;
mod line;
mod number;
mod date_pattern;
mod entry;

pub use escape::{escape, escape_key, escape_value, unescape, unescape_continued, EscapeMode};
pub(crate) use escape::push_unicode_escape;
pub use line::{find_separator, is_comment_line, LogicalLine, Pair};
pub use number::{NumberPattern, NumberPatternError, DEFAULT_NUMBER_PATTERN};
pub use date_pattern::{DatePattern, DatePatternError, DateUnit, DEFAULT_DATE_PATTERN};
pub use entry::{Entry, EntryError, EntryType, Operation, Outcome, NOW};
