//! Logical lines of a properties file
//!
//! A logical line is one record of the file: a blank line, a comment, or a
//! key/value pair. A pair may span several physical lines through
//! backslash continuation; the reader joins those before classification.

use std::fmt;

use super::escape::{escape_key, escape_value, unescape_continued};

/// Whitespace that may precede a key or a comment marker
const LEADING_WHITESPACE: [char; 3] = [' ', '\t', '\u{000c}'];

/// One record of a properties file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalLine {
    Blank,
    Comment(String),
    Pair(Pair),
}

impl LogicalLine {
    /// Classifies a joined logical chunk
    ///
    /// `comment` is decided by the reader from the first physical line, since
    /// continuation only applies to non-comment lines.
    pub fn classify(text: &str, comment: bool) -> Self {
        if comment {
            LogicalLine::Comment(text.to_string())
        } else if text.chars().all(|c| c <= ' ') {
            LogicalLine::Blank
        } else {
            LogicalLine::Pair(Pair::parse(text))
        }
    }

    /// Returns the text written for this line
    pub fn text(&self) -> &str {
        match self {
            LogicalLine::Blank => "",
            LogicalLine::Comment(text) => text,
            LogicalLine::Pair(pair) => pair.text(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, LogicalLine::Blank)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, LogicalLine::Comment(_))
    }

    pub fn as_pair(&self) -> Option<&Pair> {
        match self {
            LogicalLine::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    pub fn as_pair_mut(&mut self) -> Option<&mut Pair> {
        match self {
            LogicalLine::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    /// Short label used by line listings
    pub fn kind(&self) -> &'static str {
        match self {
            LogicalLine::Blank => "blank",
            LogicalLine::Comment(_) => "comment",
            LogicalLine::Pair(_) => "pair",
        }
    }
}

impl fmt::Display for LogicalLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Returns true if `text` is a comment line (`#` or `!` after whitespace)
pub fn is_comment_line(text: &str) -> bool {
    matches!(
        text.trim_start_matches(LEADING_WHITESPACE).chars().next(),
        Some('#' | '!')
    )
}

/// A key/value logical line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// Unescaped key
    key: String,

    /// Key as it appears in the file
    raw_key: String,

    /// Escaped value text after the separator; `None` when the line had no
    /// separator
    raw_value: Option<String>,

    /// Text written for the line
    text: String,

    /// Added programmatically rather than loaded
    added: bool,
}

impl Pair {
    /// Parses a joined non-blank, non-comment logical line
    pub fn parse(text: &str) -> Self {
        let (raw_key, raw_value) = match find_separator(text) {
            Some(pos) => (&text[..pos], Some(text[pos..].to_string())),
            None => (text, None),
        };
        let raw_key = raw_key.trim_start_matches(LEADING_WHITESPACE).to_string();

        Self {
            key: unescape_continued(&raw_key),
            raw_key,
            raw_value,
            text: text.to_string(),
            added: false,
        }
    }

    /// Creates a pair for a key that was not in any loaded file
    pub fn new_entry(key: &str, value: &str) -> Self {
        let raw_key = escape_key(key);
        let raw_value = escape_value(value);
        Self {
            key: key.to_string(),
            text: format!("{}={}", raw_key, raw_value),
            raw_key,
            raw_value: Some(format!("={}", raw_value)),
            added: true,
        }
    }

    /// Returns the unescaped key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the key as written in the file
    pub fn raw_key(&self) -> &str {
        &self.raw_key
    }

    /// Returns the escaped value text, without the separator and the
    /// whitespace around it
    pub fn raw_value(&self) -> Option<&str> {
        self.raw_value.as_deref().map(value_start)
    }

    /// Returns the logical (unescaped) value
    pub fn value(&self) -> String {
        match &self.raw_value {
            Some(raw) => unescape_continued(value_start(raw)),
            None => String::new(),
        }
    }

    /// Replaces the value, rebuilding the line text as `key=value`
    pub fn set_value(&mut self, value: &str) {
        let escaped = escape_value(value);
        self.text = format!("{}={}", self.raw_key, escaped);
        self.raw_value = Some(format!("={}", escaped));
    }

    /// Returns the text written for the line
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns true if the pair was added rather than loaded
    pub fn is_new(&self) -> bool {
        self.added
    }
}

/// Skips the separator the way the text-properties reader does: whitespace,
/// then at most one `=` or `:`, then whitespace again
fn value_start(raw: &str) -> &str {
    let mut rest = raw;
    let mut seen_assignment = false;

    if let Some(first) = rest.chars().next() {
        seen_assignment = first == '=' || first == ':';
        rest = &rest[first.len_utf8()..];
    }

    rest = rest.trim_start_matches(LEADING_WHITESPACE);
    if !seen_assignment {
        if let Some(stripped) = rest.strip_prefix(['=', ':']) {
            rest = stripped.trim_start_matches(LEADING_WHITESPACE);
        }
    }
    rest
}

/// Finds the byte position of the first unescaped separator
///
/// Separators are space, tab, `:` and `=`. Leading whitespace before the key
/// is not a separator. A backslash escapes whatever follows it; a backslash
/// before a joined line feed also swallows the next line's indentation.
pub fn find_separator(text: &str) -> Option<usize> {
    let start = text.len() - text.trim_start_matches(LEADING_WHITESPACE).len();
    let mut escaped = false;
    let mut indent = false;

    for (pos, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            indent = c == '\n';
            continue;
        }
        if indent {
            if LEADING_WHITESPACE.contains(&c) {
                continue;
            }
            indent = false;
        }
        match c {
            '\\' => escaped = true,
            ' ' | '\t' | ':' | '=' => return Some(start + pos),
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_comment_and_blank() {
        assert!(LogicalLine::classify("# hi", true).is_comment());
        assert!(LogicalLine::classify("   \t", false).is_blank());
        assert!(LogicalLine::classify("", false).is_blank());
    }

    #[test]
    fn comment_detection() {
        assert!(is_comment_line("#x"));
        assert!(is_comment_line("  ! bang"));
        assert!(is_comment_line("\t\u{000c}# tabbed"));
        assert!(!is_comment_line("key=#value"));
        assert!(!is_comment_line(""));
    }

    #[test]
    fn parse_simple_pair() {
        let pair = Pair::parse("alpha=one");
        assert_eq!(pair.key(), "alpha");
        assert_eq!(pair.value(), "one");
        assert_eq!(pair.raw_value(), Some("one"));
        assert_eq!(pair.text(), "alpha=one");
        assert!(!pair.is_new());
    }

    #[test]
    fn parse_whitespace_separators() {
        let pair = Pair::parse("  key   =   value");
        assert_eq!(pair.key(), "key");
        assert_eq!(pair.value(), "value");

        let pair = Pair::parse("key:value");
        assert_eq!(pair.value(), "value");

        let pair = Pair::parse("key value with spaces");
        assert_eq!(pair.value(), "value with spaces");

        let pair = Pair::parse("key\tvalue");
        assert_eq!(pair.value(), "value");
    }

    #[test]
    fn raw_value_skips_separator() {
        let pair = Pair::parse("key = a\\tb ");
        assert_eq!(pair.raw_value(), Some("a\\tb "));
        assert_eq!(pair.value(), "a\tb ");
    }

    #[test]
    fn only_one_assignment_is_skipped() {
        let pair = Pair::parse("key = =value");
        assert_eq!(pair.value(), "=value");

        let pair = Pair::parse("key==value");
        assert_eq!(pair.value(), "=value");
    }

    #[test]
    fn escaped_separators_stay_in_key() {
        let pair = Pair::parse("a\\=b\\:c\\ d=value");
        assert_eq!(pair.raw_key(), "a\\=b\\:c\\ d");
        assert_eq!(pair.key(), "a=b:c d");
        assert_eq!(pair.value(), "value");
    }

    #[test]
    fn escaped_backslash_before_separator() {
        // `\\` is an escaped backslash, so the `=` after it separates
        let pair = Pair::parse("path\\\\=c");
        assert_eq!(pair.key(), "path\\");
        assert_eq!(pair.value(), "c");
    }

    #[test]
    fn double_underscore_is_not_special() {
        let pair = Pair::parse("__a__=b__");
        assert_eq!(pair.key(), "__a__");
        assert_eq!(pair.value(), "b__");
    }

    #[test]
    fn pair_without_separator() {
        let pair = Pair::parse("lonely");
        assert_eq!(pair.key(), "lonely");
        assert_eq!(pair.raw_value(), None);
        assert_eq!(pair.value(), "");
        assert_eq!(pair.text(), "lonely");
    }

    #[test]
    fn continued_value() {
        let pair = Pair::parse("list=one, \\\n    two");
        assert_eq!(pair.key(), "list");
        assert_eq!(pair.value(), "one, two");
    }

    #[test]
    fn continued_key() {
        let pair = Pair::parse("ke\\\n  y=v");
        assert_eq!(pair.key(), "key");
        assert_eq!(pair.value(), "v");
        assert_eq!(pair.raw_key(), "ke\\\n  y");

        let pair = Pair::parse("long\\\n\tkey \\\n  value");
        assert_eq!(pair.key(), "longkey");
        assert_eq!(pair.value(), "value");
    }

    #[test]
    fn set_value_rebuilds_text() {
        let mut pair = Pair::parse("  my\\ key : old");
        pair.set_value(" new value");
        assert_eq!(pair.text(), "my\\ key=\\ new value");
        assert_eq!(pair.value(), " new value");
        assert_eq!(pair.key(), "my key");
    }

    #[test]
    fn new_entry_is_escaped_and_flagged() {
        let pair = Pair::new_entry("a key", "x=y");
        assert_eq!(pair.text(), "a\\ key=x\\=y");
        assert_eq!(pair.key(), "a key");
        assert_eq!(pair.value(), "x=y");
        assert!(pair.is_new());
    }
}
