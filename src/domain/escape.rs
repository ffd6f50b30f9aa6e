//! Escaping rules for the properties text format
//!
//! Keys and values are stored in the file in escaped form. Reading a file
//! unescapes them; writing a programmatically-set key or value escapes it
//! again. Keys escape every space, values only the leading ones.

/// Which part of a pair is being escaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeMode {
    /// Every space is escaped so the key cannot be split on it
    Key,
    /// Only leading spaces are escaped
    Value,
}

/// Characters that are always escaped, paired with their escape letter
const ESCAPED: [(char, char); 9] = [
    ('\t', 't'),
    ('\u{000c}', 'f'),
    ('\r', 'r'),
    ('\n', 'n'),
    ('\\', '\\'),
    (':', ':'),
    ('=', '='),
    ('#', '#'),
    ('!', '!'),
];

/// Escapes a key for writing
pub fn escape_key(s: &str) -> String {
    escape(s, EscapeMode::Key)
}

/// Escapes a value for writing
pub fn escape_value(s: &str) -> String {
    escape(s, EscapeMode::Value)
}

/// Escapes `s` according to `mode`
pub fn escape(s: &str, mode: EscapeMode) -> String {
    let mut out = String::with_capacity(s.len());
    let mut leading_space = true;

    for c in s.chars() {
        if c == ' ' {
            if mode == EscapeMode::Key || leading_space {
                out.push('\\');
            }
        } else {
            leading_space = false;
        }

        if let Some((_, letter)) = ESCAPED.iter().find(|(ch, _)| *ch == c) {
            out.push('\\');
            out.push(*letter);
        } else if (c as u32) < 0x20 || (c as u32) > 0x7e {
            push_unicode_escape(&mut out, c);
        } else {
            out.push(c);
        }
    }

    out
}

/// Appends `\uXXXX` escapes for `c`, one per UTF-16 unit
pub(crate) fn push_unicode_escape(out: &mut String, c: char) {
    let mut units = [0u16; 2];
    for unit in c.encode_utf16(&mut units) {
        out.push_str(&format!("\\u{:04x}", unit));
    }
}

/// Unescapes a key or value read from a file
///
/// Recognizes `\n`, `\r`, `\f`, `\t`, `\\` and `\uXXXX`. Any other escaped
/// character stands for itself, so `\b` reads as `b`. A raw line feed ends
/// the string.
pub fn unescape(s: &str) -> String {
    decode(s, false)
}

/// Unescapes a value that may span several physical lines
///
/// A backslash followed by the joined line feed is a continuation: both are
/// dropped together with the leading whitespace of the next line.
pub fn unescape_continued(s: &str) -> String {
    decode(s, true)
}

fn decode(s: &str, continued: bool) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            break;
        }
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }

        // Lone trailing backslash is dropped
        let Some(&next) = chars.get(i + 1) else {
            break;
        };
        i += 2;

        match next {
            '\n' if continued => {
                while i < chars.len() && matches!(chars[i], ' ' | '\t' | '\u{000c}') {
                    i += 1;
                }
            }
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            'f' => out.push('\u{000c}'),
            't' => out.push('\t'),
            'u' => match read_hex4(&chars, i) {
                Some(unit) => {
                    i += 4;
                    out.push(combine_utf16(unit, &chars, &mut i));
                }
                None => out.push('u'),
            },
            other => out.push(other),
        }
    }

    out
}

fn read_hex4(chars: &[char], at: usize) -> Option<u16> {
    let digits = chars.get(at..at + 4)?;
    let text: String = digits.iter().collect();
    u16::from_str_radix(&text, 16).ok()
}

/// Turns a decoded UTF-16 unit into a char, consuming a following
/// `\uXXXX` low surrogate when `unit` is a high surrogate
fn combine_utf16(unit: u16, chars: &[char], i: &mut usize) -> char {
    if (0xd800..0xdc00).contains(&unit) {
        let is_escape = chars.get(*i) == Some(&'\\') && chars.get(*i + 1) == Some(&'u');
        if is_escape {
            if let Some(low) = read_hex4(chars, *i + 2) {
                if (0xdc00..0xe000).contains(&low) {
                    *i += 6;
                    return char::decode_utf16([unit, low])
                        .next()
                        .and_then(Result::ok)
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                }
            }
        }
    }

    char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn escape_value_only_leading_spaces() {
        assert_eq!(escape_value("  a b"), "\\ \\ a b");
    }

    #[test]
    fn escape_key_all_spaces() {
        assert_eq!(escape_key("a b c"), "a\\ b\\ c");
    }

    #[test]
    fn escape_special_characters() {
        assert_eq!(escape_value("a=b:c#d!e\\f"), "a\\=b\\:c\\#d\\!e\\\\f");
        assert_eq!(escape_value("tab\there"), "tab\\there");
        assert_eq!(escape_value("line\nbreak\r"), "line\\nbreak\\r");
    }

    #[test]
    fn escape_non_ascii_as_unicode() {
        assert_eq!(escape_value("caf\u{e9}"), "caf\\u00e9");
        assert_eq!(escape_value("\u{1f600}"), "\\ud83d\\ude00");
    }

    #[test]
    fn unescape_known_sequences() {
        assert_eq!(unescape("a\\tb\\nc\\rd\\fe\\\\f"), "a\tb\nc\rd\u{000c}e\\f");
        assert_eq!(unescape("caf\\u00e9"), "caf\u{e9}");
    }

    #[test]
    fn unescape_unknown_escape_is_literal() {
        assert_eq!(unescape("\\b\\:\\="), "b:=");
    }

    #[test]
    fn unescape_stops_at_raw_newline() {
        assert_eq!(unescape("abc\ndef"), "abc");
    }

    #[test]
    fn unescape_drops_trailing_backslash() {
        assert_eq!(unescape("abc\\"), "abc");
    }

    #[test]
    fn unescape_malformed_unicode() {
        assert_eq!(unescape("\\u00zz"), "u00zz");
        assert_eq!(unescape("\\u12"), "u12");
    }

    #[test]
    fn unescape_surrogate_pair() {
        assert_eq!(unescape("\\ud83d\\ude00"), "\u{1f600}");
    }

    #[test]
    fn continuation_drops_next_line_indent() {
        assert_eq!(unescape_continued("one \\\n    two"), "one two");
        assert_eq!(unescape_continued("a\\\\\\\n  b"), "a\\b");
    }

    proptest! {
        #[test]
        fn value_escape_roundtrip(s in any::<String>()) {
            prop_assert_eq!(unescape(&escape_value(&s)), s);
        }

        #[test]
        fn key_escape_roundtrip(s in any::<String>()) {
            prop_assert_eq!(unescape(&escape_key(&s)), s);
        }
    }
}
