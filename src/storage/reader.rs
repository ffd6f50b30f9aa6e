//! Physical line reader for properties files
//!
//! Splits a Latin-1 byte stream into physical lines, detects the file's line
//! ending from the first separator, and joins backslash-continued lines into
//! logical chunks ready for classification.

use std::fmt;
use std::io::{self, Read};

use crate::domain::is_comment_line;

/// End-of-line convention of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    Cr,
    CrLf,
}

impl LineEnding {
    /// Line ending of the current platform
    pub fn platform() -> Self {
        if cfg!(windows) {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Name used in listings
    pub fn name(&self) -> &'static str {
        match self {
            LineEnding::Lf => "lf",
            LineEnding::Cr => "cr",
            LineEnding::CrLf => "crlf",
        }
    }
}

impl Default for LineEnding {
    fn default() -> Self {
        Self::platform()
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A logical line before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Joined text; continued lines are separated by a literal `\n`
    pub text: String,

    /// First non-whitespace character is `#` or `!`
    pub comment: bool,
}

/// Output of [`read_chunks`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadLines {
    /// Line ending from the first separator, if the input had one
    pub ending: Option<LineEnding>,

    pub chunks: Vec<Chunk>,
}

/// Decodes bytes as Latin-1, one char per byte
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Reads all of `reader` and splits it into logical chunks
pub fn read_chunks<R: Read>(mut reader: R) -> io::Result<ReadLines> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(split_chunks(&decode_latin1(&bytes)))
}

/// Splits decoded text into logical chunks
pub fn split_chunks(text: &str) -> ReadLines {
    let (ending, physical) = split_physical(text);

    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut continuation = false;
    let mut comment = false;

    for line in physical {
        if continuation {
            // restore the line feed the split removed
            buffer.push('\n');
        } else {
            comment = is_comment_line(line);
        }
        buffer.push_str(line);

        if !comment {
            continuation = requires_continuation(&buffer);
        }

        if !continuation {
            chunks.push(Chunk {
                text: std::mem::take(&mut buffer),
                comment,
            });
        }
    }

    // unterminated continuation at end of input
    if continuation {
        chunks.push(Chunk {
            text: buffer,
            comment: false,
        });
    }

    ReadLines { ending, chunks }
}

/// Splits on `\n`, `\r` and `\r\n`, returning the first separator seen
fn split_physical(text: &str) -> (Option<LineEnding>, Vec<&str>) {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut ending = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let found = match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => Some((LineEnding::CrLf, 2)),
            b'\r' => Some((LineEnding::Cr, 1)),
            b'\n' => Some((LineEnding::Lf, 1)),
            _ => None,
        };

        match found {
            Some((kind, len)) => {
                ending.get_or_insert(kind);
                lines.push(&text[start..i]);
                i += len;
                start = i;
            }
            None => i += 1,
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }

    (ending, lines)
}

/// True if `s` ends in an odd number of backslashes
fn requires_continuation(s: &str) -> bool {
    let trailing = s.chars().rev().take_while(|&c| c == '\\').count();
    trailing % 2 == 1
}
