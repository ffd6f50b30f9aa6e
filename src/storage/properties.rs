//! Layout-preserving properties collection
//!
//! [`LayoutProperties`] keeps every logical line of the files it loaded, so
//! storing the collection writes back the original comments, blank lines and
//! key order. Changed values are updated in place, new keys are appended after
//! a blank line, and removed keys are excised.
//!
//! ## Line storage
//!
//! Lines live in a position-addressed list. Removing a line leaves a `None`
//! tombstone in its slot so that the positions recorded in the key index stay
//! valid. The index maps each unescaped key to the position of its pair.
//!
//! ## Repeated loads
//!
//! A second load appends its lines after a blank separator. A key that was
//! already present is removed from its old position first, so the last loaded
//! value wins:
//!
//! ```text
//! # the first line          # the first line
//! alpha=one                 alpha=one
//!                    +
//! # the second line         # association       =>   ...
//! beta=two                  beta=band
//! ```
//!
//! With [`set_remove_comments`](LayoutProperties::set_remove_comments) enabled
//! the comment block in front of a removed key goes with it.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use fs2::FileExt;

use super::header::{current_date_stamp, is_date_stamp};
use super::reader::{read_chunks, split_chunks, LineEnding, ReadLines};
use crate::domain::{push_unicode_escape, Entry, EntryError, LogicalLine, Outcome, Pair};

/// Properties collection that preserves the layout of loaded files
#[derive(Debug, Clone, Default)]
pub struct LayoutProperties {
    /// Logical lines in file order; `None` marks a removed line
    lines: Vec<Option<LogicalLine>>,

    /// Position of each key's pair in `lines`
    index: HashMap<String, usize>,

    /// Line ending of the most recent load
    ending: Option<LineEnding>,

    /// Remove the comment block in front of a removed key
    remove_comments: bool,

    /// Consulted by `get_property` for missing keys
    defaults: Option<Box<LayoutProperties>>,
}

impl LayoutProperties {
    /// Creates an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection that falls back to `defaults`
    pub fn with_defaults(defaults: LayoutProperties) -> Self {
        Self {
            defaults: Some(Box::new(defaults)),
            ..Self::default()
        }
    }

    /// Returns true if removing a key also removes its leading comments
    pub fn remove_comments(&self) -> bool {
        self.remove_comments
    }

    pub fn set_remove_comments(&mut self, remove: bool) {
        self.remove_comments = remove;
    }

    /// Line ending used when storing
    ///
    /// This is the ending detected by the last load, or the platform's if
    /// nothing was loaded.
    pub fn line_ending(&self) -> LineEnding {
        self.ending.unwrap_or_default()
    }

    /// Loads properties from a Latin-1 byte stream
    ///
    /// Lines are appended to any already loaded, after a blank separator.
    pub fn load<R: Read>(&mut self, reader: R) -> io::Result<()> {
        let read = read_chunks(reader)?;
        self.load_lines(read);
        Ok(())
    }

    /// Loads properties from already decoded text
    pub fn load_str(&mut self, text: &str) {
        self.load_lines(split_chunks(text));
    }

    fn load_lines(&mut self, read: ReadLines) {
        if !self.lines.is_empty() {
            self.lines.push(Some(LogicalLine::Blank));
        }

        self.ending = Some(read.ending.unwrap_or_else(LineEnding::platform));

        for chunk in read.chunks {
            let line = LogicalLine::classify(&chunk.text, chunk.comment);

            if let LogicalLine::Pair(pair) = &line {
                let key = pair.key().to_string();
                if self.index.contains_key(&key) {
                    self.remove(&key);
                }
                self.index.insert(key, self.lines.len());
            }

            self.lines.push(Some(line));
        }
    }

    fn pair(&self, key: &str) -> Option<&Pair> {
        let pos = *self.index.get(key)?;
        self.lines.get(pos)?.as_ref()?.as_pair()
    }

    fn pair_mut(&mut self, key: &str) -> Option<&mut Pair> {
        let pos = *self.index.get(key)?;
        self.lines.get_mut(pos)?.as_mut()?.as_pair_mut()
    }

    /// Returns the unescaped value of `key`
    pub fn get(&self, key: &str) -> Option<String> {
        self.pair(key).map(Pair::value)
    }

    /// Returns the value of `key` as written in the file, still escaped
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.pair(key).map(|pair| pair.raw_value().unwrap_or_default())
    }

    /// Returns the value of `key`, falling back to the defaults
    pub fn get_property(&self, key: &str) -> Option<String> {
        self.get(key).or_else(|| {
            self.defaults
                .as_ref()
                .and_then(|defaults| defaults.get_property(key))
        })
    }

    /// Sets `key` to `value`, returning the previous value
    ///
    /// An existing key keeps its position. A new key is appended and will be
    /// written after a blank separator line.
    pub fn put(&mut self, key: &str, value: &str) -> Option<String> {
        if let Some(pair) = self.pair_mut(key) {
            let old = pair.value();
            pair.set_value(value);
            return Some(old);
        }

        self.index.insert(key.to_string(), self.lines.len());
        self.lines
            .push(Some(LogicalLine::Pair(Pair::new_entry(key, value))));
        None
    }

    /// Same as [`put`](Self::put)
    pub fn set(&mut self, key: &str, value: &str) -> Option<String> {
        self.put(key, value)
    }

    /// Removes `key`, returning its value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.index.remove(key)?;
        let old = self
            .lines
            .get(pos)
            .and_then(Option::as_ref)
            .and_then(LogicalLine::as_pair)
            .map(Pair::value);

        if self.remove_comments {
            self.remove_comments_ending_at(pos);
        }
        if let Some(slot) = self.lines.get_mut(pos) {
            *slot = None;
        }

        old
    }

    /// Tombstones the comment block leading up to `pos`
    ///
    /// Steps back over blank lines; if a comment is reached, steps back over
    /// the whole comment block and removes it together with the blanks.
    fn remove_comments_ending_at(&mut self, pos: usize) {
        let Some(end) = pos.checked_sub(1) else {
            return;
        };

        let is_blank = |line: &Option<LogicalLine>| line.as_ref().is_some_and(LogicalLine::is_blank);
        let is_comment =
            |line: &Option<LogicalLine>| line.as_ref().is_some_and(LogicalLine::is_comment);

        let mut start = end;
        while start > 0 && is_blank(&self.lines[start]) {
            start -= 1;
        }

        if !is_comment(&self.lines[start]) {
            return;
        }

        while start > 0 && is_comment(&self.lines[start - 1]) {
            start -= 1;
        }

        for slot in &mut self.lines[start..=end] {
            *slot = None;
        }
    }

    /// Removes every line and key
    pub fn clear(&mut self) {
        self.lines.clear();
        self.index.clear();
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Live logical lines in file order
    pub fn lines(&self) -> impl Iterator<Item = &LogicalLine> {
        self.lines.iter().flatten()
    }

    /// Keys in file order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines()
            .filter_map(LogicalLine::as_pair)
            .map(Pair::key)
    }

    /// Key/value pairs in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, String)> {
        self.lines()
            .filter_map(LogicalLine::as_pair)
            .map(|pair| (pair.key(), pair.value()))
    }

    /// Applies a typed edit
    pub fn apply(&mut self, entry: &Entry) -> Result<(), EntryError> {
        self.apply_at(entry, Local::now())
    }

    /// Applies a typed edit using `now` as the current time
    pub fn apply_at(&mut self, entry: &Entry, now: DateTime<Local>) -> Result<(), EntryError> {
        let old = self.get(&entry.key);
        match entry.evaluate(old.as_deref(), now)? {
            Outcome::Set(value) => {
                self.put(&entry.key, &value);
            }
            Outcome::Remove => {
                self.remove(&entry.key);
            }
        }
        Ok(())
    }

    /// Writes a listing of the logical lines, for debugging
    pub fn list_lines<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "-- logical lines --")?;
        for line in self.lines() {
            let label = format!("{}:", line.kind());
            writeln!(out, "{:<9}\"{}\"", label, line)?;
        }
        Ok(())
    }

    /// Writes the collection as Latin-1 text
    ///
    /// `header` becomes the first comment line. A fresh date stamp follows
    /// it; an earlier header or stamp at the top of the loaded lines is
    /// replaced rather than repeated.
    pub fn store<W: Write>(&self, mut out: W, header: Option<&str>) -> io::Result<()> {
        let text = self.render(header);
        out.write_all(&encode_latin1(&text))?;
        out.flush()
    }

    /// Stores the collection into `path`, holding an exclusive lock while
    /// writing
    pub fn save_as(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().write(true).create(true).open(path)?;
        file.lock_exclusive()?;
        // truncate only once the lock is held
        file.set_len(0)?;

        let mut writer = BufWriter::new(&file);
        self.store(&mut writer, None)?;
        writer.flush()?;

        // Lock is released when file is dropped
        Ok(())
    }

    /// Renders the text `store` would write
    pub fn render(&self, header: Option<&str>) -> String {
        self.render_with_stamp(header, &current_date_stamp())
    }

    pub(crate) fn render_with_stamp(&self, header: Option<&str>, stamp: &str) -> String {
        let eol = self.line_ending().as_str();
        let live: Vec<&LogicalLine> = self.lines().collect();
        let mut out = String::new();
        let mut skip = 0;

        if let Some(header) = header {
            let header_lines: Vec<&str> = header
                .split('\n')
                .map(|l| l.trim_end_matches('\r'))
                .collect();
            for line in &header_lines {
                out.push('#');
                out.push_str(line);
                out.push_str(eol);
            }

            // an earlier copy of the whole header is replaced
            let repeated = live.len() >= header_lines.len()
                && live.iter().zip(&header_lines).all(|(line, expected)| {
                    matches!(line, LogicalLine::Comment(text) if comment_body(text) == *expected)
                });
            if repeated {
                skip = header_lines.len();
            }
        }

        // an earlier stamp is replaced, not kept
        if let Some(LogicalLine::Comment(text)) = live.get(skip) {
            if is_date_stamp(comment_body(text)) {
                skip += 1;
            }
        }

        out.push('#');
        out.push_str(stamp);
        out.push_str(eol);

        let mut written_separator = false;
        for line in live.iter().skip(skip) {
            if let LogicalLine::Pair(pair) = line {
                if pair.is_new() && !written_separator {
                    out.push_str(eol);
                    written_separator = true;
                }
            }
            // continued lines were joined with a bare line feed
            out.push_str(&line.text().replace('\n', eol));
            out.push_str(eol);
        }

        out
    }
}

/// Comment text after the `#` or `!` marker
fn comment_body(text: &str) -> &str {
    let trimmed = text.trim_start_matches([' ', '\t', '\u{000c}']);
    trimmed.strip_prefix(['#', '!']).unwrap_or(trimmed)
}

/// Encodes text as Latin-1; chars above U+00FF become `\uXXXX` escapes
pub fn encode_latin1(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match u8::try_from(u32::from(c)) {
            Ok(b) => bytes.push(b),
            Err(_) => {
                let mut escaped = String::new();
                push_unicode_escape(&mut escaped, c);
                bytes.extend_from_slice(escaped.as_bytes());
            }
        }
    }
    bytes
}
