//! Commands that change a property file: set, del, edit, apply

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use super::output::Output;
use crate::domain::{DateUnit, Entry, EntryType, Operation};
use crate::storage::{Config, EditConfig, FileOptions, PropertyFile};

/// Options shared by every command that writes the file
#[derive(Args, Debug, Clone, Default)]
pub struct WriteArgs {
    /// Header comment written at the top of the file
    #[arg(long)]
    pub comment: Option<String>,

    /// Also remove the comments in front of deleted keys
    #[arg(long, conflicts_with = "keep_comments")]
    pub remove_comments: bool,

    /// Keep the comments in front of deleted keys, whatever the config says
    #[arg(long)]
    pub keep_comments: bool,
}

impl WriteArgs {
    /// Merges the flags with the project configuration; flags win
    pub fn options(&self, config: &Config) -> FileOptions {
        let store = &config.project.store;
        FileOptions {
            remove_comments: if self.keep_comments {
                false
            } else {
                self.remove_comments || store.remove_comments
            },
            header: self.comment.clone().or_else(|| store.header.clone()),
        }
    }
}

/// Flags describing a single typed edit
#[derive(Args, Debug, Clone)]
pub struct EntryArgs {
    /// Value type (string, int, date)
    #[arg(long = "type", short = 't', default_value = "string")]
    pub kind: EntryType,

    /// Operation (=, +, -, del)
    #[arg(long, short = 'o', default_value = "=", allow_hyphen_values = true)]
    pub operation: Operation,

    /// Value to set, or the amount to add or subtract
    #[arg(long, allow_hyphen_values = true)]
    pub value: Option<String>,

    /// Value used when the property is missing
    #[arg(long, allow_hyphen_values = true)]
    pub default: Option<String>,

    /// Number or date pattern
    #[arg(long)]
    pub pattern: Option<String>,

    /// Unit for date arithmetic
    #[arg(long, default_value = "day")]
    pub unit: DateUnit,
}

impl EntryArgs {
    pub fn into_entry(self, key: String) -> Entry {
        Entry {
            key,
            kind: self.kind,
            operation: self.operation,
            value: self.value,
            default: self.default,
            pattern: self.pattern,
            unit: self.unit,
        }
    }
}

/// Layout of an entries file for `apply`
///
/// ```toml
/// [[entry]]
/// key = "build.number"
/// type = "int"
/// operation = "+"
/// value = "1"
/// ```
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct EntryFile {
    entry: Vec<Entry>,
}

/// Fills in the configured pattern for typed entries that have none
fn with_configured_pattern(mut entry: Entry, edit: &EditConfig) -> Entry {
    if entry.pattern.is_none() {
        entry.pattern = edit.pattern_for(entry.kind).map(str::to_string);
    }
    entry
}

fn open(output: &Output, path: &Path, options: FileOptions) -> Result<PropertyFile> {
    output.verbose_ctx(
        "open",
        &format!(
            "{} (remove_comments={}, header={:?})",
            path.display(),
            options.remove_comments,
            options.header
        ),
    );
    let file = PropertyFile::open(path, options)?;
    if !file.existed() {
        output.verbose_ctx("open", "File does not exist yet, starting empty");
    }
    Ok(file)
}

pub fn set(
    output: &Output,
    config: &Config,
    path: &Path,
    key: &str,
    value: &str,
    write: &WriteArgs,
) -> Result<()> {
    let mut file = open(output, path, write.options(config))?;

    let old = file.properties_mut().put(key, value);
    output.verbose_ctx("set", &format!("{}: {:?} -> {:?}", key, old, value));

    file.write()?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "key": key,
            "value": value,
            "previous": old,
        }));
    } else {
        output.success(&format!("Set {} in {}", key, path.display()));
    }

    Ok(())
}

pub fn delete(
    output: &Output,
    config: &Config,
    path: &Path,
    key: &str,
    write: &WriteArgs,
) -> Result<()> {
    let mut file = open(output, path, write.options(config))?;

    let Some(old) = file.properties_mut().remove(key) else {
        output.success(&format!("Key {} not present in {}", key, path.display()));
        return Ok(());
    };
    output.verbose_ctx("del", &format!("{}: removed {:?}", key, old));

    file.write()?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "key": key,
            "removed": true,
            "previous": old,
        }));
    } else {
        output.success(&format!("Removed {} from {}", key, path.display()));
    }

    Ok(())
}

pub fn edit(
    output: &Output,
    config: &Config,
    path: &Path,
    entry: Entry,
    write: &WriteArgs,
) -> Result<()> {
    let entry = with_configured_pattern(entry, &config.project.edit);
    output.verbose_ctx(
        "edit",
        &format!("{} {} ({})", entry.key, entry.operation, entry.kind),
    );

    let mut file = open(output, path, write.options(config))?;
    file.apply(std::slice::from_ref(&entry))?;
    file.write()?;

    let value = file.properties().get(&entry.key);
    if output.is_json() {
        output.data(&serde_json::json!({
            "key": entry.key,
            "value": value,
        }));
    } else {
        match value {
            Some(value) => output.success(&format!("{}={}", entry.key, value)),
            None => output.success(&format!("Removed {} from {}", entry.key, path.display())),
        }
    }

    Ok(())
}

pub fn apply(
    output: &Output,
    config: &Config,
    path: &Path,
    entries_path: &Path,
    write: &WriteArgs,
) -> Result<()> {
    let content = fs::read_to_string(entries_path)
        .with_context(|| format!("Failed to read entries file: {}", entries_path.display()))?;
    let entries: EntryFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse entries file: {}", entries_path.display()))?;

    let entries: Vec<Entry> = entries
        .entry
        .into_iter()
        .map(|entry| with_configured_pattern(entry, &config.project.edit))
        .collect();
    output.verbose_ctx("apply", &format!("{} entries", entries.len()));

    let mut file = open(output, path, write.options(config))?;
    file.apply(&entries)?;
    file.write()?;

    if output.is_json() {
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        output.data(&serde_json::json!({
            "applied": entries.len(),
            "keys": keys,
        }));
    } else {
        output.success(&format!(
            "Applied {} entries to {}",
            entries.len(),
            path.display()
        ));
    }

    Ok(())
}
