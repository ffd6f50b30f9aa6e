//! Read-only commands: get, list, lines

use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};

use super::output::Output;
use crate::domain::LogicalLine;
use crate::storage::{FileOptions, PropertyFile};

/// Opens a file that must already exist
fn open_existing(path: &Path) -> Result<PropertyFile> {
    let file = PropertyFile::open(path, FileOptions::default())?;
    if !file.existed() {
        bail!("Property file not found: {}", path.display());
    }
    Ok(file)
}

pub fn get(output: &Output, path: &Path, key: &str) -> Result<()> {
    let file = open_existing(path)?;
    let properties = file.properties();

    let Some(value) = properties.get(key) else {
        bail!("Key '{}' not found in {}", key, path.display());
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "key": key,
            "value": value,
            "raw": properties.get_raw(key),
        }));
    } else {
        println!("{}", value);
    }

    Ok(())
}

pub fn list(output: &Output, path: &Path) -> Result<()> {
    let file = open_existing(path)?;
    let properties = file.properties();
    output.verbose_ctx("list", &format!("{} keys", properties.len()));

    if output.is_json() {
        let items: Vec<_> = properties
            .iter()
            .map(|(key, value)| {
                serde_json::json!({
                    "key": key,
                    "value": value,
                })
            })
            .collect();
        output.data(&items);
    } else {
        for (key, value) in properties.iter() {
            println!("{}={}", key, value);
        }
    }

    Ok(())
}

pub fn lines(output: &Output, path: &Path) -> Result<()> {
    let file = open_existing(path)?;
    let properties = file.properties();

    if output.is_json() {
        let items: Vec<_> = properties
            .lines()
            .map(|line| {
                let mut item = serde_json::json!({
                    "kind": line.kind(),
                    "text": line.text(),
                });
                if let LogicalLine::Pair(pair) = line {
                    item["key"] = serde_json::json!(pair.key());
                    item["value"] = serde_json::json!(pair.value());
                }
                item
            })
            .collect();
        output.data(&serde_json::json!({
            "line_ending": properties.line_ending().name(),
            "lines": items,
        }));
    } else {
        output.verbose_ctx("lines", &format!("line ending: {}", properties.line_ending()));
        properties
            .list_lines(io::stdout().lock())
            .context("Failed to write line listing")?;
    }

    Ok(())
}
