//! Property file sessions
//!
//! A [`PropertyFile`] loads a properties file (or starts an empty one when it
//! does not exist yet), applies edits, and writes the result back. The new
//! content is rendered in memory first and then written atomically
//! (temp file + rename) so a failed write never truncates the original.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::properties::{encode_latin1, LayoutProperties};
use crate::domain::Entry;

/// Options controlling how a property file is rewritten
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    /// Remove the comments in front of removed keys
    pub remove_comments: bool,

    /// Comment written as the first line
    pub header: Option<String>,
}

/// A properties file opened for editing
pub struct PropertyFile {
    path: PathBuf,
    options: FileOptions,
    properties: LayoutProperties,
    existed: bool,
}

impl PropertyFile {
    /// Opens `path`, loading it if it exists
    pub fn open(path: impl Into<PathBuf>, options: FileOptions) -> Result<Self> {
        let path = path.into();
        let mut properties = LayoutProperties::new();
        properties.set_remove_comments(options.remove_comments);

        let existed = path.exists();
        if existed {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open property file: {}", path.display()))?;

            // Acquire shared lock for reading
            file.lock_shared()
                .context("Failed to acquire read lock on property file")?;

            properties
                .load(BufReader::new(&file))
                .with_context(|| format!("Failed to read property file: {}", path.display()))?;
        }

        Ok(Self {
            path,
            options,
            properties,
            existed,
        })
    }

    /// Returns the path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the file existed when it was opened
    pub fn existed(&self) -> bool {
        self.existed
    }

    pub fn options(&self) -> &FileOptions {
        &self.options
    }

    pub fn properties(&self) -> &LayoutProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut LayoutProperties {
        &mut self.properties
    }

    /// Applies entries in order, stopping at the first failure
    pub fn apply(&mut self, entries: &[Entry]) -> Result<()> {
        for entry in entries {
            self.properties
                .apply(entry)
                .with_context(|| format!("Failed to apply entry for key '{}'", entry.key))?;
        }
        Ok(())
    }

    /// Writes the properties back atomically (temp file + rename)
    pub fn write(&self) -> Result<()> {
        let content = encode_latin1(&self.properties.render(self.options.header.as_deref()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let temp_path = temp_path_for(&self.path);

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            // Acquire exclusive lock
            file.lock_exclusive()
                .context("Failed to acquire write lock on property file")?;

            let mut writer = &file;
            if let Err(e) = writer.write_all(&content).and_then(|_| writer.flush()) {
                let _ = fs::remove_file(&temp_path);
                return Err(e).with_context(|| {
                    format!("Failed to write temp file: {}", temp_path.display())
                });
            }
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

/// Temp file next to `path`, e.g. `app.properties.tmp`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
