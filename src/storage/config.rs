//! Configuration handling for propedit
//!
//! Configuration is stored in `propedit.toml` (project, looked up from the
//! current directory upwards) and `~/.config/propedit/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DatePattern, EntryType, NumberPattern};

/// File name of the project configuration
pub const PROJECT_CONFIG_FILE: &str = "propedit.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// How property files are written back
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Remove the comment block in front of deleted keys
    pub remove_comments: bool,

    /// Header comment written at the top of every stored file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

/// Defaults for typed edits
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EditConfig {
    /// Pattern for date entries that do not name one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_pattern: Option<String>,

    /// Pattern for int entries that do not name one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub int_pattern: Option<String>,
}

impl EditConfig {
    /// Returns the configured pattern for entries of `kind`
    pub fn pattern_for(&self, kind: EntryType) -> Option<&str> {
        match kind {
            EntryType::String => None,
            EntryType::Int => self.int_pattern.as_deref(),
            EntryType::Date => self.date_pattern.as_deref(),
        }
    }

    /// Checks that the configured patterns are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(pattern) = &self.date_pattern {
            DatePattern::new(pattern)
                .map_err(|e| ConfigError::Invalid(format!("edit.date_pattern: {}", e)))?;
        }
        if let Some(pattern) = &self.int_pattern {
            NumberPattern::new(pattern)
                .map_err(|e| ConfigError::Invalid(format!("edit.int_pattern: {}", e)))?;
        }
        Ok(())
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Store settings
    pub store: StoreConfig,

    /// Edit settings
    pub edit: EditConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let (project, project_root) = Self::load_project()?;

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project directory
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "propedit", "propedit")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Finds and loads project configuration
    fn load_project() -> Result<(ProjectConfig, Option<PathBuf>)> {
        match Self::find_project_root() {
            Some(root) => {
                let config = Self::load_project_config(&root)?;
                Ok((config, Some(root)))
            }
            None => Ok((ProjectConfig::default(), None)),
        }
    }

    /// Loads project configuration from a specific directory
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(PROJECT_CONFIG_FILE);

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        parse_project_config(&content).context("Failed to parse project config")
    }

    /// Finds the nearest directory containing `propedit.toml`
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(PROJECT_CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Writes a default `propedit.toml` into `dir`
    ///
    /// Fails if the file already exists.
    pub fn init_project(dir: &Path) -> Result<PathBuf> {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!("{} already exists", config_path.display());
        }

        fs::write(&config_path, DEFAULT_PROJECT_CONFIG)
            .with_context(|| format!("Failed to write project config: {}", config_path.display()))?;

        Ok(config_path)
    }
}

/// Parses and validates a project config document
fn parse_project_config(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.edit.validate()?;
    Ok(config)
}

const DEFAULT_PROJECT_CONFIG: &str = r##"# propedit project configuration

[store]
# Remove the comments in front of deleted keys
remove_comments = false
# Header comment written at the top of stored files
# header = "Managed by propedit"

[edit]
# Pattern for date entries without one (letters as in yyyy/MM/dd HH:mm)
# date_pattern = "yyyy/MM/dd HH:mm"
# Pattern for int entries without one
# int_pattern = "#,##0"
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config::default();

        assert!(!config.project.store.remove_comments);
        assert_eq!(config.project.store.header, None);
        assert_eq!(config.global.default_format, OutputFormat::Text);
    }

    #[test]
    fn parse_project_config_sections() {
        let toml = r#"
[store]
remove_comments = true
header = "Managed by ops"

[edit]
date_pattern = "yyyy-MM-dd"
int_pattern = "000"
"#;

        let config = parse_project_config(toml).unwrap();
        assert!(config.store.remove_comments);
        assert_eq!(config.store.header.as_deref(), Some("Managed by ops"));
        assert_eq!(config.edit.pattern_for(EntryType::Date), Some("yyyy-MM-dd"));
        assert_eq!(config.edit.pattern_for(EntryType::Int), Some("000"));
        assert_eq!(config.edit.pattern_for(EntryType::String), None);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let toml = r#"
[edit]
int_pattern = "abc"
"#;

        let err = parse_project_config(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("edit.int_pattern"));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = parse_project_config("[store\nremove_comments = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn parse_global_config() {
        let toml = r#"
default_format = "json"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
    }

    #[test]
    fn default_template_parses() {
        let config = parse_project_config(DEFAULT_PROJECT_CONFIG).unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn init_project_writes_once() {
        let dir = TempDir::new().unwrap();

        let path = Config::init_project(dir.path()).unwrap();
        assert!(path.exists());
        assert!(Config::init_project(dir.path()).is_err());

        let config = Config::for_project(dir.path()).unwrap();
        assert_eq!(config.project, ProjectConfig::default());
    }

    #[test]
    fn find_project_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_CONFIG_FILE), "").unwrap();

        // Change to a subdirectory
        let sub_dir = dir.path().join("sub").join("dir");
        fs::create_dir_all(&sub_dir).unwrap();
        std::env::set_current_dir(&sub_dir).unwrap();

        let root = Config::find_project_root();
        // Canonicalize both paths to handle macOS /var -> /private/var symlinks
        let expected = dir.path().canonicalize().ok();
        let actual = root.and_then(|p| p.canonicalize().ok());
        assert_eq!(actual, expected);

        // Reset current dir to avoid affecting other tests
        std::env::set_current_dir(dir.path()).unwrap();
    }
}
