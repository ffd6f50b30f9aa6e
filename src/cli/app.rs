//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use super::edit::{self, EntryArgs, WriteArgs};
use super::output::{Output, OutputFormat};
use super::show;
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "propedit")]
#[command(author, version, about = "Edit .properties files without losing comments or layout")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the value of a key
    Get {
        /// Property file
        file: PathBuf,

        /// Key to look up
        key: String,
    },

    /// List keys and values in file order
    List {
        /// Property file
        file: PathBuf,
    },

    /// Show the logical lines of a file
    Lines {
        /// Property file
        file: PathBuf,
    },

    /// Set a key to a string value
    Set {
        /// Property file (created if missing)
        file: PathBuf,

        /// Key to set
        key: String,

        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Remove a key
    Del {
        /// Property file
        file: PathBuf,

        /// Key to remove
        key: String,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Apply a typed edit to a key
    ///
    /// Examples:
    ///   propedit edit build.properties build.number -t int -o + --value 1
    ///   propedit edit build.properties built.at -t date --value now
    ///   propedit edit app.properties expires -t date -o + --value 2 --unit month
    Edit {
        /// Property file (created if missing)
        file: PathBuf,

        /// Key to edit
        key: String,

        #[command(flatten)]
        entry: EntryArgs,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Apply the [[entry]] tables of a TOML file in order
    Apply {
        /// Property file (created if missing)
        file: PathBuf,

        /// TOML file with [[entry]] tables
        entries: PathBuf,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Write a default propedit.toml in the current directory
    InitConfig,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let format = cli
        .format
        .unwrap_or_else(|| config.global.default_format.into());
    let output = Output::new(format, cli.verbose);

    output.verbose("propedit starting");
    if let Some(root) = &config.project_root {
        output.verbose_ctx("config", &format!("Using project config in {}", root.display()));
    }

    match cli.command {
        Commands::Get { file, key } => {
            output.verbose_ctx("get", &format!("{} in {}", key, file.display()));
            show::get(&output, &file, &key)?
        }
        Commands::List { file } => show::list(&output, &file)?,
        Commands::Lines { file } => show::lines(&output, &file)?,

        Commands::Set { file, key, value, write } => {
            edit::set(&output, &config, &file, &key, &value, &write)?
        }
        Commands::Del { file, key, write } => edit::delete(&output, &config, &file, &key, &write)?,
        Commands::Edit { file, key, entry, write } => {
            edit::edit(&output, &config, &file, entry.into_entry(key), &write)?
        }
        Commands::Apply { file, entries, write } => {
            edit::apply(&output, &config, &file, &entries, &write)?
        }

        Commands::InitConfig => {
            let dir = std::env::current_dir().context("Failed to determine current directory")?;
            let path = Config::init_project(&dir)?;
            output.success(&format!("Created {}", path.display()));
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}
