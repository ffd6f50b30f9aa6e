//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Read | Inspect a file | `get`, `list`, `lines` |
//! | Write | Change a file in place | `set`, `del`, `edit`, `apply` |
//! | Setup | Project configuration | `init-config` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! propedit --verbose set app.properties db.url jdbc:h2:mem
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod edit;
mod output;
mod show;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
