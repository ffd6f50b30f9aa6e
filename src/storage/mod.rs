//! # Storage Layer
//!
//! Reading, editing and writing `.properties` files without losing their
//! layout.
//!
//! ## File Format
//!
//! | Element | Form |
//! |---------|------|
//! | Comment | first non-whitespace char is `#` or `!` |
//! | Pair | `key=value`, `key:value` or `key value` |
//! | Continuation | odd number of trailing backslashes |
//! | Encoding | Latin-1, other chars as `\uXXXX` |
//!
//! ## Concurrency Safety
//!
//! - Reads take a shared `fs2` lock, writes an exclusive one
//! - [`PropertyFile::write`] is atomic (temp file + rename)
//!
//! ## Key Types
//!
//! - [`LayoutProperties`] - Ordered, layout-preserving key/value store
//! - [`PropertyFile`] - Load/edit/write session for one file
//! - [`Config`] - Project and global configuration

mod config;
mod file;
mod header;
mod properties;
mod reader;

pub use config::{
    Config, ConfigError, EditConfig, GlobalConfig, OutputFormat, ProjectConfig, StoreConfig,
    PROJECT_CONFIG_FILE,
};
pub use file::{FileOptions, PropertyFile};
pub use header::{current_date_stamp, date_stamp, is_date_stamp};
pub use properties::{encode_latin1, LayoutProperties};
pub use reader::{decode_latin1, read_chunks, split_chunks, Chunk, LineEnding, ReadLines};
