//! propedit - Layout-preserving editing of `.properties` files
//!
//! Loading a file keeps every comment, blank line and key in order, so a
//! file that is loaded, edited and stored again differs from the original
//! only where it was edited (plus a refreshed date-stamp comment).

pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::{Entry, EntryType, LogicalLine, Operation, Pair};
pub use storage::{LayoutProperties, LineEnding, PropertyFile};
