//! Core type definitions for snapmill

mod entry;
mod error;

pub use entry::{EntryKind, SourceEntry};
pub use error::SnapmillError;
