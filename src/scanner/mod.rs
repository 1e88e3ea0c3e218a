//! Source tree traversal

mod walker;

pub use walker::{walk_source, MAX_DEPTH};
