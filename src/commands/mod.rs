//! Top-level commands

pub mod run;
