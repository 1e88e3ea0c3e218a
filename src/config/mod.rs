//! Configuration management

use crate::snapshot::IN_PROGRESS_SUFFIX;
use crate::types::SnapmillError;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Command-line interface for snapmill
#[derive(Parser, Debug)]
#[command(
    name = "snapmill",
    version,
    about = "Rotating hardlink snapshots - unchanged files cost an inode, not a copy"
)]
pub struct Cli {
    /// Source directory to snapshot
    pub source: PathBuf,

    /// Destination root where snapshots are stored
    pub destination: PathBuf,

    /// Diff against this snapshot instead of resolving the latest marker
    #[arg(long, value_name = "DIR")]
    pub previous: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Global configuration for one snapshot run
#[derive(Debug, Clone)]
pub struct Config {
    /// Source directory
    pub source: PathBuf,

    /// Destination root (holds timestamped snapshots and the latest marker)
    pub destination: PathBuf,

    /// Explicit previous snapshot; overrides latest-marker resolution
    pub previous: Option<PathBuf>,

    /// Log verbosity level (0 = info, 1 = debug, 2+ = trace)
    pub verbose: u8,

    /// Only log errors
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            previous: None,
            verbose: 0,
            quiet: false,
        }
    }
}

impl TryFrom<Cli> for Config {
    type Error = SnapmillError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let config = Self {
            source: cli.source,
            destination: cli.destination,
            previous: cli.previous,
            verbose: cli.verbose,
            quiet: cli.quiet,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), SnapmillError> {
        if !self.source.is_dir() {
            return Err(SnapmillError::Config(format!(
                "Source path is not a directory: {:?}",
                self.source
            )));
        }

        if self.source == self.destination {
            return Err(SnapmillError::Config(
                "Source and destination cannot be the same".to_string(),
            ));
        }

        if let Some(previous) = &self.previous {
            if !previous.is_dir() {
                return Err(SnapmillError::Config(format!(
                    "Previous snapshot is not a directory: {:?}",
                    previous
                )));
            }
            let name = previous.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.ends_with(IN_PROGRESS_SUFFIX) {
                return Err(SnapmillError::Config(format!(
                    "Previous snapshot {:?} is an unfinished in-progress directory",
                    previous
                )));
            }
        }

        Ok(())
    }
}
