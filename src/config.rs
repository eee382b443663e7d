//! Command line + environment configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::core::{ChiptuneTagProvider, GeneralTagProvider};

/// Environment variable for the log filter (same syntax as RUST_LOG).
pub const LOG_ENV: &str = "SONORA_TAGREADER_LOG";

/// Out-of-process tag reader/writer for the Sonora host.
///
/// Speaks newline-delimited JSON: one request per line in, one reply per
/// line out. Exits as soon as the host closes the channel.
#[derive(Debug, Parser)]
#[command(name = "sonora-tagreader", version, about)]
pub struct Cli {
    /// Connect to a Unix socket instead of using stdin/stdout.
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// ID3v2 version used when writing tags.
    #[arg(long, value_enum, default_value_t = Id3Version::V24)]
    pub id3_version: Id3Version,

    /// Log filter (e.g. "info", "sonora_tagreader=debug"). Logs go to stderr.
    #[arg(long, env = LOG_ENV, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Id3Version {
    #[value(name = "2.3")]
    V23,
    #[value(name = "2.4")]
    V24,
}

impl From<Id3Version> for id3::Version {
    fn from(v: Id3Version) -> Self {
        match v {
            Id3Version::V23 => id3::Version::Id3v23,
            Id3Version::V24 => id3::Version::Id3v24,
        }
    }
}

/// Where the channel lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    UnixSocket(PathBuf),
}

/// Resolved settings for one worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub transport: Transport,
    pub id3_version: Id3Version,
    pub log_filter: String,
}

impl From<Cli> for WorkerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            transport: match cli.socket {
                Some(path) => Transport::UnixSocket(path),
                None => Transport::Stdio,
            },
            id3_version: cli.id3_version,
            log_filter: cli.log_level,
        }
    }
}

impl WorkerConfig {
    /// This process's own (primary, fallback) provider pair.
    pub fn providers(&self) -> (GeneralTagProvider, ChiptuneTagProvider) {
        (
            GeneralTagProvider::new(self.id3_version.into()),
            ChiptuneTagProvider::new(),
        )
    }
}
