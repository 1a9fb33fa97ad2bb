//! Command-line interface for audiobrief
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
#[cfg(feature = "completions")]
use clap_complete::Shell;
use std::path::PathBuf;

/// Batch audio transcription and summarization
#[derive(Parser, Debug)]
#[command(
    name = "audiobrief",
    version,
    about = "Batch audio transcription and summarization"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace including HTTP internals)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// URL of a single audio file to transcribe
    #[arg(long, value_name = "URI", conflicts_with = "container_uri")]
    pub audio_uri: Option<String>,

    /// URL of a storage container holding audio files
    #[arg(long, value_name = "URI")]
    pub container_uri: Option<String>,

    /// Transcription locale (default: en-US). Examples: en-US, de-DE, ja-JP
    #[arg(long, value_name = "LOCALE")]
    pub locale: Option<String>,

    /// Delay between job status polls (default: 5s). Examples: 5, 10s, 1m
    #[arg(long, value_name = "DURATION", value_parser = parse_secs)]
    pub poll_interval: Option<u64>,

    /// Maximum number of status polls before giving up (default: 60)
    #[arg(long, value_name = "N")]
    pub max_poll_attempts: Option<u32>,
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`, `2m30s`).
fn parse_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit the audio, wait for the transcript, and print its summary
    Run,

    /// Run the pipeline repeatedly (foreground process for systemd)
    Daemon {
        /// Delay between pipeline cycles (default: 5m). Examples: 300, 10m, 1h
        #[arg(long, value_name = "DURATION", value_parser = parse_secs)]
        interval: Option<u64>,
    },

    /// Check configuration for missing or suspicious values
    Check,

    /// Generate shell completions
    #[cfg(feature = "completions")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
