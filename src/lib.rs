//! audiobrief - Batch audio transcription and summarization pipeline
//!
//! Submits audio to the Azure Speech batch API, waits for the job to
//! finish, and condenses the transcripts with an Azure OpenAI deployment.

// Library code propagates errors instead of panicking
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod cli;
pub mod config;
pub mod defaults;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod speech;
pub mod summarize;

// Pipeline
pub use pipeline::orchestrator::{Pipeline, PipelineConfig, RunReport};

// Service seams (real clients and their test doubles)
pub use speech::client::AzureSpeechClient;
pub use speech::poller::{Clock, JobPoller, MockClock, PollPolicy, SystemClock};
pub use speech::service::{MockSpeechService, SpeechService};
pub use speech::types::{AudioInput, JobHandle, JobState, JobStatus};
pub use summarize::client::{ChatSummarizer, MockSummarizer, SummaryOptions, Summarizer};

// Transcript handling
pub use speech::transcript::Transcripts;

// Error handling
pub use error::{AudiobriefError, Result};

// Config
pub use config::{Config, ValidatedConfig};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.2+abc1234"` when git hash is available, `"0.1.2"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        // In a git repo build, GIT_HASH is set → expect "0.1.2+<hash>"
        // In CI without git, expect the plain version
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
            let hash_part = ver.split('+').nth(1).unwrap_or("");
            assert_eq!(
                hash_part.len(),
                7,
                "Git hash should be 7 chars, got: {}",
                hash_part
            );
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
