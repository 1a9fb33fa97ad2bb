//! Default configuration constants for audiobrief.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default transcription locale.
///
/// "en-US" matches the most common deployment; override via config or
/// `AUDIOBRIEF_LOCALE` for other languages.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Display name attached to submitted transcription jobs.
///
/// Shows up in the service's job listings, useful when several tools share
/// one subscription.
pub const DEFAULT_JOB_NAME: &str = "audiobrief transcription";

/// Punctuation mode requested from the transcription service.
///
/// "DictatedAndAutomatic" applies automatic punctuation plus any dictated
/// punctuation present in the audio.
pub const PUNCTUATION_MODE: &str = "DictatedAndAutomatic";

/// Profanity handling requested from the transcription service.
///
/// "Masked" replaces profanity with asterisks rather than dropping it,
/// which keeps sentence structure intact for summarization.
pub const PROFANITY_FILTER_MODE: &str = "Masked";

/// Whether to request word-level timestamps.
///
/// Disabled: timestamps inflate the result documents considerably and the
/// summarization stage only consumes display text.
pub const WORD_LEVEL_TIMESTAMPS: bool = false;

/// Default delay between job status polls, in seconds.
///
/// Batch transcription jobs take minutes; 5 seconds keeps latency low
/// without hammering the status endpoint.
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Default maximum number of status polls before giving up.
///
/// 60 attempts at the default interval bounds a run at five minutes of
/// polling. Raise this for long recordings.
pub const MAX_POLL_ATTEMPTS: u32 = 60;

/// Default delay between pipeline cycles in daemon mode, in seconds.
pub const RUN_INTERVAL_SECS: u64 = 300;

/// Default target summary length in words.
///
/// The length is a prompt instruction, not a hard limit; the model treats
/// it as guidance.
pub const SUMMARY_WORDS: u32 = 200;

/// Token cap for the summarization completion request.
///
/// 500 tokens comfortably covers a 200-word summary with headroom for
/// longer words and formatting.
pub const SUMMARY_MAX_TOKENS: u32 = 500;

/// Sampling temperature for the summarization request.
///
/// Low temperature keeps summaries factual and stable across runs.
pub const SUMMARY_TEMPERATURE: f32 = 0.3;
