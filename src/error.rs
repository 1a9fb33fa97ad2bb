//! Error types for audiobrief.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudiobriefError {
    // Configuration errors
    #[error("Missing required configuration: {}", .keys.join(", "))]
    ConfigMissing { keys: Vec<String> },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Transcription job errors
    #[error("Transcription job submission failed ({status}): {body}")]
    Submission { status: u16, body: String },

    #[error("Transcription job response did not include a location header")]
    MissingJobLocation,

    #[error("Transcription job failed: {message}")]
    JobFailed { message: String },

    #[error("Transient polling error: {message}")]
    TransientPoll { message: String },

    #[error("Transcription job still running after {attempts} poll attempts")]
    PollTimeout { attempts: u32 },

    #[error("Transcript extraction failed: {message}")]
    Extraction { message: String },

    // Summarization errors
    #[error("Summarization failed: {message}")]
    Summarization { message: String },

    // Shutdown
    #[error("Operation cancelled by shutdown signal")]
    Cancelled,

    // General transport and I/O errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, AudiobriefError>;
