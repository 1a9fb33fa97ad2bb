//! Batch speech transcription against the Azure Speech REST API.
//!
//! Jobs are submitted once, polled until terminal, and their result
//! documents reduced to plain transcript text.

pub mod client;
pub mod poller;
pub mod service;
pub mod transcript;
pub mod types;

pub use client::AzureSpeechClient;
pub use poller::{Clock, JobPoller, MockClock, PollPolicy, SystemClock};
pub use service::{MockSpeechService, SpeechService};
pub use transcript::{
    TRANSCRIPTION_KIND, Transcripts, extract_transcript, parse_result_document,
    transcription_files,
};
pub use types::{
    AudioInput, FileEntry, FileLinks, JobHandle, JobState, JobStatus, ResultFile, ResultLocator,
    TranscriptionOptions,
};
