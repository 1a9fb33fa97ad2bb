//! Types shared across the transcription workflow.

use serde::Deserialize;

use crate::defaults;

/// Audio to transcribe: one file or a whole storage container.
///
/// Both variants carry a signed URL the transcription service can read
/// directly; the tool itself never downloads the audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioInput {
    /// A single audio file.
    Url(String),
    /// A storage container; the service transcribes every blob inside.
    Container(String),
}

impl AudioInput {
    pub fn uri(&self) -> &str {
        match self {
            AudioInput::Url(uri) | AudioInput::Container(uri) => uri,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, AudioInput::Container(_))
    }

    /// URI with any query string removed.
    ///
    /// Signed URLs carry their access token in the query string, so log
    /// lines must never include it.
    pub fn redacted(&self) -> &str {
        let uri = self.uri();
        match uri.split_once('?') {
            Some((base, _)) => base,
            None => uri,
        }
    }
}

impl std::fmt::Display for AudioInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioInput::Url(_) => write!(f, "audio file {}", self.redacted()),
            AudioInput::Container(_) => write!(f, "container {}", self.redacted()),
        }
    }
}

/// Settings attached to a transcription job at submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOptions {
    pub display_name: String,
    pub locale: String,
    pub punctuation_mode: String,
    pub profanity_filter_mode: String,
    pub word_level_timestamps: bool,
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            display_name: defaults::DEFAULT_JOB_NAME.to_string(),
            locale: defaults::DEFAULT_LOCALE.to_string(),
            punctuation_mode: defaults::PUNCTUATION_MODE.to_string(),
            profanity_filter_mode: defaults::PROFANITY_FILTER_MODE.to_string(),
            word_level_timestamps: defaults::WORD_LEVEL_TIMESTAMPS,
        }
    }
}

/// Lifecycle states reported by the transcription service.
///
/// Services add states over time; anything unrecognized lands in `Unknown`
/// with the raw value preserved so the poller can log it and keep waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Unknown(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl From<&str> for JobStatus {
    fn from(value: &str) -> Self {
        match value {
            "NotStarted" => JobStatus::NotStarted,
            "Running" => JobStatus::Running,
            "Succeeded" => JobStatus::Succeeded,
            "Failed" => JobStatus::Failed,
            other => JobStatus::Unknown(other.to_string()),
        }
    }
}

/// Reference to a submitted job, identified by the status URL the service
/// returned. Deliberately not `Clone`: one submission, one poll loop.
#[derive(Debug, PartialEq, Eq)]
pub struct JobHandle {
    url: String,
}

impl JobHandle {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Trailing path segment of the job URL, compact enough for log lines.
    pub fn id(&self) -> &str {
        let trimmed = self.url.trim_end_matches('/');
        match trimmed.rsplit_once('/') {
            Some((_, id)) if !id.is_empty() => id,
            _ => trimmed,
        }
    }
}

/// One snapshot of a job as reported by a status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    pub status: JobStatus,
    /// Listing URL for result files, present once the job succeeds.
    pub files_url: Option<String>,
    /// Failure detail, present when the job reports `Failed`.
    pub error_message: Option<String>,
}

impl JobState {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            files_url: None,
            error_message: None,
        }
    }

    pub fn with_files_url(mut self, url: &str) -> Self {
        self.files_url = Some(url.to_string());
        self
    }

    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = Some(message.to_string());
        self
    }
}

/// Where to find the result files of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLocator {
    pub files_url: String,
}

/// One entry in a finished job's files listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub links: Option<FileLinks>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLinks {
    #[serde(default)]
    pub content_url: Option<String>,
}

/// A transcription artifact ready to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFile {
    pub name: String,
    pub content_url: String,
}

// Wire format of a status poll response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TranscriptionStatusBody {
    pub status: String,
    #[serde(default)]
    pub links: Option<StatusLinks>,
    #[serde(default)]
    pub properties: Option<StatusProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusLinks {
    #[serde(default)]
    pub files: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusProperties {
    #[serde(default)]
    pub error: Option<StatusError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusError {
    #[serde(default)]
    pub message: Option<String>,
}

// Wire format of a files listing response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileListBody {
    #[serde(default)]
    pub values: Vec<FileEntry>,
}
