//! Transcription service abstraction.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AudiobriefError, Result};
use crate::speech::types::{
    AudioInput, FileEntry, JobHandle, JobState, ResultFile, ResultLocator, TranscriptionOptions,
};

/// Trait for the remote batch transcription service.
///
/// This trait allows swapping implementations (real HTTP client vs mock).
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Submit audio for transcription, returning a handle to the new job.
    ///
    /// Not idempotent: every call creates a new billable job.
    async fn submit(
        &self,
        input: &AudioInput,
        options: &TranscriptionOptions,
    ) -> Result<JobHandle>;

    /// Fetch the current state of a job.
    async fn job_status(&self, handle: &JobHandle) -> Result<JobState>;

    /// List the result files of a finished job.
    async fn list_result_files(&self, locator: &ResultLocator) -> Result<Vec<FileEntry>>;

    /// Download one result document as raw JSON text.
    async fn fetch_result_document(&self, file: &ResultFile) -> Result<String>;
}

enum MockDocument {
    Body(String),
    Failure,
}

/// Mock transcription service for testing.
///
/// Status polls are scripted in order: each `job_status` call consumes the
/// next entry, mirroring how the real service moves a job through states.
pub struct MockSpeechService {
    job_url: String,
    submit_should_fail: bool,
    listing_should_fail: bool,
    statuses: Mutex<VecDeque<Result<JobState>>>,
    listing: Mutex<Vec<FileEntry>>,
    documents: Mutex<HashMap<String, MockDocument>>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    listing_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MockSpeechService {
    /// Create a new mock service with default settings
    pub fn new() -> Self {
        Self {
            job_url: "https://speech.example/speechtotext/v3.1/transcriptions/mock-job-1"
                .to_string(),
            submit_should_fail: false,
            listing_should_fail: false,
            statuses: Mutex::new(VecDeque::new()),
            listing: Mutex::new(Vec::new()),
            documents: Mutex::new(HashMap::new()),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            listing_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Configure the job URL returned from submit
    pub fn with_job_url(mut self, url: &str) -> Self {
        self.job_url = url.to_string();
        self
    }

    /// Configure the mock to fail on submit
    pub fn with_submit_failure(mut self) -> Self {
        self.submit_should_fail = true;
        self
    }

    /// Script the next status poll to report the given state
    pub fn with_status(self, state: JobState) -> Self {
        self.lock_statuses().push_back(Ok(state));
        self
    }

    /// Script the next status poll to fail transiently
    pub fn with_status_error(self, message: &str) -> Self {
        self.lock_statuses()
            .push_back(Err(AudiobriefError::TransientPoll {
                message: message.to_string(),
            }));
        self
    }

    /// Configure the files listing of the finished job
    pub fn with_listing(self, entries: Vec<FileEntry>) -> Self {
        *self.lock_listing() = entries;
        self
    }

    /// Configure the mock to fail when listing result files
    pub fn with_listing_failure(mut self) -> Self {
        self.listing_should_fail = true;
        self
    }

    /// Serve the given body for a result document URL
    pub fn with_document(self, content_url: &str, body: &str) -> Self {
        self.lock_documents()
            .insert(content_url.to_string(), MockDocument::Body(body.to_string()));
        self
    }

    /// Make fetching the given result document URL fail
    pub fn with_document_failure(self, content_url: &str) -> Self {
        self.lock_documents()
            .insert(content_url.to_string(), MockDocument::Failure);
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn lock_statuses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<JobState>>> {
        self.statuses.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_listing(&self) -> std::sync::MutexGuard<'_, Vec<FileEntry>> {
        self.listing.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_documents(&self) -> std::sync::MutexGuard<'_, HashMap<String, MockDocument>> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockSpeechService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechService for MockSpeechService {
    async fn submit(
        &self,
        _input: &AudioInput,
        _options: &TranscriptionOptions,
    ) -> Result<JobHandle> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if self.submit_should_fail {
            return Err(AudiobriefError::Submission {
                status: 500,
                body: "mock submission failure".to_string(),
            });
        }
        Ok(JobHandle::new(&self.job_url))
    }

    async fn job_status(&self, _handle: &JobHandle) -> Result<JobState> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.lock_statuses().pop_front() {
            Some(result) => result,
            None => Err(AudiobriefError::TransientPoll {
                message: "no scripted status left".to_string(),
            }),
        }
    }

    async fn list_result_files(&self, _locator: &ResultLocator) -> Result<Vec<FileEntry>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_should_fail {
            return Err(AudiobriefError::Extraction {
                message: "mock listing failure".to_string(),
            });
        }
        Ok(self.lock_listing().clone())
    }

    async fn fetch_result_document(&self, file: &ResultFile) -> Result<String> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        match self.lock_documents().get(&file.content_url) {
            Some(MockDocument::Body(body)) => Ok(body.clone()),
            Some(MockDocument::Failure) => Err(AudiobriefError::Extraction {
                message: format!("mock fetch failure for {}", file.name),
            }),
            None => Err(AudiobriefError::Extraction {
                message: format!("no mock document for {}", file.content_url),
            }),
        }
    }
}
