//! Bounded polling of submitted transcription jobs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::defaults;
use crate::error::{AudiobriefError, Result};
use crate::speech::service::SpeechService;
use crate::speech::types::{JobHandle, JobStatus, ResultLocator};

/// Sleep abstraction so tests can drive the poll loop without real delays.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer.
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Mock clock that records requested sleeps and returns immediately.
pub struct MockClock {
    slept: Mutex<Vec<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            slept: Mutex::new(Vec::new()),
        }
    }

    /// Number of sleeps requested so far.
    pub fn sleep_count(&self) -> usize {
        self.lock_slept().len()
    }

    /// Sum of all requested sleep durations.
    pub fn total_slept(&self) -> Duration {
        self.lock_slept().iter().sum()
    }

    fn lock_slept(&self) -> std::sync::MutexGuard<'_, Vec<Duration>> {
        self.slept.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for MockClock {
    async fn sleep(&self, duration: Duration) {
        self.lock_slept().push(duration);
    }
}

/// How often and how long to poll before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(defaults::POLL_INTERVAL_SECS),
            max_attempts: defaults::MAX_POLL_ATTEMPTS,
        }
    }
}

/// Watches one submitted job until it finishes, fails, or the attempt
/// budget runs out.
///
/// Transient status errors and unrecognized states are logged and retried;
/// both consume attempts, so a job stuck in a state this build has never
/// heard of still terminates within the budget.
pub struct JobPoller {
    service: Arc<dyn SpeechService>,
    policy: PollPolicy,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl JobPoller {
    pub fn new(service: Arc<dyn SpeechService>, policy: PollPolicy) -> Self {
        Self {
            service,
            policy,
            clock: Arc::new(SystemClock),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the timer, used by tests to avoid real delays.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Abort between attempts (with a `Cancelled` error) once the token fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Poll until the job reaches a terminal state.
    ///
    /// Consumes the handle: one submission gets exactly one poll loop.
    pub async fn poll(&self, handle: JobHandle) -> Result<ResultLocator> {
        for attempt in 1..=self.policy.max_attempts {
            match self.service.job_status(&handle).await {
                Ok(state) => match state.status {
                    JobStatus::Succeeded => {
                        info!(
                            "Transcription job {} succeeded after {} status check(s)",
                            handle.id(),
                            attempt
                        );
                        let files_url = state.files_url.unwrap_or_else(|| {
                            format!("{}/files", handle.url().trim_end_matches('/'))
                        });
                        return Ok(ResultLocator { files_url });
                    }
                    JobStatus::Failed => {
                        let message = state
                            .error_message
                            .unwrap_or_else(|| "Unknown error".to_string());
                        return Err(AudiobriefError::JobFailed { message });
                    }
                    JobStatus::NotStarted | JobStatus::Running => {
                        debug!(
                            "Transcription job {} not finished (attempt {}/{})",
                            handle.id(),
                            attempt,
                            self.policy.max_attempts
                        );
                    }
                    JobStatus::Unknown(raw) => {
                        warn!(
                            "Transcription job {} reported unrecognized status {:?} (attempt {}/{})",
                            handle.id(),
                            raw,
                            attempt,
                            self.policy.max_attempts
                        );
                    }
                },
                Err(e) => {
                    warn!(
                        "Status check for job {} failed (attempt {}/{}): {}",
                        handle.id(),
                        attempt,
                        self.policy.max_attempts,
                        e
                    );
                }
            }

            self.wait_between_attempts().await?;
        }

        Err(AudiobriefError::PollTimeout {
            attempts: self.policy.max_attempts,
        })
    }

    async fn wait_between_attempts(&self) -> Result<()> {
        // Biased so a pending cancellation always wins over the timer.
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AudiobriefError::Cancelled),
            _ = self.clock.sleep(self.policy.poll_interval) => Ok(()),
        }
    }
}
