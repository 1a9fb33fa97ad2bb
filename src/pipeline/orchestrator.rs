//! Pipeline that runs a transcription job from submission to summary.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::defaults;
use crate::error::{AudiobriefError, Result};
use crate::speech::poller::{Clock, JobPoller, PollPolicy, SystemClock};
use crate::speech::service::SpeechService;
use crate::speech::transcript::{
    Transcripts, extract_transcript, parse_result_document, transcription_files,
};
use crate::speech::types::{AudioInput, ResultFile, ResultLocator, TranscriptionOptions};
use crate::summarize::Summarizer;

/// Configuration for pipeline runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Audio to transcribe
    pub input: AudioInput,
    /// Job submission settings
    pub options: TranscriptionOptions,
    /// Poll cadence and attempt budget
    pub poll: PollPolicy,
    /// Pause between cycles when running continuously
    pub run_interval: Duration,
}

impl PipelineConfig {
    pub fn new(input: AudioInput) -> Self {
        Self {
            input,
            options: TranscriptionOptions::default(),
            poll: PollPolicy::default(),
            run_interval: Duration::from_secs(defaults::RUN_INTERVAL_SECS),
        }
    }
}

/// Outcome of one complete pipeline cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub transcripts: Transcripts,
    pub summary: String,
}

/// Transcription pipeline: submit → poll → extract → summarize.
pub struct Pipeline {
    config: PipelineConfig,
    speech: Arc<dyn SpeechService>,
    summarizer: Arc<dyn Summarizer>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Creates a new pipeline over the given service clients.
    pub fn new(
        config: PipelineConfig,
        speech: Arc<dyn SpeechService>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            config,
            speech,
            summarizer,
            clock: Arc::new(SystemClock),
            cancel: CancellationToken::new(),
        }
    }

    /// Sets a custom clock (for deterministic testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the token that stops waits and the continuous loop.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs one full cycle and returns the transcripts with their summary.
    pub async fn run_once(&self) -> Result<RunReport> {
        info!("Submitting transcription job for {}", self.config.input);
        let handle = self
            .speech
            .submit(&self.config.input, &self.config.options)
            .await?;
        info!("Transcription job {} accepted", handle.id());

        let poller = JobPoller::new(Arc::clone(&self.speech), self.config.poll)
            .with_clock(Arc::clone(&self.clock))
            .with_cancellation(self.cancel.clone());
        let locator = poller.poll(handle).await?;

        let transcripts = self.collect_transcripts(&locator).await?;
        let summary = self
            .summarizer
            .summarize(&transcripts.combined_text())
            .await?;

        Ok(RunReport {
            transcripts,
            summary,
        })
    }

    /// Runs cycles until cancelled, pausing `run_interval` between them.
    ///
    /// A failed cycle is logged and the loop moves on; only cancellation
    /// ends it.
    pub async fn run_forever(&self) -> Result<()> {
        loop {
            if self.cancel.is_cancelled() {
                info!("Shutdown requested, stopping pipeline loop");
                return Ok(());
            }

            match self.run_once().await {
                Ok(report) => info!(
                    "Pipeline cycle complete: {} transcript(s), summary of {} chars",
                    report.transcripts.len(),
                    report.summary.chars().count()
                ),
                Err(AudiobriefError::Cancelled) => {
                    info!("Shutdown requested, stopping pipeline loop");
                    return Ok(());
                }
                Err(e) => error!("Pipeline cycle failed: {}", e),
            }

            // Biased so a pending cancellation always wins over the timer.
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                _ = self.clock.sleep(self.config.run_interval) => {}
            }
        }
    }

    async fn collect_transcripts(&self, locator: &ResultLocator) -> Result<Transcripts> {
        let entries = self.speech.list_result_files(locator).await?;
        let files = transcription_files(&entries);

        if self.config.input.is_container() {
            // Container jobs produce one result file per blob. A broken
            // file loses that blob's transcript, not the whole batch.
            let mut by_name = BTreeMap::new();
            for file in &files {
                match self.fetch_transcript(file).await {
                    Ok(text) => {
                        by_name.insert(file.name.clone(), text);
                    }
                    Err(e) => warn!("Skipping result file {}: {}", file.name, e),
                }
            }
            Ok(Transcripts::PerResource(by_name))
        } else {
            let file = files.first().ok_or_else(|| AudiobriefError::Extraction {
                message: "files listing contained no transcription artifact".to_string(),
            })?;
            let text = self.fetch_transcript(file).await?;
            Ok(Transcripts::Single(text))
        }
    }

    async fn fetch_transcript(&self, file: &ResultFile) -> Result<String> {
        let raw = self.speech.fetch_result_document(file).await?;
        let document = parse_result_document(&raw)?;
        extract_transcript(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::poller::MockClock;
    use crate::speech::service::MockSpeechService;
    use crate::speech::types::{FileEntry, FileLinks, JobState, JobStatus};
    use crate::summarize::MockSummarizer;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FILES_URL: &str = "https://speech.example/transcriptions/mock-job-1/files";

    fn transcription_entry(name: &str, content_url: &str) -> FileEntry {
        FileEntry {
            kind: "Transcription".to_string(),
            name: name.to_string(),
            links: Some(FileLinks {
                content_url: Some(content_url.to_string()),
            }),
        }
    }

    fn result_document(sentences: &[&str]) -> String {
        let phrases: Vec<serde_json::Value> = sentences
            .iter()
            .map(|s| serde_json::json!({"nBest": [{"display": s}]}))
            .collect();
        serde_json::json!({ "recognizedPhrases": phrases }).to_string()
    }

    fn single_file_service() -> MockSpeechService {
        MockSpeechService::new()
            .with_status(JobState::new(JobStatus::Succeeded).with_files_url(FILES_URL))
            .with_listing(vec![transcription_entry(
                "audio.wav.json",
                "https://storage.example/results/audio.wav.json",
            )])
            .with_document(
                "https://storage.example/results/audio.wav.json",
                &result_document(&["Hello.", "World."]),
            )
    }

    fn single_config() -> PipelineConfig {
        PipelineConfig::new(AudioInput::Url(
            "https://storage.example/audio.wav?sig=test".to_string(),
        ))
    }

    fn container_config() -> PipelineConfig {
        PipelineConfig::new(AudioInput::Container(
            "https://storage.example/recordings?sig=test".to_string(),
        ))
    }

    fn pipeline(
        config: PipelineConfig,
        speech: Arc<MockSpeechService>,
        summarizer: Arc<MockSummarizer>,
    ) -> Pipeline {
        Pipeline::new(config, speech, summarizer).with_clock(Arc::new(MockClock::new()))
    }

    #[test]
    fn test_config_defaults() {
        let config = single_config();
        assert_eq!(config.options.locale, "en-US");
        assert_eq!(config.poll, PollPolicy::default());
        assert_eq!(config.run_interval, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_single_file_cycle_produces_report() {
        let speech = Arc::new(single_file_service());
        let summarizer = Arc::new(MockSummarizer::new().with_summary("A greeting."));
        let pipeline = pipeline(single_config(), speech.clone(), summarizer.clone());

        let report = pipeline.run_once().await.unwrap();

        assert_eq!(
            report.transcripts,
            Transcripts::Single("Hello. World.".to_string())
        );
        assert_eq!(report.summary, "A greeting.");
        assert_eq!(summarizer.calls(), vec!["Hello. World.".to_string()]);
        assert_eq!(speech.submit_calls(), 1);
        assert_eq!(speech.listing_calls(), 1);
        assert_eq!(speech.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_container_cycle_merges_transcripts_by_name() {
        let speech = Arc::new(
            MockSpeechService::new()
                .with_status(JobState::new(JobStatus::Succeeded).with_files_url(FILES_URL))
                .with_listing(vec![
                    transcription_entry("b.wav.json", "https://storage.example/results/b"),
                    transcription_entry("a.wav.json", "https://storage.example/results/a"),
                ])
                .with_document(
                    "https://storage.example/results/a",
                    &result_document(&["First call."]),
                )
                .with_document(
                    "https://storage.example/results/b",
                    &result_document(&["Second call."]),
                ),
        );
        let summarizer = Arc::new(MockSummarizer::new());
        let pipeline = pipeline(container_config(), speech, summarizer.clone());

        let report = pipeline.run_once().await.unwrap();

        let mut expected = BTreeMap::new();
        expected.insert("a.wav.json".to_string(), "First call.".to_string());
        expected.insert("b.wav.json".to_string(), "Second call.".to_string());
        assert_eq!(report.transcripts, Transcripts::PerResource(expected));

        // Combined text is ordered by file name regardless of listing order
        assert_eq!(
            summarizer.calls(),
            vec!["\na.wav.json: First call.\nb.wav.json: Second call.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_container_cycle_skips_broken_result_files() {
        let speech = Arc::new(
            MockSpeechService::new()
                .with_status(JobState::new(JobStatus::Succeeded).with_files_url(FILES_URL))
                .with_listing(vec![
                    transcription_entry("good.json", "https://storage.example/results/good"),
                    transcription_entry("bad.json", "https://storage.example/results/bad"),
                ])
                .with_document(
                    "https://storage.example/results/good",
                    &result_document(&["Survives."]),
                )
                .with_document_failure("https://storage.example/results/bad"),
        );
        let pipeline = pipeline(container_config(), speech, Arc::new(MockSummarizer::new()));

        let report = pipeline.run_once().await.unwrap();

        let mut expected = BTreeMap::new();
        expected.insert("good.json".to_string(), "Survives.".to_string());
        assert_eq!(report.transcripts, Transcripts::PerResource(expected));
    }

    #[tokio::test]
    async fn test_single_cycle_fails_on_broken_result_file() {
        let speech = Arc::new(
            MockSpeechService::new()
                .with_status(JobState::new(JobStatus::Succeeded).with_files_url(FILES_URL))
                .with_listing(vec![transcription_entry(
                    "audio.wav.json",
                    "https://storage.example/results/audio.wav.json",
                )])
                .with_document_failure("https://storage.example/results/audio.wav.json"),
        );
        let summarizer = Arc::new(MockSummarizer::new());
        let pipeline = pipeline(single_config(), speech, summarizer.clone());

        let result = pipeline.run_once().await;

        assert!(matches!(result, Err(AudiobriefError::Extraction { .. })));
        assert_eq!(summarizer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_cycle_fails_without_transcription_artifact() {
        let speech = Arc::new(
            MockSpeechService::new()
                .with_status(JobState::new(JobStatus::Succeeded).with_files_url(FILES_URL))
                .with_listing(vec![FileEntry {
                    kind: "TranscriptionReport".to_string(),
                    name: "report.json".to_string(),
                    links: Some(FileLinks {
                        content_url: Some("https://storage.example/results/report".to_string()),
                    }),
                }]),
        );
        let pipeline = pipeline(single_config(), speech, Arc::new(MockSummarizer::new()));

        match pipeline.run_once().await {
            Err(AudiobriefError::Extraction { message }) => {
                assert!(message.contains("no transcription artifact"));
            }
            other => panic!("expected Extraction error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_container_yields_empty_report() {
        let speech = Arc::new(
            MockSpeechService::new()
                .with_status(JobState::new(JobStatus::Succeeded).with_files_url(FILES_URL)),
        );
        let summarizer = Arc::new(MockSummarizer::new());
        let pipeline = pipeline(container_config(), speech, summarizer.clone());

        let report = pipeline.run_once().await.unwrap();

        assert!(report.transcripts.is_empty());
        assert_eq!(report.summary, "");
        // Empty combined text never reaches the summarizer
        assert_eq!(summarizer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_submission_failure_aborts_cycle() {
        let speech = Arc::new(MockSpeechService::new().with_submit_failure());
        let summarizer = Arc::new(MockSummarizer::new());
        let pipeline = pipeline(single_config(), speech.clone(), summarizer.clone());

        let result = pipeline.run_once().await;

        assert!(matches!(
            result,
            Err(AudiobriefError::Submission { status: 500, .. })
        ));
        assert_eq!(speech.status_calls(), 0);
        assert_eq!(summarizer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_job_failure_aborts_cycle() {
        let speech = Arc::new(MockSpeechService::new().with_status(
            JobState::new(JobStatus::Failed).with_error_message("Audio format not supported"),
        ));
        let pipeline = pipeline(single_config(), speech.clone(), Arc::new(MockSummarizer::new()));

        match pipeline.run_once().await {
            Err(AudiobriefError::JobFailed { message }) => {
                assert_eq!(message, "Audio format not supported");
            }
            other => panic!("expected JobFailed, got {:?}", other),
        }
        assert_eq!(speech.listing_calls(), 0);
    }

    #[tokio::test]
    async fn test_run_forever_returns_when_already_cancelled() {
        let speech = Arc::new(single_file_service());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let pipeline = pipeline(single_config(), speech.clone(), Arc::new(MockSummarizer::new()))
            .with_cancellation(cancel);

        pipeline.run_forever().await.unwrap();
        assert_eq!(speech.submit_calls(), 0);
    }

    // Clock that fires the cancellation token during the nth sleep, so the
    // continuous loop can be stopped after a known number of cycles.
    struct CancellingClock {
        cancel: CancellationToken,
        sleeps: AtomicUsize,
        cancel_on: usize,
    }

    #[async_trait]
    impl Clock for CancellingClock {
        async fn sleep(&self, _duration: Duration) {
            let n = self.sleeps.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.cancel_on {
                self.cancel.cancel();
            }
        }
    }

    #[tokio::test]
    async fn test_run_forever_survives_failed_cycles() {
        let speech = Arc::new(MockSpeechService::new().with_submit_failure());
        let cancel = CancellationToken::new();
        let clock = Arc::new(CancellingClock {
            cancel: cancel.clone(),
            sleeps: AtomicUsize::new(0),
            cancel_on: 2,
        });

        let pipeline =
            Pipeline::new(single_config(), speech.clone(), Arc::new(MockSummarizer::new()))
                .with_clock(clock)
                .with_cancellation(cancel);

        pipeline.run_forever().await.unwrap();

        // Two failed cycles ran before the token stopped the loop
        assert_eq!(speech.submit_calls(), 2);
    }

    #[tokio::test]
    async fn test_run_forever_stops_when_poll_wait_is_cancelled() {
        // Job never finishes; the token fires during the first poll wait.
        // The cancellation is observed at the wait after the next status
        // check, so exactly two checks happen before the loop ends.
        let speech = Arc::new(
            MockSpeechService::new()
                .with_status(JobState::new(JobStatus::Running))
                .with_status(JobState::new(JobStatus::Running)),
        );
        let cancel = CancellationToken::new();
        let clock = Arc::new(CancellingClock {
            cancel: cancel.clone(),
            sleeps: AtomicUsize::new(0),
            cancel_on: 1,
        });

        let pipeline =
            Pipeline::new(single_config(), speech.clone(), Arc::new(MockSummarizer::new()))
                .with_clock(clock)
                .with_cancellation(cancel);

        pipeline.run_forever().await.unwrap();

        assert_eq!(speech.submit_calls(), 1);
        assert_eq!(speech.status_calls(), 2);
    }
}
