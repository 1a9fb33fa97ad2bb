// tests/pipeline_end_to_end.rs
//! End-to-end pipeline tests over the public mock services.
//!
//! Each test drives the full submit → poll → extract → summarize chain
//! through the same seams the binary wires up, with a mock clock so wait
//! pacing can be asserted instead of slept through.

use std::sync::Arc;
use std::time::Duration;

use audiobrief::speech::types::{FileEntry, FileLinks};
use audiobrief::{
    AudioInput, AudiobriefError, JobState, JobStatus, MockClock, MockSpeechService,
    MockSummarizer, Pipeline, PipelineConfig, PollPolicy, Transcripts,
};

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

fn report_entry(name: &str) -> FileEntry {
    FileEntry {
        kind: "TranscriptionReport".to_string(),
        name: name.to_string(),
        links: Some(FileLinks {
            content_url: Some("https://storage.example/results/report".to_string()),
        }),
    }
}

fn single_config() -> PipelineConfig {
    PipelineConfig::new(AudioInput::Url(
        "https://storage.example/meeting.wav?sig=secret".to_string(),
    ))
}

fn container_config() -> PipelineConfig {
    PipelineConfig::new(AudioInput::Container(
        "https://storage.example/recordings?sig=secret".to_string(),
    ))
}

#[tokio::test]
async fn single_audio_file_run_produces_summary() {
    // Result document shaped like a real batch transcription artifact,
    // including alternatives that must be ignored.
    let document = r#"{
        "source": "https://storage.example/meeting.wav",
        "timestamp": "2024-03-01T10:00:00Z",
        "recognizedPhrases": [
            {
                "recognitionStatus": "Success",
                "channel": 0,
                "offset": "PT0S",
                "nBest": [
                    {"confidence": 0.97, "lexical": "hello everyone", "display": "Hello everyone."},
                    {"confidence": 0.41, "lexical": "hollow everyone", "display": "Hollow everyone."}
                ]
            },
            {
                "recognitionStatus": "Success",
                "channel": 0,
                "offset": "PT2S",
                "nBest": [
                    {"confidence": 0.93, "lexical": "let us begin", "display": "Let us begin."}
                ]
            }
        ]
    }"#;

    let speech = Arc::new(
        MockSpeechService::new()
            .with_status(JobState::new(JobStatus::NotStarted))
            .with_status(JobState::new(JobStatus::Running))
            .with_status(JobState::new(JobStatus::Succeeded).with_files_url(FILES_URL))
            .with_listing(vec![
                report_entry("report.json"),
                transcription_entry(
                    "meeting.wav.json",
                    "https://storage.example/results/meeting",
                ),
            ])
            .with_document("https://storage.example/results/meeting", document),
    );
    let summarizer = Arc::new(MockSummarizer::new().with_summary("The team met and began."));
    let clock = Arc::new(MockClock::new());

    let mut config = single_config();
    config.poll = PollPolicy {
        poll_interval: Duration::from_secs(5),
        max_attempts: 60,
    };
    let pipeline =
        Pipeline::new(config, speech.clone(), summarizer.clone()).with_clock(clock.clone());

    let report = pipeline.run_once().await.unwrap();

    // Top candidate of each phrase, joined with single spaces
    assert_eq!(
        report.transcripts,
        Transcripts::Single("Hello everyone. Let us begin.".to_string())
    );
    assert_eq!(report.summary, "The team met and began.");
    assert_eq!(
        summarizer.calls(),
        vec!["Hello everyone. Let us begin.".to_string()]
    );

    // One status check per scripted state, one pause after each
    // non-terminal state, none after success
    assert_eq!(speech.status_calls(), 3);
    assert_eq!(clock.sleep_count(), 2);
    assert_eq!(clock.total_slept(), Duration::from_secs(10));
}

#[tokio::test]
async fn container_run_merges_every_audio_file() {
    let doc_a = r#"{"recognizedPhrases": [{"nBest": [{"display": "Morning standup notes."}]}]}"#;
    let doc_z = r#"{"recognizedPhrases": [{"nBest": [{"display": "Evening retro notes."}]}]}"#;

    let speech = Arc::new(
        MockSpeechService::new()
            .with_status(JobState::new(JobStatus::Succeeded).with_files_url(FILES_URL))
            .with_listing(vec![
                transcription_entry("z-retro.wav.json", "https://storage.example/results/z"),
                report_entry("report.json"),
                transcription_entry("a-standup.wav.json", "https://storage.example/results/a"),
            ])
            .with_document("https://storage.example/results/a", doc_a)
            .with_document("https://storage.example/results/z", doc_z),
    );
    let summarizer = Arc::new(MockSummarizer::new().with_summary("Two meetings happened."));

    let pipeline = Pipeline::new(container_config(), speech.clone(), summarizer.clone())
        .with_clock(Arc::new(MockClock::new()));

    let report = pipeline.run_once().await.unwrap();

    match &report.transcripts {
        Transcripts::PerResource(by_name) => {
            assert_eq!(by_name.len(), 2);
            assert_eq!(
                by_name.get("a-standup.wav.json").map(String::as_str),
                Some("Morning standup notes.")
            );
            assert_eq!(
                by_name.get("z-retro.wav.json").map(String::as_str),
                Some("Evening retro notes.")
            );
        }
        other => panic!("expected per-resource transcripts, got {:?}", other),
    }

    // Combined text is one labelled line per file, ordered by file name
    assert_eq!(
        summarizer.calls(),
        vec![
            "\na-standup.wav.json: Morning standup notes.\nz-retro.wav.json: Evening retro notes."
                .to_string()
        ]
    );
    assert_eq!(report.summary, "Two meetings happened.");

    // The report artifact is never downloaded
    assert_eq!(speech.fetch_calls(), 2);
}

#[tokio::test]
async fn stalled_job_times_out_with_bounded_waiting() {
    let mut service = MockSpeechService::new();
    for _ in 0..8 {
        service = service.with_status(JobState::new(JobStatus::Running));
    }
    let speech = Arc::new(service);
    let summarizer = Arc::new(MockSummarizer::new());
    let clock = Arc::new(MockClock::new());

    let mut config = single_config();
    config.poll = PollPolicy {
        poll_interval: Duration::from_secs(3),
        max_attempts: 8,
    };
    let pipeline =
        Pipeline::new(config, speech.clone(), summarizer.clone()).with_clock(clock.clone());

    match pipeline.run_once().await {
        Err(AudiobriefError::PollTimeout { attempts }) => assert_eq!(attempts, 8),
        other => panic!("expected PollTimeout, got {:?}", other),
    }

    assert_eq!(speech.status_calls(), 8);
    assert_eq!(clock.total_slept(), Duration::from_secs(24));
    assert_eq!(speech.listing_calls(), 0);
    assert_eq!(summarizer.call_count(), 0);
}

#[tokio::test]
async fn transient_poll_errors_do_not_abort_the_run() {
    let document = r#"{"recognizedPhrases": [{"nBest": [{"display": "Still made it."}]}]}"#;

    let speech = Arc::new(
        MockSpeechService::new()
            .with_status_error("connection reset by peer")
            .with_status(JobState::new(JobStatus::Running))
            .with_status_error("502 from gateway")
            .with_status(JobState::new(JobStatus::Succeeded).with_files_url(FILES_URL))
            .with_listing(vec![transcription_entry(
                "meeting.wav.json",
                "https://storage.example/results/meeting",
            )])
            .with_document("https://storage.example/results/meeting", document),
    );
    let summarizer = Arc::new(MockSummarizer::new().with_summary("Made it."));

    let pipeline = Pipeline::new(single_config(), speech.clone(), summarizer.clone())
        .with_clock(Arc::new(MockClock::new()));

    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.summary, "Made it.");
    assert_eq!(speech.status_calls(), 4);
}

#[tokio::test]
async fn failed_job_reports_the_service_error() {
    let speech = Arc::new(MockSpeechService::new().with_status(
        JobState::new(JobStatus::Failed).with_error_message("The audio file is corrupted"),
    ));
    let summarizer = Arc::new(MockSummarizer::new());

    let pipeline = Pipeline::new(single_config(), speech.clone(), summarizer.clone())
        .with_clock(Arc::new(MockClock::new()));

    match pipeline.run_once().await {
        Err(AudiobriefError::JobFailed { message }) => {
            assert_eq!(message, "The audio file is corrupted");
        }
        other => panic!("expected JobFailed, got {:?}", other),
    }

    assert_eq!(speech.fetch_calls(), 0);
    assert_eq!(summarizer.call_count(), 0);
}

#[tokio::test]
async fn container_without_results_produces_empty_report() {
    let speech = Arc::new(
        MockSpeechService::new()
            .with_status(JobState::new(JobStatus::Succeeded).with_files_url(FILES_URL)),
    );
    let summarizer = Arc::new(MockSummarizer::new());

    let pipeline = Pipeline::new(container_config(), speech, summarizer.clone())
        .with_clock(Arc::new(MockClock::new()));

    let report = pipeline.run_once().await.unwrap();

    assert!(report.transcripts.is_empty());
    assert_eq!(report.summary, "");
    assert_eq!(summarizer.call_count(), 0);
}
