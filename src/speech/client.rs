//! HTTP client for the batch transcription REST API.

use async_trait::async_trait;
use log::debug;
use serde_json::json;

use crate::error::{AudiobriefError, Result};
use crate::speech::service::SpeechService;
use crate::speech::types::{
    AudioInput, FileEntry, FileListBody, JobHandle, JobState, JobStatus, ResultFile,
    ResultLocator, TranscriptionOptions, TranscriptionStatusBody,
};

const SPEECH_API_PATH: &str = "speechtotext/v3.1/transcriptions";

/// Subscription key header expected by the speech service.
const SPEECH_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Client for the batch transcription REST API.
pub struct AzureSpeechClient {
    http: reqwest::Client,
    key: String,
    endpoint: String,
}

impl AzureSpeechClient {
    pub fn new(key: &str, endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            key: key.to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    fn transcriptions_url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            SPEECH_API_PATH
        )
    }
}

/// Build the job creation payload. The input kind decides the content field;
/// everything else is shared.
fn submission_payload(input: &AudioInput, options: &TranscriptionOptions) -> serde_json::Value {
    let mut payload = json!({
        "displayName": options.display_name,
        "locale": options.locale,
        "properties": {
            "wordLevelTimestampsEnabled": options.word_level_timestamps,
            "punctuationMode": options.punctuation_mode,
            "profanityFilterMode": options.profanity_filter_mode,
        },
    });
    match input {
        AudioInput::Url(uri) => {
            payload["contentUrls"] = json!([uri]);
        }
        AudioInput::Container(uri) => {
            payload["contentContainerUrl"] = json!(uri);
        }
    }
    payload
}

fn parse_job_state(raw: &str) -> Result<JobState> {
    let body: TranscriptionStatusBody =
        serde_json::from_str(raw).map_err(|e| AudiobriefError::TransientPoll {
            message: format!("malformed status body: {}", e),
        })?;

    let status = JobStatus::from(body.status.as_str());
    let files_url = body.links.and_then(|links| links.files);
    let error_message = body
        .properties
        .and_then(|properties| properties.error)
        .and_then(|error| error.message);

    Ok(JobState {
        status,
        files_url,
        error_message,
    })
}

fn parse_file_listing(raw: &str) -> Result<Vec<FileEntry>> {
    let body: FileListBody =
        serde_json::from_str(raw).map_err(|e| AudiobriefError::Extraction {
            message: format!("malformed files listing: {}", e),
        })?;
    Ok(body.values)
}

#[async_trait]
impl SpeechService for AzureSpeechClient {
    async fn submit(
        &self,
        input: &AudioInput,
        options: &TranscriptionOptions,
    ) -> Result<JobHandle> {
        let url = self.transcriptions_url();
        debug!("Submitting transcription job to {}", url);

        let response = self
            .http
            .post(&url)
            .header(SPEECH_KEY_HEADER, &self.key)
            .json(&submission_payload(input, options))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error body".to_string());
            return Err(AudiobriefError::Submission {
                status: status.as_u16(),
                body,
            });
        }

        // Header lookup is case-insensitive per HTTP semantics.
        let location = response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok())
            .ok_or(AudiobriefError::MissingJobLocation)?;

        Ok(JobHandle::new(location))
    }

    async fn job_status(&self, handle: &JobHandle) -> Result<JobState> {
        let response = self
            .http
            .get(handle.url())
            .header(SPEECH_KEY_HEADER, &self.key)
            .send()
            .await
            .map_err(|e| AudiobriefError::TransientPoll {
                message: format!("status request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error body".to_string());
            return Err(AudiobriefError::TransientPoll {
                message: format!("status request returned {}: {}", status, body),
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|e| AudiobriefError::TransientPoll {
                message: format!("failed to read status body: {}", e),
            })?;
        parse_job_state(&raw)
    }

    async fn list_result_files(&self, locator: &ResultLocator) -> Result<Vec<FileEntry>> {
        let response = self
            .http
            .get(&locator.files_url)
            .header(SPEECH_KEY_HEADER, &self.key)
            .send()
            .await
            .map_err(|e| AudiobriefError::Extraction {
                message: format!("files listing request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error body".to_string());
            return Err(AudiobriefError::Extraction {
                message: format!("files listing returned {}: {}", status, body),
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|e| AudiobriefError::Extraction {
                message: format!("failed to read files listing: {}", e),
            })?;
        parse_file_listing(&raw)
    }

    async fn fetch_result_document(&self, file: &ResultFile) -> Result<String> {
        // Result documents live on pre-signed storage URLs; the subscription
        // key must not be forwarded there.
        let response = self
            .http
            .get(&file.content_url)
            .send()
            .await
            .map_err(|e| AudiobriefError::Extraction {
                message: format!("fetching result {} failed: {}", file.name, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AudiobriefError::Extraction {
                message: format!("fetching result {} returned {}", file.name, status),
            });
        }

        response
            .text()
            .await
            .map_err(|e| AudiobriefError::Extraction {
                message: format!("failed to read result {}: {}", file.name, e),
            })
    }
}
