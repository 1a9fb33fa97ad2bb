//! Chat-completion summarization through an Azure OpenAI deployment.

use std::sync::Mutex;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;

use crate::defaults;
use crate::error::{AudiobriefError, Result};

const OPENAI_API_VERSION: &str = "2023-12-01-preview";
const OPENAI_KEY_HEADER: &str = "api-key";

/// Knobs for the summarization request.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOptions {
    /// Target length woven into the prompt, e.g. "200 words".
    pub length_directive: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            length_directive: format!("{} words", defaults::SUMMARY_WORDS),
            max_tokens: defaults::SUMMARY_MAX_TOKENS,
            temperature: defaults::SUMMARY_TEMPERATURE,
        }
    }
}

/// Turns transcript text into a short summary.
///
/// Empty or whitespace-only input yields an empty summary without any
/// remote call.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Summarizer backed by an Azure OpenAI chat-completions deployment.
pub struct ChatSummarizer {
    http: reqwest::Client,
    key: String,
    endpoint: String,
    deployment: String,
    options: SummaryOptions,
}

impl ChatSummarizer {
    pub fn new(key: &str, endpoint: &str, deployment: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            key: key.to_string(),
            endpoint: endpoint.to_string(),
            deployment: deployment.to_string(),
            options: SummaryOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SummaryOptions) -> Self {
        self.options = options;
        self
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            OPENAI_API_VERSION
        )
    }
}

fn build_prompt(options: &SummaryOptions, text: &str) -> String {
    format!(
        "Please provide a concise summary of the following text in {}:\n\n{}\n\nSummary:",
        options.length_directive, text
    )
}

fn chat_payload(options: &SummaryOptions, text: &str) -> serde_json::Value {
    json!({
        "messages": [{
            "role": "user",
            "content": build_prompt(options, text),
        }],
        "max_tokens": options.max_tokens,
        "temperature": options.temperature,
    })
}

#[derive(Deserialize)]
struct ChatCompletionBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

fn parse_summary_body(raw: &str) -> Result<String> {
    let body: ChatCompletionBody =
        serde_json::from_str(raw).map_err(|e| AudiobriefError::Summarization {
            message: format!("malformed completion response: {}", e),
        })?;
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AudiobriefError::Summarization {
            message: "completion response contained no choices".to_string(),
        })?;
    Ok(choice.message.content.trim().to_string())
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            debug!("Nothing to summarize, skipping completion request");
            return Ok(String::new());
        }

        let url = self.completions_url();
        debug!("Requesting summary from deployment {}", self.deployment);

        let response = self
            .http
            .post(&url)
            .header(OPENAI_KEY_HEADER, &self.key)
            .json(&chat_payload(&self.options, text))
            .send()
            .await
            .map_err(|e| AudiobriefError::Summarization {
                message: format!("request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error body".to_string());
            return Err(AudiobriefError::Summarization {
                message: format!("{}: {}", status, body),
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|e| AudiobriefError::Summarization {
                message: format!("failed to read completion response: {}", e),
            })?;
        parse_summary_body(&raw)
    }
}

/// Mock summarizer for tests, records every non-empty input it was given.
pub struct MockSummarizer {
    summary: String,
    should_fail: bool,
    calls: Mutex<Vec<String>>,
}

impl MockSummarizer {
    pub fn new() -> Self {
        Self {
            summary: "mock summary".to_string(),
            should_fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock_calls().clone()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        if self.should_fail {
            return Err(AudiobriefError::Summarization {
                message: "mock summarization failure".to_string(),
            });
        }
        self.lock_calls().push(text.to_string());
        Ok(self.summary.clone())
    }
}
