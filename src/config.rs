use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults;
use crate::error::{AudiobriefError, Result};
use crate::speech::AudioInput;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub speech: SpeechConfig,
    pub openai: OpenAiConfig,
    pub run: RunConfig,
}

/// Transcription service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub key: Option<String>,
    pub endpoint: Option<String>,
    pub audio_uri: Option<String>,
    pub container_uri: Option<String>,
    pub locale: String,
}

/// Summarization service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiConfig {
    pub key: Option<String>,
    pub endpoint: Option<String>,
    pub deployment: String,
}

/// Pipeline run configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
    pub run_interval_secs: u64,
    pub summary_words: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            key: None,
            endpoint: None,
            audio_uri: None,
            container_uri: None,
            locale: defaults::DEFAULT_LOCALE.to_string(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            key: None,
            endpoint: None,
            deployment: "gpt-4".to_string(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: defaults::POLL_INTERVAL_SECS,
            max_poll_attempts: defaults::MAX_POLL_ATTEMPTS,
            run_interval_secs: defaults::RUN_INTERVAL_SECS,
            summary_words: defaults::SUMMARY_WORDS,
        }
    }
}

/// Configuration after validation: every required value present, exactly one
/// input source chosen.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub speech_key: String,
    pub speech_endpoint: String,
    pub openai_key: String,
    pub openai_endpoint: String,
    pub deployment: String,
    pub input: AudioInput,
    pub locale: String,
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
    pub run_interval_secs: u64,
    pub summary_words: u32,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only falls back to defaults when the file is missing.
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(AudiobriefError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - AZURE_SPEECH_KEY → speech.key
    /// - AZURE_SPEECH_ENDPOINT → speech.endpoint
    /// - AUDIO_URI → speech.audio_uri
    /// - CONTAINER_URI → speech.container_uri
    /// - AUDIOBRIEF_LOCALE → speech.locale
    /// - AZURE_OPENAI_KEY → openai.key
    /// - AZURE_OPENAI_ENDPOINT → openai.endpoint
    /// - DEPLOYMENT_NAME → openai.deployment
    /// - AUDIOBRIEF_POLL_INTERVAL_SECS → run.poll_interval_secs
    /// - AUDIOBRIEF_MAX_POLL_ATTEMPTS → run.max_poll_attempts
    /// - AUDIOBRIEF_RUN_INTERVAL_SECS → run.run_interval_secs
    /// - AUDIOBRIEF_SUMMARY_WORDS → run.summary_words
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(key) = std::env::var("AZURE_SPEECH_KEY")
            && !key.is_empty()
        {
            self.speech.key = Some(key);
        }

        if let Ok(endpoint) = std::env::var("AZURE_SPEECH_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.speech.endpoint = Some(endpoint);
        }

        if let Ok(uri) = std::env::var("AUDIO_URI")
            && !uri.is_empty()
        {
            self.speech.audio_uri = Some(uri);
        }

        if let Ok(uri) = std::env::var("CONTAINER_URI")
            && !uri.is_empty()
        {
            self.speech.container_uri = Some(uri);
        }

        if let Ok(locale) = std::env::var("AUDIOBRIEF_LOCALE")
            && !locale.is_empty()
        {
            self.speech.locale = locale;
        }

        if let Ok(key) = std::env::var("AZURE_OPENAI_KEY")
            && !key.is_empty()
        {
            self.openai.key = Some(key);
        }

        if let Ok(endpoint) = std::env::var("AZURE_OPENAI_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.openai.endpoint = Some(endpoint);
        }

        if let Ok(deployment) = std::env::var("DEPLOYMENT_NAME")
            && !deployment.is_empty()
        {
            self.openai.deployment = deployment;
        }

        self.run.poll_interval_secs =
            parse_env_or("AUDIOBRIEF_POLL_INTERVAL_SECS", self.run.poll_interval_secs)?;
        self.run.max_poll_attempts =
            parse_env_or("AUDIOBRIEF_MAX_POLL_ATTEMPTS", self.run.max_poll_attempts)?;
        self.run.run_interval_secs =
            parse_env_or("AUDIOBRIEF_RUN_INTERVAL_SECS", self.run.run_interval_secs)?;
        self.run.summary_words = parse_env_or("AUDIOBRIEF_SUMMARY_WORDS", self.run.summary_words)?;

        Ok(self)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/audiobrief/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("audiobrief")
            .join("config.toml")
    }

    /// Check that every required value is present and resolve the input source.
    ///
    /// Collects ALL missing required keys into a single error so one failed
    /// run reports the complete list instead of one key at a time.
    pub fn validate(&self) -> Result<ValidatedConfig> {
        let mut missing = Vec::new();

        let speech_key = require(&self.speech.key, "AZURE_SPEECH_KEY", &mut missing);
        let speech_endpoint = require(&self.speech.endpoint, "AZURE_SPEECH_ENDPOINT", &mut missing);
        let openai_key = require(&self.openai.key, "AZURE_OPENAI_KEY", &mut missing);
        let openai_endpoint = require(&self.openai.endpoint, "AZURE_OPENAI_ENDPOINT", &mut missing);

        let audio_uri = non_empty(&self.speech.audio_uri);
        let container_uri = non_empty(&self.speech.container_uri);
        if audio_uri.is_none() && container_uri.is_none() {
            missing.push("AUDIO_URI or CONTAINER_URI".to_string());
        }

        if !missing.is_empty() {
            return Err(AudiobriefError::ConfigMissing { keys: missing });
        }

        let input = match (audio_uri, container_uri) {
            (Some(_), Some(_)) => {
                return Err(AudiobriefError::ConfigInvalidValue {
                    key: "AUDIO_URI".to_string(),
                    message: "conflicts with CONTAINER_URI; set exactly one input source"
                        .to_string(),
                });
            }
            (Some(uri), None) => AudioInput::Url(uri.to_string()),
            (None, Some(uri)) => AudioInput::Container(uri.to_string()),
            // Unreachable: counted as missing above.
            (None, None) => {
                return Err(AudiobriefError::ConfigMissing {
                    keys: vec!["AUDIO_URI or CONTAINER_URI".to_string()],
                });
            }
        };

        Ok(ValidatedConfig {
            speech_key,
            speech_endpoint,
            openai_key,
            openai_endpoint,
            deployment: self.openai.deployment.clone(),
            input,
            locale: self.speech.locale.clone(),
            poll_interval_secs: self.run.poll_interval_secs,
            max_poll_attempts: self.run.max_poll_attempts,
            run_interval_secs: self.run.run_interval_secs,
            summary_words: self.run.summary_words,
        })
    }
}

/// Returns the value if present and non-blank, otherwise records `name` as missing.
fn require(value: &Option<String>, name: &str, missing: &mut Vec<String>) -> String {
    match non_empty(value) {
        Some(v) => v.to_string(),
        None => {
            missing.push(name.to_string());
            String::new()
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an integer environment variable, keeping `current` when it is unset.
fn parse_env_or<T: std::str::FromStr>(name: &str, current: T) -> Result<T> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => {
            value
                .parse()
                .map_err(|_| AudiobriefError::ConfigInvalidValue {
                    key: name.to_string(),
                    message: format!("expected an integer, got {:?}", value),
                })
        }
        _ => Ok(current),
    }
}
