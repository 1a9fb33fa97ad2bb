//! Result document parsing and transcript assembly.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{AudiobriefError, Result};
use crate::speech::types::{FileEntry, ResultFile};

/// `kind` value marking an actual transcript in a files listing. Listings
/// also contain report artifacts (e.g. "TranscriptionReport") that hold no
/// speech content.
pub const TRANSCRIPTION_KIND: &str = "Transcription";

/// A transcription result document as produced by the service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDocument {
    pub recognized_phrases: Option<Vec<RecognizedPhrase>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedPhrase {
    #[serde(default)]
    pub n_best: Vec<NBestEntry>,
}

#[derive(Debug, Deserialize)]
pub struct NBestEntry {
    #[serde(default)]
    pub display: String,
}

/// Parse a raw result document.
pub fn parse_result_document(raw: &str) -> Result<ResultDocument> {
    serde_json::from_str(raw).map_err(|e| AudiobriefError::Extraction {
        message: format!("malformed result document: {}", e),
    })
}

/// Assemble display text from a parsed result document.
///
/// Takes the top recognition candidate of each phrase and joins them with
/// single spaces. A document whose phrase list is empty (silence) yields an
/// empty string; a document without the phrase list at all is malformed.
pub fn extract_transcript(document: &ResultDocument) -> Result<String> {
    let phrases = document
        .recognized_phrases
        .as_ref()
        .ok_or_else(|| AudiobriefError::Extraction {
            message: "result document has no recognizedPhrases field".to_string(),
        })?;

    let parts: Vec<&str> = phrases
        .iter()
        .filter_map(|phrase| phrase.n_best.first())
        .map(|best| best.display.as_str())
        .filter(|display| !display.is_empty())
        .collect();

    Ok(parts.join(" "))
}

/// Keep only downloadable transcript entries from a files listing.
pub fn transcription_files(entries: &[FileEntry]) -> Vec<ResultFile> {
    entries
        .iter()
        .filter(|entry| entry.kind == TRANSCRIPTION_KIND)
        .filter_map(|entry| {
            let content_url = entry.links.as_ref()?.content_url.as_ref()?;
            Some(ResultFile {
                name: entry.name.clone(),
                content_url: content_url.clone(),
            })
        })
        .collect()
}

/// Extracted transcripts of one finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcripts {
    /// One transcript from a single-file job.
    Single(String),
    /// Per-file transcripts from a container job, keyed by source file name.
    PerResource(BTreeMap<String, String>),
}

impl Transcripts {
    /// Text handed to the summarizer.
    ///
    /// Container results are concatenated with each transcript prefixed by
    /// its file name on a fresh line, so the summary can attribute content
    /// across recordings.
    pub fn combined_text(&self) -> String {
        match self {
            Transcripts::Single(text) => text.clone(),
            Transcripts::PerResource(map) => {
                let mut combined = String::new();
                for (name, text) in map {
                    combined.push_str(&format!("\n{}: {}", name, text));
                }
                combined
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Transcripts::Single(text) => text.is_empty(),
            Transcripts::PerResource(map) => map.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Transcripts::Single(_) => 1,
            Transcripts::PerResource(map) => map.len(),
        }
    }
}
