//! Transcript summarization via Azure OpenAI chat completions.

pub mod client;

pub use client::{ChatSummarizer, MockSummarizer, SummaryOptions, Summarizer};
