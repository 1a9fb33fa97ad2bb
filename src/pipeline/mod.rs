//! Transcription pipeline orchestration.
//!
//! Chains the speech and summarization clients into single runs or a
//! continuous loop with a configurable pause between cycles.

pub mod orchestrator;

pub use orchestrator::{Pipeline, PipelineConfig, RunReport};
