//! Core type definitions for the aesop interface.

use serde::{Deserialize, Serialize};

/// A single chunk from a streaming response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Incremental content (usually partial text).
    pub content: aesop_core::Output,
    /// Whether this is the final chunk.
    pub is_final: bool,
    /// Optional finish reason if final.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    /// A non-final text chunk.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: aesop_core::Output::Text(content.into()),
            is_final: false,
            finish_reason: None,
        }
    }

    /// A final text chunk with the given finish reason.
    pub fn final_text(content: impl Into<String>, reason: FinishReason) -> Self {
        Self {
            content: aesop_core::Output::Text(content.into()),
            is_final: true,
            finish_reason: Some(reason),
        }
    }
}

/// Why generation stopped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
)]
pub enum FinishReason {
    /// Model completed naturally.
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Hit a stop sequence.
    StopSequence,
    /// Content was filtered.
    ContentFilter,
    /// Other/unknown reason.
    Other,
}

/// Outcome of a content screening check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenReport {
    /// Whether the text passed every rule.
    pub is_safe: bool,
    /// Human-readable description of each rule hit.
    pub issues: Vec<String>,
    /// Highest severity among the hits.
    pub severity: Severity,
}

impl ScreenReport {
    /// A report with no findings.
    pub fn safe() -> Self {
        Self {
            is_safe: true,
            issues: Vec::new(),
            severity: Severity::Low,
        }
    }
}

/// How serious a screening hit is.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Nothing or cosmetic findings only
    #[default]
    Low,
    /// Denylisted vocabulary
    Medium,
    /// Credential-shaped content
    High,
}
