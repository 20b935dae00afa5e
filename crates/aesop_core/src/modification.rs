//! Modification request and result types.

use crate::StoryDocument;
use aesop_error::AesopError;
use serde::{Deserialize, Serialize};

/// Category of a story edit request.
///
/// Categories are evaluated by the classifier in a fixed precedence order;
/// `General` is the fallback when no rule matches.
///
/// # Examples
///
/// ```
/// use aesop_core::ModificationType;
///
/// assert_eq!(format!("{}", ModificationType::Character), "character");
/// ```
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
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModificationType {
    /// Renames or reshapes a character or named entity
    Character,
    /// Changes the story's place, time, or backdrop
    Setting,
    /// Alters what happens in one or more turns
    Events,
    /// Rewrites spoken lines or tone
    Dialogue,
    /// Anything the rule table does not recognize
    General,
}

/// A user's free-text instruction to change part of a story document.
///
/// Created once per submission by the classifier, consumed once by the
/// pipeline, and folded into the stored document's audit trail rather than
/// persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationRequest {
    /// The user's text, unmodified
    pub raw_text: String,
    /// Category assigned by the classifier
    pub classified_type: ModificationType,
    /// 1-based turn number when the request names one explicitly
    pub target_turn: Option<u32>,
}

impl ModificationRequest {
    /// Whether this request is scoped to a single turn.
    pub fn is_narrow(&self) -> bool {
        self.target_turn.is_some()
    }
}

/// Non-fatal observations accumulated during a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Diagnostics {
    /// Category the classifier assigned
    pub classification: Option<ModificationType>,
    /// Turn the request targeted, when narrow
    pub target_turn: Option<u32>,
    /// Structural violations reported by the validator
    pub violations: Vec<String>,
    /// Advisory notices (backup failures, shape repairs, content warnings)
    pub notices: Vec<String>,
}

impl Diagnostics {
    /// Record a non-fatal notice.
    pub fn notice(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }
}

/// Outcome of a single pipeline invocation.
///
/// Every invocation returns one of these; the pipeline never panics across
/// its boundary. A `Failure` may still carry a document: when validation
/// reports field violations the generated content is returned alongside the
/// diagnostics, because malformed-but-present output is more useful to a
/// human editor than nothing.
#[derive(Debug, Clone)]
pub enum ModificationResult {
    /// The revised document was produced, validated, and persisted.
    Success {
        /// The revised story document
        document: StoryDocument,
        /// Classification, validation outcome, and notices
        diagnostics: Diagnostics,
    },
    /// The pipeline stopped before producing a persisted document.
    Failure {
        /// What went wrong
        error: AesopError,
        /// Human-readable summary of the failure
        detail: String,
        /// Generated content, when it exists despite the failure
        document: Option<StoryDocument>,
        /// Whatever diagnostics had accumulated by the failing stage
        diagnostics: Diagnostics,
    },
}

impl ModificationResult {
    /// Whether this outcome is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The document, if one was produced (even alongside a failure).
    pub fn document(&self) -> Option<&StoryDocument> {
        match self {
            Self::Success { document, .. } => Some(document),
            Self::Failure { document, .. } => document.as_ref(),
        }
    }

    /// The accumulated diagnostics.
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            Self::Success { diagnostics, .. } => diagnostics,
            Self::Failure { diagnostics, .. } => diagnostics,
        }
    }
}
