//! The on-disk story envelope.

use aesop_core::StoryDocument;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_version() -> String {
    "1.0".to_string()
}

/// Metadata block stored beside the document in every story file.
///
/// `user_requests` is the append-only audit trail of edit requests that have
/// touched this story, newest last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct StoryMetadata {
    /// Display name, as the user typed it
    story_name: String,
    /// Category under which the story was created
    category: String,
    /// When the story was first saved
    created_at: DateTime<Utc>,
    /// Every edit request applied to this story, in order
    #[serde(default)]
    user_requests: Vec<String>,
    /// On-disk format version
    #[serde(default = "default_version")]
    version: String,
    /// Whether the story has been modified since its first save
    #[serde(default)]
    is_modified: bool,
}

impl StoryMetadata {
    /// Metadata for a story's first save.
    pub fn new(story_name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            story_name: story_name.into(),
            category: category.into(),
            created_at: Utc::now(),
            user_requests: Vec::new(),
            version: default_version(),
            is_modified: false,
        }
    }

    /// Record one more edit request and mark the story modified.
    pub(crate) fn record_edit(&mut self, request: impl Into<String>) {
        self.user_requests.push(request.into());
        self.is_modified = true;
    }

    /// Update the category, keeping creation time and audit trail.
    pub(crate) fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }
}

/// A story document together with its metadata, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct StoredStory {
    /// Metadata block
    metadata: StoryMetadata,
    /// The story itself
    document: StoryDocument,
}

impl StoredStory {
    /// Wrap a document with its metadata.
    pub fn new(metadata: StoryMetadata, document: StoryDocument) -> Self {
        Self { metadata, document }
    }

    /// Consume the envelope, yielding the document.
    pub fn into_document(self) -> StoryDocument {
        self.document
    }

    /// Split the envelope into its parts.
    pub fn into_parts(self) -> (StoryMetadata, StoryDocument) {
        (self.metadata, self.document)
    }
}

/// One row of a metadata listing; the document itself is not loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct StorySummary {
    /// Display name
    pub name: String,
    /// Category under which the story was created
    pub category: String,
    /// When the story was first saved
    pub created_at: DateTime<Utc>,
    /// Whether the story has been modified since its first save
    pub is_modified: bool,
    /// How many edit requests have touched the story
    pub edit_count: usize,
    /// Where the current version lives
    pub path: PathBuf,
}
