//! Filesystem-backed story store.

use crate::{StoreConfig, StoredStory, StoryMetadata, StorySummary};
use aesop_core::StoryDocument;
use aesop_error::{AesopResult, StorageError, StorageErrorKind};
use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Envelope for metadata-only reads; the document field is skipped.
#[derive(serde::Deserialize)]
struct MetadataOnly {
    metadata: StoryMetadata,
}

/// What a save produced.
///
/// `notice` is set when the backup step failed: backups are best-effort and
/// never block the save, but callers surface the notice in diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    /// Where the current version now lives
    pub path: PathBuf,
    /// The backup copy made before overwriting, when one was made
    pub backup_path: Option<PathBuf>,
    /// Human-readable warning when the backup step failed
    pub notice: Option<String>,
}

/// Filesystem store for story documents.
///
/// One JSON file per story under `base_path`, named
/// `story_{name}_{category}_{YYYYMMDD_HHMMSS}.json` with sanitized segments.
/// Stories are looked up by the display name recorded in their metadata, not
/// by filename, so renamed files keep working. Saving an existing story
/// copies the previous version to `{stem}_backup_{YYYYMMDD_HHMMSS}.json`
/// first, then overwrites in place via temp file + rename.
///
/// Concurrent saves to the same story name are last-writer-wins; each write
/// is internally consistent through the atomic rename, and the final content
/// is whichever rename lands last.
pub struct StoryStore {
    base_path: PathBuf,
    backups_enabled: bool,
}

impl StoryStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> AesopResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Opened story store");
        Ok(Self {
            base_path,
            backups_enabled: true,
        })
    }

    /// Create a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the stories directory cannot be created.
    pub fn from_config(config: &StoreConfig) -> AesopResult<Self> {
        let mut store = Self::new(config.stories_dir.clone())?;
        store.backups_enabled = config.backups_enabled;
        Ok(store)
    }

    /// Replace non-word characters and cap length, keeping names path-safe.
    fn sanitize(name: &str) -> String {
        name.chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .take(50)
            .collect()
    }

    fn timestamp() -> String {
        Utc::now().format("%Y%m%d_%H%M%S").to_string()
    }

    fn is_backup(path: &Path) -> bool {
        path.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.contains("_backup_"))
    }

    /// Sort key for backup files: the timestamp after the last `_backup_`.
    fn backup_key(path: &Path) -> String {
        path.file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.rsplit("_backup_").next())
            .unwrap_or_default()
            .to_string()
    }

    /// All JSON files under the store, split into (current, backup) sets.
    async fn scan(&self) -> AesopResult<(Vec<PathBuf>, Vec<PathBuf>)> {
        let mut current = Vec::new();
        let mut backups = Vec::new();

        let mut entries = tokio::fs::read_dir(&self.base_path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.base_path.display(),
                e
            )))
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.base_path.display(),
                e
            )))
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if Self::is_backup(&path) {
                backups.push(path);
            } else {
                current.push(path);
            }
        }

        Ok((current, backups))
    }

    /// Read just the metadata block of a story file.
    ///
    /// Unreadable or malformed files yield `None` so one bad file cannot
    /// break listing.
    async fn peek(&self, path: &Path) -> Option<StoryMetadata> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable story file");
                return None;
            }
        };
        match serde_json::from_str::<MetadataOnly>(&text) {
            Ok(envelope) => Some(envelope.metadata),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping malformed story file");
                None
            }
        }
    }

    /// Find the current file for a story name; newest creation time wins
    /// when duplicates exist.
    async fn find(&self, name: &str) -> AesopResult<Option<(PathBuf, StoryMetadata)>> {
        let (current, _) = self.scan().await?;
        let mut best: Option<(PathBuf, StoryMetadata)> = None;

        for path in current {
            if let Some(metadata) = self.peek(&path).await {
                if metadata.story_name() == name {
                    let newer = best
                        .as_ref()
                        .is_none_or(|(_, m)| metadata.created_at() > m.created_at());
                    if newer {
                        best = Some((path, metadata));
                    }
                }
            }
        }

        Ok(best)
    }

    async fn read_story(&self, path: &Path) -> AesopResult<StoredStory> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        let story = serde_json::from_str(&text).map_err(|e| {
            StorageError::new(StorageErrorKind::Serialization(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;

        Ok(story)
    }

    /// Write the envelope atomically: temp file first, then rename.
    ///
    /// Temp names are unique per write; concurrent saves to one story must
    /// not share a temp file, or one writer could publish another's bytes.
    async fn write_story(&self, path: &Path, story: &StoredStory) -> AesopResult<()> {
        let json = serde_json::to_string_pretty(story).map_err(|e| {
            StorageError::new(StorageErrorKind::Serialization(e.to_string()))
        })?;

        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&temp_path, json.as_bytes())
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: {}",
                    temp_path.display(),
                    e
                )))
            })?;

        tokio::fs::rename(&temp_path, path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        Ok(())
    }

    /// Load the current version of a story by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageErrorKind::NotFound` when no story carries this name.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, name: &str) -> AesopResult<StoredStory> {
        let Some((path, _)) = self.find(name).await? else {
            return Err(StorageError::new(StorageErrorKind::NotFound(name.to_string())).into());
        };

        let story = self.read_story(&path).await?;
        tracing::debug!(name, path = %path.display(), "Loaded story");
        Ok(story)
    }

    /// Save a story, backing up the previous version first when one exists.
    ///
    /// `edit_request`, when given, is appended to the story's audit trail.
    /// Backup failures are logged and reported through
    /// [`SaveOutcome::notice`] but never block the save.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or the write fails.
    #[tracing::instrument(skip(self, document, edit_request), fields(turns = document.len()))]
    pub async fn save(
        &self,
        name: &str,
        category: &str,
        document: &StoryDocument,
        edit_request: Option<&str>,
    ) -> AesopResult<SaveOutcome> {
        if name.trim().is_empty() {
            return Err(StorageError::new(StorageErrorKind::InvalidName(
                "story name is empty".to_string(),
            ))
            .into());
        }

        let existing = self.find(name).await?;
        let mut backup_path = None;
        let mut notice = None;

        let (path, mut metadata) = match existing {
            Some((path, metadata)) => {
                if self.backups_enabled {
                    match self.backup_file(&path).await {
                        Ok(backup) => backup_path = Some(backup),
                        Err(e) => {
                            tracing::warn!(name, error = %e, "Backup failed; saving anyway");
                            notice = Some(format!("backup failed: {e}"));
                        }
                    }
                }
                (path, metadata)
            }
            None => {
                let filename = format!(
                    "story_{}_{}_{}.json",
                    Self::sanitize(name),
                    Self::sanitize(category),
                    Self::timestamp()
                );
                (self.base_path.join(filename), StoryMetadata::new(name, category))
            }
        };

        metadata.set_category(category);
        if let Some(request) = edit_request {
            metadata.record_edit(request);
        }

        let story = StoredStory::new(metadata, document.clone());
        self.write_story(&path, &story).await?;

        tracing::info!(
            name,
            category,
            path = %path.display(),
            backed_up = backup_path.is_some(),
            "Saved story"
        );

        Ok(SaveOutcome {
            path,
            backup_path,
            notice,
        })
    }

    /// Copy `path` to a timestamped backup sibling.
    async fn backup_file(&self, path: &Path) -> AesopResult<PathBuf> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::InvalidName(path.display().to_string()))
            })?;

        let backup_name = format!("{}_backup_{}.json", stem, Self::timestamp());
        let backup_path = self.base_path.join(backup_name);

        tokio::fs::copy(path, &backup_path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Backup {
                name: stem.to_string(),
                message: e.to_string(),
            })
        })?;

        tracing::debug!(from = %path.display(), to = %backup_path.display(), "Backed up story");
        Ok(backup_path)
    }

    /// All story names, sorted and deduplicated.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> AesopResult<Vec<String>> {
        let (current, _) = self.scan().await?;
        let mut names = std::collections::BTreeSet::new();

        for path in current {
            if let Some(metadata) = self.peek(&path).await {
                names.insert(metadata.story_name().clone());
            }
        }

        Ok(names.into_iter().collect())
    }

    /// Metadata for every stored story, newest first.
    ///
    /// Documents are not parsed; only the metadata block of each file is read.
    #[tracing::instrument(skip(self))]
    pub async fn list_with_metadata(&self) -> AesopResult<Vec<StorySummary>> {
        let (current, _) = self.scan().await?;
        let mut summaries = Vec::new();

        for path in current {
            if let Some(metadata) = self.peek(&path).await {
                summaries.push(StorySummary {
                    name: metadata.story_name().clone(),
                    category: metadata.category().clone(),
                    created_at: *metadata.created_at(),
                    is_modified: *metadata.is_modified(),
                    edit_count: metadata.user_requests().len(),
                    path,
                });
            }
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// Delete the current version of a story. Backups are left in place.
    ///
    /// # Errors
    ///
    /// Returns `StorageErrorKind::NotFound` when no story carries this name.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> AesopResult<()> {
        let Some((path, _)) = self.find(name).await? else {
            return Err(StorageError::new(StorageErrorKind::NotFound(name.to_string())).into());
        };

        tokio::fs::remove_file(&path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "delete {}: {}",
                path.display(),
                e
            )))
        })?;

        tracing::info!(name, path = %path.display(), "Deleted story");
        Ok(())
    }

    /// Backup files for a story, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn backups(&self, name: &str) -> AesopResult<Vec<PathBuf>> {
        let (_, backups) = self.scan().await?;
        let mut matching = Vec::new();

        for path in backups {
            if let Some(metadata) = self.peek(&path).await {
                if metadata.story_name() == name {
                    matching.push(path);
                }
            }
        }

        matching.sort_by_key(|p| Self::backup_key(p));
        Ok(matching)
    }

    /// Load the newest backup of a story.
    ///
    /// # Errors
    ///
    /// Returns `StorageErrorKind::NotFound` when the story has no backups.
    #[tracing::instrument(skip(self))]
    pub async fn load_backup(&self, name: &str) -> AesopResult<StoredStory> {
        let backups = self.backups(name).await?;
        let Some(path) = backups.last() else {
            return Err(StorageError::new(StorageErrorKind::NotFound(format!(
                "no backups for {name}"
            )))
            .into());
        };

        self.read_story(path).await
    }

    /// The directory this store reads and writes.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_punctuation() {
        assert_eq!(StoryStore::sanitize("Dragon Tale!"), "Dragon_Tale_");
        assert_eq!(StoryStore::sanitize("a/b\\c"), "a_b_c");
    }

    #[test]
    fn sanitize_keeps_unicode_word_chars() {
        assert_eq!(StoryStore::sanitize("용의 이야기"), "용의_이야기");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(80);
        assert_eq!(StoryStore::sanitize(&long).chars().count(), 50);
    }

    #[test]
    fn backup_detection() {
        assert!(StoryStore::is_backup(Path::new(
            "story_a_b_20250101_000000_backup_20250102_000000.json"
        )));
        assert!(!StoryStore::is_backup(Path::new(
            "story_a_b_20250101_000000.json"
        )));
    }

    #[test]
    fn backup_key_is_trailing_timestamp() {
        let path = Path::new("story_a_b_20250101_000000_backup_20250102_030405.json");
        assert_eq!(StoryStore::backup_key(path), "20250102_030405");
    }
}
