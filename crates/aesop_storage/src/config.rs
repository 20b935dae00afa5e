//! Store configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a [`crate::StoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding story files
    #[serde(default = "default_stories_dir")]
    pub stories_dir: PathBuf,

    /// Whether saves copy the previous version aside first
    #[serde(default = "default_backups_enabled")]
    pub backups_enabled: bool,
}

fn default_stories_dir() -> PathBuf {
    PathBuf::from("./stories")
}

fn default_backups_enabled() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            stories_dir: default_stories_dir(),
            backups_enabled: default_backups_enabled(),
        }
    }
}
