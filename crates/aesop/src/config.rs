//! Workspace configuration loading.
//!
//! Bundles the per-crate configuration sections into one document. The
//! loading system supports:
//! - Bundled defaults (include_str! from aesop.toml)
//! - User overrides (./aesop.toml)
//! - Environment variables (`AESOP__` prefix, `__` section separator)

use aesop_error::{AesopError, AesopResult, ConfigError};
use aesop_narrative::PipelineConfig;
use aesop_security::FilterConfig;
use aesop_storage::StoreConfig;
use aesop_tasks::OrchestratorConfig;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Top-level aesop configuration.
///
/// One section per configurable crate; every section and every field is
/// optional in the source document, defaulting to the values the crates
/// themselves ship.
///
/// # Example
///
/// ```toml
/// [pipeline]
/// temperature = 0.7
/// max_tokens = 4096
///
/// [store]
/// stories_dir = "./stories"
///
/// [orchestrator]
/// max_concurrent_default = 4
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct AesopConfig {
    /// Generation parameters for the modification pipeline
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Document store location and backup policy
    #[serde(default)]
    pub store: StoreConfig,

    /// Background task fan-out and retention
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Content screening patterns and limits
    #[serde(default)]
    pub filter: FilterConfig,
}

impl AesopConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> AesopResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                AesopError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                AesopError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: environment > user override >
    /// bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override
    /// earlier):
    /// 1. Bundled defaults (aesop.toml shipped with the workspace)
    /// 2. User config in the current directory (./aesop.toml, optional)
    /// 3. Environment variables (`AESOP__PIPELINE__MAX_TOKENS=2048` style)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use aesop::AesopConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = AesopConfig::load()?;
    /// println!("stories live in {}", config.store.stories_dir.display());
    /// # Ok(())
    /// # }
    /// ```
    #[instrument]
    pub fn load() -> AesopResult<Self> {
        debug!("Loading configuration with precedence: environment > current dir > bundled defaults");

        // Bundled default configuration
        const DEFAULT_CONFIG: &str = include_str!("../../../aesop.toml");

        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::with_name("aesop").required(false))
            .add_source(
                Environment::with_prefix("AESOP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                AesopError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                AesopError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = AesopConfig::default();
        assert_eq!(config.pipeline.history_window, 3);
        assert_eq!(config.orchestrator.max_concurrent_default, 4);
        assert!(config.store.backups_enabled);
        assert!(!config.filter.credential_patterns.is_empty());
    }

    #[test]
    fn bundled_defaults_match_struct_defaults() {
        let config = AesopConfig::load().unwrap();
        assert_eq!(config, AesopConfig::default());
    }

    #[test]
    fn partial_section_keeps_sibling_defaults() {
        let toml = r#"
            [pipeline]
            max_tokens = 2048

            [store]
            stories_dir = "/tmp/aesop-stories"
        "#;
        let config: AesopConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.pipeline.max_tokens, 2048);
        assert_eq!(config.pipeline.history_window, 3);
        assert_eq!(
            config.store.stories_dir,
            std::path::PathBuf::from("/tmp/aesop-stories")
        );
        assert_eq!(config.orchestrator.retention_cap, 256);
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = AesopConfig::from_file("/does/not/exist/aesop.toml").unwrap_err();
        assert!(format!("{err}").contains("Configuration Error"));
    }
}
