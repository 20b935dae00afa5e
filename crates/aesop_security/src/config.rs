//! Filter configuration.

use serde::{Deserialize, Serialize};

/// Content filter configuration.
///
/// Pattern and keyword lists are data so deployments can localize them
/// without code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Regex patterns that indicate credential-shaped content
    #[serde(default = "default_credential_patterns")]
    pub credential_patterns: Vec<String>,

    /// Words that should never appear in a request
    #[serde(default)]
    pub denylist: Vec<String>,

    /// Cleaned input is truncated to this many characters
    #[serde(default = "default_max_input_len")]
    pub max_input_len: usize,
}

fn default_credential_patterns() -> Vec<String> {
    vec![
        r"(?i)api[_-]?key\s*[:=]\s*\S+".to_string(),
        r"(?i)password\s*[:=]\s*\S+".to_string(),
        r"(?i)secret\s*[:=]\s*\S+".to_string(),
        r"(?i)token\s*[:=]\s*\S+".to_string(),
    ]
}

fn default_max_input_len() -> usize {
    1000
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            credential_patterns: default_credential_patterns(),
            denylist: Vec::new(),
            max_input_len: default_max_input_len(),
        }
    }
}

impl FilterConfig {
    /// Load a filter configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::SecurityResult<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            aesop_error::SecurityError::new(aesop_error::SecurityErrorKind::Configuration(
                format!("failed to read {}: {}", path.as_ref().display(), e),
            ))
        })?;
        toml::from_str(&text).map_err(|e| {
            aesop_error::SecurityError::new(aesop_error::SecurityErrorKind::Configuration(
                format!("failed to parse {}: {}", path.as_ref().display(), e),
            ))
        })
    }
}
