//! Content filtering for user edit requests.

use crate::{FilterConfig, SecurityResult};
use aesop_error::{SecurityError, SecurityErrorKind};
use aesop_interface::{ContentScreen, ScreenReport, Severity};
use regex::Regex;
use tracing::{debug, instrument};

/// Content filter for incoming edit requests.
///
/// `check` accumulates every rule hit so the caller can show a user all the
/// problems at once; `clean` strips markup and caps length.
pub struct ContentFilter {
    config: FilterConfig,
    credential_regex: Vec<Regex>,
    tag_regex: Regex,
}

impl ContentFilter {
    /// Create a new content filter with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a credential pattern does not compile or the length
    /// cap is zero.
    pub fn new(config: FilterConfig) -> SecurityResult<Self> {
        if config.max_input_len == 0 {
            return Err(SecurityError::new(SecurityErrorKind::Configuration(
                "max_input_len must be at least 1".to_string(),
            )));
        }

        let mut credential_regex = Vec::new();
        for pattern in &config.credential_patterns {
            match Regex::new(pattern) {
                Ok(regex) => credential_regex.push(regex),
                Err(e) => {
                    return Err(SecurityError::new(SecurityErrorKind::InvalidPattern {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    }));
                }
            }
        }

        // Matches any markup tag, including script blocks with bodies
        let tag_regex = Regex::new(r"(?is)<script.*?</script>|<[^>]+>").expect("valid tag regex");

        Ok(Self {
            config,
            credential_regex,
            tag_regex,
        })
    }

    /// Create a filter with default configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a default pattern fails to compile.
    pub fn with_defaults() -> SecurityResult<Self> {
        Self::new(FilterConfig::default())
    }

    /// Get the configuration.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }
}

impl ContentScreen for ContentFilter {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    fn check(&self, text: &str) -> ScreenReport {
        let mut issues = Vec::new();
        let mut severity = Severity::Low;

        for (i, regex) in self.credential_regex.iter().enumerate() {
            if regex.is_match(text) {
                debug!(pattern_index = i, "credential-shaped content detected");
                issues.push(format!(
                    "credential-shaped content matches pattern: {}",
                    self.config.credential_patterns[i]
                ));
                severity = Severity::High;
            }
        }

        let lowered = text.to_lowercase();
        for word in &self.config.denylist {
            if !word.is_empty() && lowered.contains(&word.to_lowercase()) {
                debug!(word = %word, "denylisted word detected");
                issues.push(format!("contains denylisted word: {}", word));
                severity = severity.max(Severity::Medium);
            }
        }

        ScreenReport {
            is_safe: issues.is_empty(),
            issues,
            severity,
        }
    }

    fn clean(&self, text: &str) -> String {
        let stripped = self.tag_regex.replace_all(text, "");
        let trimmed = stripped.trim();
        if trimmed.chars().count() > self.config.max_input_len {
            trimmed.chars().take(self.config.max_input_len).collect()
        } else {
            trimmed.to_string()
        }
    }
}
