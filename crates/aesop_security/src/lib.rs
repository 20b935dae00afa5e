//! Content screening for user edit requests.
//!
//! Edit requests are free text typed by users (often children) and are fed
//! into generation prompts, so two things are screened before any prompt is
//! composed: credential-shaped content that should never reach a provider,
//! and denylisted vocabulary. The filter also cleans input by stripping
//! markup and capping length.
//!
//! The keyword and pattern content is configuration, not code: load a
//! [`FilterConfig`] from TOML to localize or extend the rules.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod content;

pub use config::FilterConfig;
pub use content::ContentFilter;

/// Result type for screening operations.
pub type SecurityResult<T> = std::result::Result<T, aesop_error::SecurityError>;
