//! Input types for generation requests.

use serde::{Deserialize, Serialize};

/// Supported input content for generation requests.
///
/// The pipeline is text-only; the enum keeps the wire shape open for
/// providers that tag content by type.
///
/// # Examples
///
/// ```
/// use aesop_core::Input;
///
/// let text = Input::Text("Rewrite turn two.".to_string());
/// assert!(text.as_text().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Input {
    /// Plain text input.
    Text(String),
}

impl Input {
    /// The text content, when this input is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
        }
    }
}
