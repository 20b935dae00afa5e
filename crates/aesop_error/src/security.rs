//! Content screening error types.

/// Kinds of content screening errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SecurityErrorKind {
    /// A configured screening pattern failed to compile
    #[display("Invalid screening pattern '{}': {}", pattern, message)]
    InvalidPattern {
        /// The offending pattern source
        pattern: String,
        /// Regex compile error
        message: String,
    },
    /// Filter configuration is unusable
    #[display("Invalid filter configuration: {}", _0)]
    Configuration(String),
}

/// Security error with location tracking.
///
/// # Examples
///
/// ```
/// use aesop_error::{SecurityError, SecurityErrorKind};
///
/// let err = SecurityError::new(SecurityErrorKind::Configuration("empty cap".to_string()));
/// assert!(format!("{}", err).contains("filter configuration"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Security Error: {} at line {} in {}", kind, line, file)]
pub struct SecurityError {
    /// The kind of error that occurred
    pub kind: SecurityErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl SecurityError {
    /// Create a new security error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SecurityErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
