//! Provider driver error types.

/// Kinds of generation backend errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ModelsErrorKind {
    /// API key environment variable missing or unreadable
    #[display("Missing API key: {}", _0)]
    MissingApiKey(String),
    /// Generic API request failure
    #[display("API request failed: {}", _0)]
    Api(String),
    /// API failure with an extractable HTTP status code
    #[display("API returned HTTP {}: {}", status_code, message)]
    HttpStatus {
        /// HTTP status code reported by the provider
        status_code: u16,
        /// Full error message
        message: String,
    },
    /// Provider rejected the request for quota reasons
    #[display("Rate limited: {}", _0)]
    RateLimited(String),
    /// Internal builder failure while assembling a value
    #[display("Builder error: {}", _0)]
    Builder(String),
}

impl ModelsErrorKind {
    /// Whether this failure is a quota condition (HTTP 429 or explicit rate limit).
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::HttpStatus { status_code, .. } => *status_code == 429,
            _ => false,
        }
    }
}

/// Models error with location tracking.
///
/// # Examples
///
/// ```
/// use aesop_error::{ModelsError, ModelsErrorKind};
///
/// let err = ModelsError::new(ModelsErrorKind::Api("connection reset".to_string()));
/// assert!(format!("{}", err).contains("API request failed"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Models Error: {} at line {} in {}", kind, line, file)]
pub struct ModelsError {
    /// The kind of error that occurred
    pub kind: ModelsErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ModelsError {
    /// Create a new models error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ModelsErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
