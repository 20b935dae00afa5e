//! Response normalization error types.

/// Kinds of normalization errors.
///
/// The `Exhausted` variant keeps the full original model text so callers can
/// surface it in diagnostics instead of discarding the output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum NormalizeErrorKind {
    /// Every extraction strategy failed on the model output
    #[display("No parseable array found in model output ({} bytes)", original.len())]
    Exhausted {
        /// The unmodified model text, retained for diagnostics
        original: String,
    },
    /// Model output was empty or whitespace
    #[display("Model output was empty")]
    EmptyOutput,
}

impl NormalizeErrorKind {
    /// The original model text, when this kind retains one.
    pub fn original(&self) -> Option<&str> {
        match self {
            Self::Exhausted { original } => Some(original),
            Self::EmptyOutput => None,
        }
    }
}

/// Normalization error with location tracking.
///
/// # Examples
///
/// ```
/// use aesop_error::{NormalizeError, NormalizeErrorKind};
///
/// let err = NormalizeError::new(NormalizeErrorKind::Exhausted {
///     original: "The model said something chatty.".to_string(),
/// });
/// assert!(format!("{}", err).contains("No parseable array"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Normalize Error: {} at line {} in {}", kind, line, file)]
pub struct NormalizeError {
    /// The kind of error that occurred
    pub kind: NormalizeErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl NormalizeError {
    /// Create a new normalization error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: NormalizeErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
