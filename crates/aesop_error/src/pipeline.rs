//! Modification pipeline error types.

/// Specific error conditions for pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// Neither the session nor the store holds a document under this name
    #[display("Document not found: {}", _0)]
    DocumentNotFound(String),
    /// The edit request failed the pre-prompt screening
    #[display("Request rejected: {}", _0)]
    RequestRejected(String),
    /// The edit request tripped the content filter
    #[display("Unsafe input: {}", _0.join("; "))]
    UnsafeInput(Vec<String>),
    /// The generation backend failed
    #[display("Generation failed: {}", _0)]
    Generation(String),
    /// The normalizer exhausted every extraction strategy
    #[display("Malformed model output: {}", _0)]
    MalformedOutput(String),
    /// Normalized output was not an array even after shape repair
    #[display("Expected an array of turns, got {}", _0)]
    SchemaShape(String),
    /// The validator reported structural violations
    #[display("Schema violations ({}): {}", _0.len(), _0.join("; "))]
    SchemaField(Vec<String>),
    /// The document store could not persist the result
    #[display("Persistence failed: {}", _0)]
    Persistence(String),
}

/// Pipeline error with location tracking.
///
/// # Examples
///
/// ```
/// use aesop_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::DocumentNotFound("dragon_tale".to_string()));
/// assert!(format!("{}", err).contains("Document not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new pipeline error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
