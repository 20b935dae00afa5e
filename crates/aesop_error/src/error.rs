//! Top-level error wrapper types.

use crate::{
    ConfigError, JsonError, ModelsError, NormalizeError, PipelineError, SecurityError,
    StorageError, TaskError,
};

/// The foundation error enum aggregating every domain wrapper.
///
/// # Examples
///
/// ```
/// use aesop_error::{AesopError, StorageError, StorageErrorKind};
///
/// let storage_err = StorageError::new(StorageErrorKind::NotFound("tale".into()));
/// let err: AesopError = storage_err.into();
/// assert!(format!("{}", err).contains("Storage Error"));
/// ```
#[derive(Debug, Clone, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum AesopErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Document store error
    #[from(StorageError)]
    Storage(StorageError),
    /// Response normalization error
    #[from(NormalizeError)]
    Normalize(NormalizeError),
    /// Modification pipeline error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Task orchestrator error
    #[from(TaskError)]
    Task(TaskError),
    /// Content screening error
    #[from(SecurityError)]
    Security(SecurityError),
    /// Generation backend error
    #[from(ModelsError)]
    Models(ModelsError),
}

/// Aesop error with kind discrimination.
///
/// Results from background tasks are cloned out of the registry on read, so
/// the whole error chain stays `Clone`.
///
/// # Examples
///
/// ```
/// use aesop_error::{AesopResult, ConfigError};
///
/// fn might_fail() -> AesopResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Aesop Error: {}", _0)]
pub struct AesopError(Box<AesopErrorKind>);

impl AesopError {
    /// Create a new error from a kind.
    pub fn new(kind: AesopErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &AesopErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to AesopErrorKind
impl<T> From<T> for AesopError
where
    T: Into<AesopErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for aesop operations.
///
/// # Examples
///
/// ```
/// use aesop_error::{AesopResult, JsonError};
///
/// fn parse_payload() -> AesopResult<String> {
///     Err(JsonError::new("unexpected end of input"))?
/// }
/// ```
pub type AesopResult<T> = std::result::Result<T, AesopError>;
