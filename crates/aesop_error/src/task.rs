//! Task orchestrator error types.

/// Kinds of task registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum TaskErrorKind {
    /// No task registered under this id
    #[display("Unknown task: {}", _0)]
    NotFound(String),
    /// Task has not reached a terminal state yet
    #[display("Task {} is still {}", id, status)]
    NotReady {
        /// Task identifier
        id: String,
        /// Current non-terminal status
        status: String,
    },
    /// Task was cancelled before producing a result
    #[display("Task {} was cancelled", _0)]
    Cancelled(String),
    /// Worker panicked or was torn down mid-flight
    #[display("Task {} worker failed: {}", id, message)]
    WorkerFailed {
        /// Task identifier
        id: String,
        /// Join error description
        message: String,
    },
}

/// Task error with location tracking.
///
/// # Examples
///
/// ```
/// use aesop_error::{TaskError, TaskErrorKind};
///
/// let err = TaskError::new(TaskErrorKind::NotFound("abc123".to_string()));
/// assert!(format!("{}", err).contains("Unknown task"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Task Error: {} at line {} in {}", kind, line, file)]
pub struct TaskError {
    /// The kind of error that occurred
    pub kind: TaskErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TaskError {
    /// Create a new task error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TaskErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
