//! Error types for the aesop story pipeline.
//!
//! This crate provides the foundation error types used throughout the aesop
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use aesop_error::{AesopResult, StorageError, StorageErrorKind};
//!
//! fn load_story() -> AesopResult<String> {
//!     Err(StorageError::new(StorageErrorKind::NotFound("dragon_tale".into())))?
//! }
//!
//! match load_story() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod json;
mod models;
mod normalize;
mod pipeline;
mod security;
mod storage;
mod task;
mod error;

pub use config::ConfigError;
pub use json::JsonError;
pub use models::{ModelsError, ModelsErrorKind};
pub use normalize::{NormalizeError, NormalizeErrorKind};
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use security::{SecurityError, SecurityErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use task::{TaskError, TaskErrorKind};
pub use error::{AesopError, AesopErrorKind, AesopResult};
