//! Trait definitions for the aesop story pipeline.
//!
//! This crate provides the boundaries the pipeline consumes: the generation
//! driver traits and the content screening trait. Implementations live in
//! `aesop_models` and `aesop_security`; the pipeline itself depends only on
//! these traits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ContentScreen, Streaming, StoryDriver};
pub use types::{FinishReason, ScreenReport, Severity, StreamChunk};
