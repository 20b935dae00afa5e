//! Generation drivers for Aesop.
//!
//! [`GeminiDriver`] is the production driver, talking to the Google Gemini
//! API through `gemini-rust` with an optional requests-per-minute limiter.
//! [`MockDriver`] is a scripted driver for tests and offline runs.
//!
//! The pipeline in `aesop_narrative` depends only on the `StoryDriver` and
//! `Streaming` traits from `aesop_interface`; this crate provides the
//! implementations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod gemini;
mod mock;

pub use gemini::{DEFAULT_MODEL, GeminiDriver};
pub use mock::MockDriver;
