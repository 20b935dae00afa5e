//! Aesop - Story Modification Pipeline
//!
//! Aesop lets a user iteratively edit a structured story document (a fixed
//! sequence of game turns with stock listings) through free-text requests,
//! using a generative text model as the rewriting engine. Every request runs
//! the same pipeline: classify, screen, prompt, generate, normalize the model
//! output into strict JSON, validate it against the turn schema, and persist
//! the revised document with a backup of the previous version.
//!
//! # Features
//!
//! - **Modification Pipeline**: classify → prompt → generate → normalize →
//!   validate → persist, with every failure folded into a
//!   [`ModificationResult`] instead of crossing the boundary as an error
//! - **Three Execution Modes**: blocking, background (task orchestrator),
//!   and incrementally-streamed generation
//! - **Task Orchestration**: submit/status/result/cancel plus bounded-fan-out
//!   batches with positional results
//! - **Document Store**: timestamped JSON files with backups and an
//!   append-only edit-request audit trail
//! - **Content Screening**: credential-pattern and denylist filtering before
//!   any prompt text is composed
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use aesop::{
//!     AesopConfig, GeminiDriver, ModificationPipeline, PipelineSession, StoryStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AesopConfig::load()?;
//!     let store = StoryStore::from_config(&config.store)?;
//!     let driver = GeminiDriver::new()?;
//!     let pipeline = ModificationPipeline::new(driver, store);
//!
//!     let mut session = PipelineSession::new("bakery_tale", "economy");
//!     let result = pipeline.modify(&mut session, "rename the bakery to a cafe").await;
//!     println!("success: {}", result.is_success());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Aesop is organized as a workspace with focused crates:
//!
//! - `aesop_core` - Story data model, request/result types, telemetry init
//! - `aesop_interface` - `StoryDriver`/`Streaming`/`ContentScreen` traits
//! - `aesop_error` - Error taxonomy
//! - `aesop_security` - `ContentFilter` request screening
//! - `aesop_storage` - `StoryStore` persistence with backups
//! - `aesop_narrative` - Classifier, normalizer, validator, pipeline
//! - `aesop_tasks` - `TaskOrchestrator` background execution
//! - `aesop_models` - Gemini driver and the scripted `MockDriver`
//!
//! This crate (`aesop`) re-exports everything for convenience and adds
//! [`AesopConfig`], the bundled-defaults configuration loader.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use aesop_core::*;
pub use aesop_error::*;
pub use aesop_interface::*;
pub use aesop_models::*;
pub use aesop_narrative::*;
pub use aesop_security::*;
pub use aesop_storage::*;
pub use aesop_tasks::*;

mod config;

pub use config::AesopConfig;
