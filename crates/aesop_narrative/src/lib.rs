//! Story modification pipeline for Aesop.
//!
//! This crate turns a free-text edit request and an existing story document
//! into a validated, persisted revision. The pipeline runs a fixed sequence
//! of stages: load the working document, screen and classify the request,
//! compose a prompt, call the generation driver, normalize the model output
//! into a JSON array, validate its structure, and persist the result with a
//! backup of the previous version.
//!
//! # Components
//!
//! - [`Classifier`]: ordered keyword rules that categorize a request
//! - [`normalize`]: extracts a JSON value from noisy model output
//! - [`validate`]: accumulates every structural violation in one pass
//! - [`ModificationPipeline`]: the stage machine tying it all together
//!
//! # Example
//!
//! ```rust,ignore
//! use aesop_narrative::{ModificationPipeline, PipelineSession};
//! use aesop_models::GeminiDriver;
//! use aesop_storage::StoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = GeminiDriver::new()?;
//! let store = StoryStore::new("./stories")?;
//! let pipeline = ModificationPipeline::new(driver, store);
//!
//! let mut session = PipelineSession::new("dragon_tale", "adventure");
//! let result = pipeline.modify(&mut session, "rename Bakery to Cafe").await;
//! println!("success: {}", result.is_success());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classify;
mod config;
mod normalize;
mod pipeline;
mod prompt;
mod validate;

pub use classify::{Classifier, ClassifierRule, RequestAssessment, RequestIssue};
pub use config::PipelineConfig;
pub use normalize::normalize;
pub use pipeline::{ModificationPipeline, PipelineSession, PipelineStage};
pub use prompt::{conversation_summary, modification_prompt, system_prompt};
pub use validate::{ValidationReport, validate};
