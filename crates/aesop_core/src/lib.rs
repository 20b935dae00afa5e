//! Core data types for the aesop story pipeline.
//!
//! This crate provides the foundation data types used across all aesop
//! interfaces: the story document model, modification request and result
//! types, and the generation request/response surface drivers implement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod input;
mod message;
mod modification;
mod output;
mod request;
mod role;
mod story;
mod telemetry;

pub use input::Input;
pub use message::Message;
pub use modification::{
    Diagnostics, ModificationRequest, ModificationResult, ModificationType,
};
pub use output::Output;
pub use request::{GenerateRequest, GenerateResponse};
pub use role::Role;
pub use story::{EmptyDocument, Stock, StoryDocument, Turn};
pub use telemetry::init_telemetry;
