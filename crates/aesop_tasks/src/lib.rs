//! Background task orchestration for pipeline runs.
//!
//! The [`TaskOrchestrator`] tracks units of background work in a registry of
//! task records: submit a future producing a `ModificationResult`, poll its
//! [`TaskStatus`], and collect the result once it is terminal. Batch
//! submission fans out with a bounded admission gate and reports each item's
//! outcome independently.
//!
//! Workers never surface panics to pollers; a crashed worker is recorded as
//! a failed task. Cancellation is advisory: the record flips to `Cancelled`
//! and the worker is aborted best-effort, but a generation call already
//! dispatched may still run to completion with its result discarded.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod orchestrator;

pub use config::OrchestratorConfig;
pub use orchestrator::{TaskId, TaskOrchestrator, TaskStatus};
