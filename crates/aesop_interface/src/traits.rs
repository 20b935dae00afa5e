//! Trait definitions for generation backends and content screening.

use crate::{ScreenReport, StreamChunk};
use aesop_core::{GenerateRequest, GenerateResponse};
use aesop_error::AesopResult;
use async_trait::async_trait;
use futures_util::stream::Stream;
use std::pin::Pin;

/// Core trait that all generation backends must implement.
///
/// This provides the minimal interface for text generation. Streaming is
/// exposed through the optional [`Streaming`] trait.
#[async_trait]
pub trait StoryDriver: Send + Sync {
    /// Generate model output given a request.
    async fn generate(&self, req: &GenerateRequest) -> AesopResult<GenerateResponse>;

    /// Provider name (e.g., "gemini").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "gemini-2.0-flash-lite").
    fn model_name(&self) -> &str;
}

/// Trait for backends that support streaming responses.
#[async_trait]
pub trait Streaming: StoryDriver {
    /// Generate a streaming response.
    ///
    /// Returns a stream that yields chunks as they arrive from the API.
    async fn generate_stream(
        &self,
        req: &GenerateRequest,
    ) -> AesopResult<Pin<Box<dyn Stream<Item = AesopResult<StreamChunk>> + Send>>>;
}

/// Content screening boundary.
///
/// The pipeline runs `check` on every edit request before any prompt text is
/// composed, and feeds `clean`ed text to the classifier and prompt builder.
pub trait ContentScreen: Send + Sync {
    /// Evaluate the text against every screening rule.
    fn check(&self, text: &str) -> ScreenReport;

    /// Strip markup and truncate to the configured cap.
    fn clean(&self, text: &str) -> String;
}
