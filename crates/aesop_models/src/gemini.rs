//! Google Gemini driver.
//!
//! One driver wraps one configured model. A request may still override the
//! model through `GenerateRequest.model`; the override gets a transient
//! client for that call. The optional rate limiter is a plain
//! requests-per-minute quota applied ahead of every API call, shared across
//! overrides.

use aesop_core::{GenerateRequest, GenerateResponse, Output, Role};
use aesop_error::{AesopError, AesopResult, ModelsError, ModelsErrorKind};
use aesop_interface::{FinishReason, StoryDriver, StreamChunk, Streaming};
use async_trait::async_trait;
use futures_util::stream::Stream;
use futures_util::{StreamExt, TryStreamExt};
use gemini_rust::generation::model as gemini_model;
use gemini_rust::{Gemini, client::Model};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::pin::Pin;

/// Model used when neither the constructor nor the request names one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Driver for the Google Gemini API.
///
/// # Examples
///
/// ```no_run
/// use aesop_core::{GenerateRequest, Message};
/// use aesop_interface::StoryDriver;
/// use aesop_models::GeminiDriver;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let driver = GeminiDriver::new()?.with_rpm_limit(10);
/// let request = GenerateRequest {
///     messages: vec![Message::user("Rewrite the opening turn.")],
///     ..Default::default()
/// };
/// let response = driver.generate(&request).await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
pub struct GeminiDriver {
    client: Gemini,
    api_key: String,
    model_name: String,
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl std::fmt::Debug for GeminiDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiDriver")
            .field("model_name", &self.model_name)
            .field("rate_limited", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

impl GeminiDriver {
    /// Create a driver for [`DEFAULT_MODEL`].
    ///
    /// Reads the API key from the `GEMINI_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns error if the variable is unset or the HTTP client cannot be
    /// built.
    pub fn new() -> AesopResult<Self> {
        Self::from_env(DEFAULT_MODEL)
    }

    /// Create a driver for a named model, key from `GEMINI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns error if the variable is unset or the HTTP client cannot be
    /// built.
    #[tracing::instrument(name = "gemini_driver_from_env")]
    pub fn from_env(model_name: &str) -> AesopResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            AesopError::from(ModelsError::new(ModelsErrorKind::MissingApiKey(
                "GEMINI_API_KEY".to_string(),
            )))
        })?;
        Self::with_api_key(api_key, model_name)
    }

    /// Create a driver with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn with_api_key(api_key: impl Into<String>, model_name: &str) -> AesopResult<Self> {
        let api_key = api_key.into();
        let client = Self::build_client(&api_key, model_name)?;
        Ok(Self {
            client,
            api_key,
            model_name: model_name.to_string(),
            rate_limiter: None,
        })
    }

    /// Cap API calls at `rpm` requests per minute; zero disables the cap.
    pub fn with_rpm_limit(mut self, rpm: u32) -> Self {
        self.rate_limiter =
            NonZeroU32::new(rpm).map(|rpm| RateLimiter::direct(Quota::per_minute(rpm)));
        self
    }

    /// Convert a model name string to a `gemini-rust` model variant.
    ///
    /// Unrecognized names become `Model::Custom` with the `models/` prefix
    /// the API requires.
    fn model_name_to_enum(name: &str) -> Model {
        match name {
            "gemini-2.5-flash" => Model::Gemini25Flash,
            "gemini-2.5-flash-lite" => Model::Gemini25FlashLite,
            "gemini-2.5-pro" => Model::Gemini25Pro,
            other if other.starts_with("models/") => Model::Custom(other.to_string()),
            other => Model::Custom(format!("models/{other}")),
        }
    }

    fn build_client(api_key: &str, model_name: &str) -> AesopResult<Gemini> {
        Gemini::with_model(api_key, Self::model_name_to_enum(model_name)).map_err(|e| {
            ModelsError::new(ModelsErrorKind::Builder(format!(
                "failed to create Gemini client for {model_name}: {e}"
            )))
            .into()
        })
    }

    /// Map an API error string to a structured kind.
    ///
    /// The SDK reports HTTP failures as text like
    /// `bad response from server; code 503; description: ...`.
    fn parse_api_error(err: impl std::fmt::Display) -> AesopError {
        let message = err.to_string();
        let kind = match Self::extract_status_code(&message) {
            Some(429) => ModelsErrorKind::RateLimited(message),
            Some(status_code) => ModelsErrorKind::HttpStatus {
                status_code,
                message,
            },
            None => ModelsErrorKind::Api(message),
        };
        ModelsError::new(kind).into()
    }

    fn extract_status_code(message: &str) -> Option<u16> {
        let rest = &message[message.find("code ")? + 5..];
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }

    async fn wait_for_quota(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl StoryDriver for GeminiDriver {
    #[tracing::instrument(skip(self, req), fields(model = req.model.as_deref().unwrap_or(&self.model_name)))]
    async fn generate(&self, req: &GenerateRequest) -> AesopResult<GenerateResponse> {
        self.wait_for_quota().await;

        let transient;
        let client = match req.model.as_deref() {
            Some(name) if name != self.model_name => {
                transient = Self::build_client(&self.api_key, name)?;
                &transient
            }
            _ => &self.client,
        };

        let mut builder = client.generate_content();
        let mut system_prompt = None;

        for msg in &req.messages {
            match msg.role {
                Role::System => {
                    if let Some(text) = msg.content.iter().find_map(|input| input.as_text()) {
                        system_prompt = Some(text);
                    }
                }
                Role::User => {
                    for input in &msg.content {
                        if let Some(text) = input.as_text() {
                            builder = builder.with_user_message(text);
                        }
                    }
                }
                Role::Assistant => {
                    if let Some(text) = msg.content.iter().find_map(|input| input.as_text()) {
                        builder = builder.with_model_message(text);
                    }
                }
            }
        }

        if let Some(prompt) = system_prompt {
            builder = builder.with_system_prompt(prompt);
        }
        if let Some(temperature) = req.temperature {
            builder = builder.with_temperature(temperature);
        }
        if let Some(max_tokens) = req.max_tokens {
            builder = builder.with_max_output_tokens(max_tokens as i32);
        }

        let response = builder.execute().await.map_err(Self::parse_api_error)?;

        Ok(GenerateResponse {
            outputs: vec![Output::Text(response.text())],
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl Streaming for GeminiDriver {
    #[tracing::instrument(skip(self, req), fields(model = req.model.as_deref().unwrap_or(&self.model_name)))]
    async fn generate_stream(
        &self,
        req: &GenerateRequest,
    ) -> AesopResult<Pin<Box<dyn Stream<Item = AesopResult<StreamChunk>> + Send>>> {
        self.wait_for_quota().await;

        let transient;
        let client = match req.model.as_deref() {
            Some(name) if name != self.model_name => {
                transient = Self::build_client(&self.api_key, name)?;
                &transient
            }
            _ => &self.client,
        };

        let mut builder = client.generate_content();
        let mut system_prompt = None;

        for msg in &req.messages {
            match msg.role {
                Role::System => {
                    if let Some(text) = msg.content.iter().find_map(|input| input.as_text()) {
                        system_prompt = Some(text);
                    }
                }
                Role::User => {
                    for input in &msg.content {
                        if let Some(text) = input.as_text() {
                            builder = builder.with_user_message(text);
                        }
                    }
                }
                Role::Assistant => {
                    if let Some(text) = msg.content.iter().find_map(|input| input.as_text()) {
                        builder = builder.with_model_message(text);
                    }
                }
            }
        }

        if let Some(prompt) = system_prompt {
            builder = builder.with_system_prompt(prompt);
        }
        if let Some(temperature) = req.temperature {
            builder = builder.with_temperature(temperature);
        }
        if let Some(max_tokens) = req.max_tokens {
            builder = builder.with_max_output_tokens(max_tokens as i32);
        }

        let gemini_stream = builder
            .execute_stream()
            .await
            .map_err(Self::parse_api_error)?;

        let chunk_stream = gemini_stream.into_stream().map(|result| match result {
            Ok(response) => Ok(to_stream_chunk(response)),
            Err(e) => Err(GeminiDriver::parse_api_error(e)),
        });

        Ok(Box::pin(chunk_stream))
    }
}

/// Convert one SDK response chunk into our wire type.
fn to_stream_chunk(response: gemini_model::GenerationResponse) -> StreamChunk {
    let text = response.text();
    let finish_reason = response
        .candidates
        .first()
        .and_then(|candidate| candidate.finish_reason.as_ref())
        .map(|reason| match reason {
            gemini_model::FinishReason::Stop => FinishReason::Stop,
            gemini_model::FinishReason::MaxTokens => FinishReason::Length,
            gemini_model::FinishReason::Safety
            | gemini_model::FinishReason::Recitation
            | gemini_model::FinishReason::Blocklist
            | gemini_model::FinishReason::ProhibitedContent
            | gemini_model::FinishReason::Spii
            | gemini_model::FinishReason::ImageSafety => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        });

    StreamChunk {
        content: Output::Text(text),
        is_final: finish_reason.is_some(),
        finish_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_names_map_to_variants() {
        assert!(matches!(
            GeminiDriver::model_name_to_enum("gemini-2.5-flash"),
            Model::Gemini25Flash
        ));
        assert!(matches!(
            GeminiDriver::model_name_to_enum("gemini-2.5-pro"),
            Model::Gemini25Pro
        ));
    }

    #[test]
    fn unknown_model_names_get_models_prefix() {
        match GeminiDriver::model_name_to_enum("gemini-2.0-flash-lite") {
            Model::Custom(name) => assert_eq!(name, "models/gemini-2.0-flash-lite"),
            _ => panic!("expected Custom variant"),
        }
    }

    #[test]
    fn prefixed_model_names_are_preserved() {
        match GeminiDriver::model_name_to_enum("models/gemini-exp") {
            Model::Custom(name) => assert_eq!(name, "models/gemini-exp"),
            _ => panic!("expected Custom variant"),
        }
    }

    #[test]
    fn status_code_is_extracted_from_error_text() {
        assert_eq!(
            GeminiDriver::extract_status_code(
                "bad response from server; code 503; description: overloaded"
            ),
            Some(503)
        );
        assert_eq!(
            GeminiDriver::extract_status_code("bad response from server; code 429"),
            Some(429)
        );
        assert_eq!(
            GeminiDriver::extract_status_code("connection reset by peer"),
            None
        );
        assert_eq!(
            GeminiDriver::extract_status_code("code unknown"),
            None
        );
    }

    #[test]
    fn quota_errors_are_marked_rate_limited() {
        let err = GeminiDriver::parse_api_error("bad response from server; code 429; description: quota");
        match err.kind() {
            aesop_error::AesopErrorKind::Models(inner) => assert!(inner.kind.is_rate_limit()),
            other => panic!("expected models error, got {other:?}"),
        }
    }

    #[test]
    fn driver_reports_configured_model() {
        let driver = GeminiDriver::with_api_key("test-key", DEFAULT_MODEL).unwrap();
        assert_eq!(driver.model_name(), DEFAULT_MODEL);
        assert_eq!(driver.provider_name(), "gemini");
    }

    #[test]
    fn zero_rpm_disables_the_limiter() {
        let driver = GeminiDriver::with_api_key("test-key", DEFAULT_MODEL)
            .unwrap()
            .with_rpm_limit(0);
        assert!(driver.rate_limiter.is_none());
    }
}
