//! The story modification pipeline.
//!
//! One invocation runs the stages of [`PipelineStage`] strictly in order and
//! always returns a [`ModificationResult`]; errors are folded into `Failure`
//! values rather than propagated, so callers pattern-match instead of
//! catching. Validation failures still return the generated content next to
//! the diagnostics, because malformed-but-present output is more useful to a
//! human editor than nothing.

use crate::{Classifier, PipelineConfig, normalize, prompt, validate};
use aesop_core::{
    Diagnostics, GenerateRequest, Message, ModificationResult, StoryDocument,
};
use aesop_error::{PipelineError, PipelineErrorKind};
use aesop_interface::{ContentScreen, StoryDriver, Streaming};
use aesop_storage::StoryStore;
use futures_util::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Object fields a model sometimes wraps the turn array in.
const WRAPPER_FIELDS: &[&str] = &["story", "turns", "story_data", "data", "content"];

/// Stages of a modification run, in execution order.
///
/// `Failed` is terminal and reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStage {
    /// No run in progress
    Idle,
    /// Resolving the working document
    Loading,
    /// Screening and classifying the request
    Classifying,
    /// Composing the prompt
    Prompting,
    /// Waiting on the generation driver
    Generating,
    /// Extracting structured data from the response
    Normalizing,
    /// Checking the extracted structure
    Validating,
    /// Writing the revised document to the store
    Persisting,
    /// Run finished successfully
    Done,
    /// Run stopped with a failure
    Failed,
}

/// Working state for one story editing conversation.
///
/// The session carries the in-memory document between requests so repeated
/// edits build on each other without a reload, plus the request history that
/// feeds the conversation summary. State lives here, not in the pipeline:
/// one pipeline serves many sessions.
#[derive(Debug, Clone)]
pub struct PipelineSession {
    story_name: String,
    category: String,
    document: Option<StoryDocument>,
    request_history: Vec<String>,
}

impl PipelineSession {
    /// Start a session for a named story.
    pub fn new(story_name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            story_name: story_name.into(),
            category: category.into(),
            document: None,
            request_history: Vec::new(),
        }
    }

    /// Seed the session with an in-memory document, skipping the store load.
    pub fn with_document(mut self, document: StoryDocument) -> Self {
        self.document = Some(document);
        self
    }

    /// The story this session edits.
    pub fn story_name(&self) -> &str {
        &self.story_name
    }

    /// The story's category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The current working document, if one is loaded.
    pub fn document(&self) -> Option<&StoryDocument> {
        self.document.as_ref()
    }

    /// Requests applied in this session, oldest first.
    pub fn request_history(&self) -> &[String] {
        &self.request_history
    }
}

/// Output of the preparation stages, ready for generation.
struct PreparedRequest {
    cleaned: String,
    request: GenerateRequest,
    diagnostics: Diagnostics,
}

/// Runs edit requests through load, classify, prompt, generate, normalize,
/// validate, and persist.
///
/// The pipeline is generic over its generation driver and never retries;
/// retry policy belongs to the task orchestrator or the caller.
pub struct ModificationPipeline<D: StoryDriver> {
    driver: D,
    store: StoryStore,
    screen: Option<Arc<dyn ContentScreen>>,
    classifier: Classifier,
    config: PipelineConfig,
}

impl<D: StoryDriver> ModificationPipeline<D> {
    /// Create a pipeline with the default classifier and configuration.
    pub fn new(driver: D, store: StoryStore) -> Self {
        Self {
            driver,
            store,
            screen: None,
            classifier: Classifier::default(),
            config: PipelineConfig::default(),
        }
    }

    /// Add a content screen; unsafe requests fail before any prompt exists.
    pub fn with_screen(mut self, screen: Arc<dyn ContentScreen>) -> Self {
        self.screen = Some(screen);
        self
    }

    /// Replace the classifier rule table.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the pipeline configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// The generation driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run a modification to completion, waiting for the full response.
    #[tracing::instrument(
        skip(self, session, raw_request),
        fields(story = %session.story_name, request_len = raw_request.len())
    )]
    pub async fn modify(
        &self,
        session: &mut PipelineSession,
        raw_request: &str,
    ) -> ModificationResult {
        let prepared = match self.prepare(session, raw_request).await {
            Ok(prepared) => prepared,
            Err(failure) => return failure,
        };

        tracing::debug!(stage = %PipelineStage::Generating, "Requesting generation");
        let response = match self.driver.generate(&prepared.request).await {
            Ok(response) => response,
            Err(e) => {
                return fail(
                    PipelineErrorKind::Generation(e.to_string()),
                    e.to_string(),
                    None,
                    prepared.diagnostics,
                );
            }
        };

        self.complete(session, prepared, response.text()).await
    }

    /// Run a modification with streaming generation.
    ///
    /// Text chunks are forwarded to `sink` as they arrive, before the run
    /// completes; this is the only operation that produces output early. A
    /// dropped receiver stops the forwarding but not the run.
    #[tracing::instrument(
        skip(self, session, raw_request, sink),
        fields(story = %session.story_name, request_len = raw_request.len())
    )]
    pub async fn modify_streaming(
        &self,
        session: &mut PipelineSession,
        raw_request: &str,
        sink: mpsc::UnboundedSender<String>,
    ) -> ModificationResult
    where
        D: Streaming,
    {
        let prepared = match self.prepare(session, raw_request).await {
            Ok(prepared) => prepared,
            Err(failure) => return failure,
        };

        tracing::debug!(stage = %PipelineStage::Generating, "Requesting streaming generation");
        let mut stream = match self.driver.generate_stream(&prepared.request).await {
            Ok(stream) => stream,
            Err(e) => {
                return fail(
                    PipelineErrorKind::Generation(e.to_string()),
                    e.to_string(),
                    None,
                    prepared.diagnostics,
                );
            }
        };

        let mut full = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => {
                    if let Some(text) = chunk.content.as_text() {
                        full.push_str(text);
                        let _ = sink.send(text.to_string());
                    }
                }
                Err(e) => {
                    return fail(
                        PipelineErrorKind::Generation(e.to_string()),
                        e.to_string(),
                        None,
                        prepared.diagnostics,
                    );
                }
            }
        }

        self.complete(session, prepared, full).await
    }

    /// Loading through prompting: everything before the driver call.
    async fn prepare(
        &self,
        session: &mut PipelineSession,
        raw_request: &str,
    ) -> Result<PreparedRequest, ModificationResult> {
        let mut diagnostics = Diagnostics::default();

        tracing::debug!(stage = %PipelineStage::Loading, "Resolving working document");
        if session.document.is_none() {
            match self.store.load(&session.story_name).await {
                Ok(stored) => session.document = Some(stored.into_document()),
                Err(e) => {
                    return Err(fail(
                        PipelineErrorKind::DocumentNotFound(session.story_name.clone()),
                        e.to_string(),
                        None,
                        diagnostics,
                    ));
                }
            }
        }
        let Some(document) = session.document.clone() else {
            return Err(fail(
                PipelineErrorKind::DocumentNotFound(session.story_name.clone()),
                "session holds no document",
                None,
                diagnostics,
            ));
        };

        tracing::debug!(stage = %PipelineStage::Classifying, "Screening request");
        let cleaned = match &self.screen {
            Some(screen) => {
                let report = screen.check(raw_request);
                if !report.is_safe {
                    return Err(fail(
                        PipelineErrorKind::UnsafeInput(report.issues.clone()),
                        format!("request failed content screening ({})", report.severity),
                        None,
                        diagnostics,
                    ));
                }
                screen.clean(raw_request)
            }
            None => raw_request.trim().to_string(),
        };

        let assessment = self.classifier.screen(&cleaned);
        if let Some(issue) = assessment.issue {
            let guidance = assessment
                .guidance
                .unwrap_or_else(|| "request is outside the editing scope".to_string());
            return Err(fail(
                PipelineErrorKind::RequestRejected(issue.to_string()),
                guidance,
                None,
                diagnostics,
            ));
        }

        let request = self.classifier.classify(&cleaned);
        diagnostics.classification = Some(request.classified_type);
        diagnostics.target_turn = request.target_turn;
        tracing::info!(
            category = %request.classified_type,
            target_turn = ?request.target_turn,
            "Classified edit request"
        );

        tracing::debug!(stage = %PipelineStage::Prompting, "Composing prompt");
        let document_json = match serde_json::to_string_pretty(&document) {
            Ok(json) => json,
            Err(e) => {
                return Err(fail(
                    PipelineErrorKind::Generation(format!(
                        "failed to serialize working document: {e}"
                    )),
                    e.to_string(),
                    Some(document),
                    diagnostics,
                ));
            }
        };

        let summary =
            prompt::conversation_summary(&session.request_history, self.config.history_window);
        let user_prompt = prompt::modification_prompt(&document_json, &request, &summary);

        let generate = GenerateRequest {
            messages: vec![
                Message::system(prompt::system_prompt()),
                Message::user(user_prompt),
            ],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            model: self.config.model.clone(),
        };

        Ok(PreparedRequest {
            cleaned,
            request: generate,
            diagnostics,
        })
    }

    /// Normalizing through persisting: everything after the driver call.
    async fn complete(
        &self,
        session: &mut PipelineSession,
        prepared: PreparedRequest,
        text: String,
    ) -> ModificationResult {
        let PreparedRequest {
            cleaned,
            mut diagnostics,
            ..
        } = prepared;

        if text.trim().is_empty() {
            return fail(
                PipelineErrorKind::Generation("model returned an empty response".to_string()),
                "empty response",
                None,
                diagnostics,
            );
        }

        tracing::debug!(stage = %PipelineStage::Normalizing, response_len = text.len(), "Normalizing response");
        let value = match normalize(&text) {
            Ok(value) => value,
            Err(e) => {
                return fail(
                    PipelineErrorKind::MalformedOutput(preview(&text)),
                    e.to_string(),
                    None,
                    diagnostics,
                );
            }
        };

        tracing::debug!(stage = %PipelineStage::Validating, "Checking structure");
        let value = match repair_shape(value, &mut diagnostics) {
            Ok(value) => value,
            Err(kind) => {
                return fail(kind, preview(&text), None, diagnostics);
            }
        };

        let report = validate(&value);
        diagnostics.violations = report.violations().to_vec();
        for notice in report.notices() {
            diagnostics.notice(notice.clone());
        }

        let serialized = value.to_string();

        if !report.is_valid() {
            // malformed content still goes back to the caller
            let document = serde_json::from_value::<StoryDocument>(value).ok();
            return fail(
                PipelineErrorKind::SchemaField(diagnostics.violations.clone()),
                serialized,
                document,
                diagnostics,
            );
        }

        if value.as_array().is_some_and(|turns| turns.is_empty()) {
            return fail(
                PipelineErrorKind::SchemaShape("an empty array".to_string()),
                serialized,
                None,
                diagnostics,
            );
        }

        let document = match serde_json::from_value::<StoryDocument>(value) {
            Ok(document) => document,
            Err(e) => {
                return fail(
                    PipelineErrorKind::SchemaShape(format!(
                        "an array that does not deserialize ({e})"
                    )),
                    serialized,
                    None,
                    diagnostics,
                );
            }
        };

        tracing::debug!(stage = %PipelineStage::Persisting, "Saving revised document");
        let outcome = match self
            .store
            .save(
                &session.story_name,
                &session.category,
                &document,
                Some(&cleaned),
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                return fail(
                    PipelineErrorKind::Persistence(e.to_string()),
                    e.to_string(),
                    Some(document),
                    diagnostics,
                );
            }
        };
        if let Some(notice) = outcome.notice {
            diagnostics.notice(notice);
        }

        session.document = Some(document.clone());
        session.request_history.push(cleaned);

        tracing::info!(
            stage = %PipelineStage::Done,
            story = %session.story_name,
            turns = document.len(),
            "Modification complete"
        );

        ModificationResult::Success {
            document,
            diagnostics,
        }
    }
}

/// Unwrap a known wrapper object into its inner array, once.
fn repair_shape(value: Value, diagnostics: &mut Diagnostics) -> Result<Value, PipelineErrorKind> {
    if value.is_array() {
        return Ok(value);
    }

    if let Value::Object(ref fields) = value {
        for field in WRAPPER_FIELDS {
            if let Some(inner) = fields.get(*field) {
                if inner.is_array() {
                    diagnostics.notice(format!("unwrapped '{field}' wrapper object"));
                    return Ok(inner.clone());
                }
            }
        }
    }

    Err(PipelineErrorKind::SchemaShape(type_label(&value).to_string()))
}

fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// First hundred characters, for log-safe failure details.
fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}

#[track_caller]
fn fail(
    kind: PipelineErrorKind,
    detail: impl Into<String>,
    document: Option<StoryDocument>,
    diagnostics: Diagnostics,
) -> ModificationResult {
    let detail = detail.into();
    let error = PipelineError::new(kind);
    tracing::warn!(stage = %PipelineStage::Failed, %error, "Pipeline run failed");
    ModificationResult::Failure {
        error: error.into(),
        detail,
        document,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repair_unwraps_known_wrapper() {
        let mut diagnostics = Diagnostics::default();
        let wrapped = json!({"story": [{"turn": 1}]});
        let repaired = repair_shape(wrapped, &mut diagnostics).unwrap();
        assert!(repaired.is_array());
        assert_eq!(diagnostics.notices.len(), 1);
    }

    #[test]
    fn repair_rejects_unknown_object() {
        let mut diagnostics = Diagnostics::default();
        let wrapped = json!({"payload": [{"turn": 1}]});
        assert!(repair_shape(wrapped, &mut diagnostics).is_err());
    }

    #[test]
    fn repair_rejects_wrapper_holding_non_array() {
        let mut diagnostics = Diagnostics::default();
        let wrapped = json!({"content": "just text"});
        assert!(repair_shape(wrapped, &mut diagnostics).is_err());
    }

    #[test]
    fn repair_passes_arrays_through() {
        let mut diagnostics = Diagnostics::default();
        let array = json!([{"turn": 1}]);
        let repaired = repair_shape(array.clone(), &mut diagnostics).unwrap();
        assert_eq!(repaired, array);
        assert!(diagnostics.notices.is_empty());
    }

    #[test]
    fn stage_names_render_snake_case() {
        assert_eq!(PipelineStage::Normalizing.to_string(), "normalizing");
        assert_eq!(PipelineStage::Done.to_string(), "done");
    }
}
