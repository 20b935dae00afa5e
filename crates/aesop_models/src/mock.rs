//! Scripted driver for tests and offline runs.

use aesop_core::{GenerateRequest, GenerateResponse, Output};
use aesop_error::{AesopResult, ModelsError, ModelsErrorKind};
use aesop_interface::{FinishReason, StoryDriver, StreamChunk, Streaming};
use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Characters per streamed chunk.
const CHUNK_CHARS: usize = 16;

/// Driver that replays a queued script instead of calling an API.
///
/// Each `generate` or `generate_stream` call consumes the next scripted
/// entry; an exhausted script is an error, so a test that makes more calls
/// than it scripted fails loudly. Streamed responses are cut into fixed-size
/// chunks with a terminal `Stop` marker.
///
/// # Examples
///
/// ```
/// use aesop_core::{GenerateRequest, Message};
/// use aesop_interface::StoryDriver;
/// use aesop_models::MockDriver;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let driver = MockDriver::new()
///     .with_response("first reply")
///     .with_failure("simulated outage");
///
/// let request = GenerateRequest {
///     messages: vec![Message::user("hello")],
///     ..Default::default()
/// };
/// assert_eq!(driver.generate(&request).await?.text(), "first reply");
/// assert!(driver.generate(&request).await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockDriver {
    script: Mutex<VecDeque<Result<String, String>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockDriver {
    /// A driver with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Queue a failure with the given message.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Err(message.into()));
        self
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many generate calls this driver has served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next_scripted(&self) -> AesopResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let entry = self.script.lock().unwrap().pop_front();
        match entry {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ModelsError::new(ModelsErrorKind::Api(message)).into()),
            None => Err(ModelsError::new(ModelsErrorKind::Api(
                "mock script exhausted".to_string(),
            ))
            .into()),
        }
    }
}

#[async_trait]
impl StoryDriver for MockDriver {
    async fn generate(&self, _req: &GenerateRequest) -> AesopResult<GenerateResponse> {
        let text = self.next_scripted().await?;
        Ok(GenerateResponse {
            outputs: vec![Output::Text(text)],
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

#[async_trait]
impl Streaming for MockDriver {
    async fn generate_stream(
        &self,
        _req: &GenerateRequest,
    ) -> AesopResult<Pin<Box<dyn Stream<Item = AesopResult<StreamChunk>> + Send>>> {
        let text = self.next_scripted().await?;
        let chunks = chunk_text(&text);
        Ok(Box::pin(stream::iter(chunks.into_iter().map(Ok))))
    }
}

/// Cut text into fixed-size chunks, the last one marked final.
fn chunk_text(text: &str) -> Vec<StreamChunk> {
    let chars: Vec<char> = text.chars().collect();
    let pieces: Vec<String> = chars
        .chunks(CHUNK_CHARS)
        .map(|piece| piece.iter().collect())
        .collect();

    if pieces.is_empty() {
        return vec![StreamChunk::final_text("", FinishReason::Stop)];
    }

    let last = pieces.len() - 1;
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            if i == last {
                StreamChunk::final_text(piece, FinishReason::Stop)
            } else {
                StreamChunk::text(piece)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aesop_core::Message;
    use futures_util::StreamExt;

    fn request() -> GenerateRequest {
        GenerateRequest {
            messages: vec![Message::user("hello")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn responses_replay_in_order() {
        let driver = MockDriver::new().with_response("one").with_response("two");
        assert_eq!(driver.generate(&request()).await.unwrap().text(), "one");
        assert_eq!(driver.generate(&request()).await.unwrap().text(), "two");
        assert_eq!(driver.calls(), 2);
    }

    #[tokio::test]
    async fn exhausted_script_errors() {
        let driver = MockDriver::new();
        let err = driver.generate(&request()).await.unwrap_err();
        assert!(err.to_string().contains("mock script exhausted"));
    }

    #[tokio::test]
    async fn queued_failure_surfaces() {
        let driver = MockDriver::new().with_failure("simulated outage");
        let err = driver.generate(&request()).await.unwrap_err();
        assert!(err.to_string().contains("simulated outage"));
    }

    #[tokio::test]
    async fn stream_concatenates_to_full_text() {
        let text = "a response long enough to span several chunks of the stream";
        let driver = MockDriver::new().with_response(text);
        let mut stream = driver.generate_stream(&request()).await.unwrap();

        let mut collected = String::new();
        let mut finals = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            if chunk.is_final {
                finals += 1;
            }
            collected.push_str(chunk.content.as_text().unwrap());
        }
        assert_eq!(collected, text);
        assert_eq!(finals, 1);
    }

    #[tokio::test]
    async fn empty_response_still_sends_final_chunk() {
        let driver = MockDriver::new().with_response("");
        let mut stream = driver.generate_stream(&request()).await.unwrap();
        let chunk = stream.next().await.unwrap().unwrap();
        assert!(chunk.is_final);
        assert_eq!(chunk.finish_reason, Some(FinishReason::Stop));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn delay_is_applied() {
        let driver = MockDriver::new()
            .with_response("slow")
            .with_delay(Duration::from_millis(20));
        let start = std::time::Instant::now();
        driver.generate(&request()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
