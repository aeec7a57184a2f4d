//! Chat completion transport
//!
//! The core never talks HTTP itself; it receives an ordered byte stream from
//! a [`ChatTransport`] and reassembles it.

pub mod error;
mod openai;
pub mod types;

pub use error::LlmError;
pub use openai::{OpenAIService, DEFAULT_BASE_URL};
pub use types::{ChatMessage, ChatRequest};

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// Raw response body, delivered in arbitrarily split chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, LlmError>> + Send>>;

/// Common interface for streaming completion providers
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the request and return the response body as a byte stream.
    /// Fails before any byte is delivered on connection or HTTP errors.
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, LlmError> {
        (**self).open_stream(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for transports
pub struct LoggingTransport {
    inner: Arc<dyn ChatTransport>,
    model_id: String,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn ChatTransport>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl ChatTransport for LoggingTransport {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.open_stream(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    "Completion stream opened"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "Completion request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
