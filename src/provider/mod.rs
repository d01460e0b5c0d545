//! Content generation backends.
//!
//! A provider turns a generation or revision instruction into validated
//! [`QuizPayload`] values. One attempt is made per call; callers decide how a
//! failure is surfaced.

/// OpenAI-compatible chat-completions client.
pub mod openai;
mod prompts;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::quiz::{QuizPayload, schema::SchemaError};

pub use openai::OpenAiProvider;

/// Result alias for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failures raised while talking to a content provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request never produced an HTTP response.
    #[error("provider transport failure: {0}")]
    Transport(String),
    /// The request exceeded the configured timeout.
    #[error("provider request timed out")]
    Timeout,
    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the body, or the raw body.
        message: String,
    },
    /// No API key is configured for the provider.
    #[error("content provider is not configured")]
    NotConfigured,
    /// The provider answered but its payload is unusable.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Source of quiz content.
pub trait ContentProvider: Send + Sync {
    /// Produce `count` regular questions plus an optional bonus question.
    fn generate(&self, count: usize) -> BoxFuture<'static, ProviderResult<QuizPayload>>;

    /// Rewrite `current` according to a free-form administrator instruction.
    fn revise(
        &self,
        current: QuizPayload,
        instruction: String,
    ) -> BoxFuture<'static, ProviderResult<QuizPayload>>;
}
