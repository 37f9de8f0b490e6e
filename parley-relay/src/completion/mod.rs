//! Chat completion backends.
//!
//! The relay only needs one operation from a language model: take an ordered
//! list of role-tagged messages and a token budget, return one reply. This
//! module defines that seam and the OpenAI-compatible implementation.

mod openai;

pub use openai::OpenAiCompletion;

use crate::message::ChatMessage;
use async_trait::async_trait;
use parley_common::LlmConfig;
use std::sync::Arc;

/// Errors from a completion call. Every variant is recoverable by the caller.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion response could not be decoded: {0}")]
    Decode(String),

    #[error("Completion response contained no content")]
    EmptyResponse,

    #[error("Completion provider not configured: {0}")]
    NotConfigured(String),
}

/// Result type for completion calls.
pub type CompletionResult<T> = Result<T, CompletionError>;

/// A chat completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate one reply for `messages`, spending at most `max_tokens`.
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32)
        -> CompletionResult<String>;

    /// Provider name for logs.
    fn provider_name(&self) -> &str;
}

/// Create the completion provider described by the configuration.
pub fn create_provider(config: &LlmConfig) -> CompletionResult<Arc<dyn CompletionProvider>> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| CompletionError::NotConfigured("missing API key".into()))?;

    Ok(Arc::new(OpenAiCompletion::from_config(api_key, config)?))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted provider for exercising callers without a network.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A recorded `complete` call.
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub messages: Vec<ChatMessage>,
        pub max_tokens: u32,
    }

    /// Replays queued outcomes in order and records every request.
    #[derive(Default)]
    pub struct ScriptedProvider {
        outcomes: Mutex<VecDeque<Result<String, u16>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, text: &str) -> Self {
            self.outcomes.lock().unwrap().push_back(Ok(text.to_string()));
            self
        }

        pub fn fail(self, status: u16) -> Self {
            self.outcomes.lock().unwrap().push_back(Err(status));
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            max_tokens: u32,
        ) -> CompletionResult<String> {
            self.calls.lock().unwrap().push(RecordedCall {
                messages: messages.to_vec(),
                max_tokens,
            });

            match self.outcomes.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(status)) => Err(CompletionError::Status {
                    status,
                    body: "scripted failure".into(),
                }),
                None => Err(CompletionError::EmptyResponse),
            }
        }

        fn provider_name(&self) -> &str {
            "scripted"
        }
    }
}
