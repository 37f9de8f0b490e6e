//! Process-wide completion settings, adjustable at runtime.
//!
//! Every session reads the same settings on each completion, so an update
//! takes effect on the next turn of every connected client.

use parley_common::{ConversationConfig, Error, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Values read by every completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionSettings {
    pub system_prompt: String,
    pub max_tokens: u32,
}

impl From<&ConversationConfig> for CompletionSettings {
    fn from(config: &ConversationConfig) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

/// Shared handle to the live settings.
#[derive(Debug, Clone)]
pub struct SharedSettings {
    inner: Arc<RwLock<CompletionSettings>>,
}

impl SharedSettings {
    pub fn new(settings: CompletionSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the current values.
    pub async fn snapshot(&self) -> CompletionSettings {
        self.inner.read().await.clone()
    }

    /// Replace the system prompt used by all sessions.
    pub async fn update_system_prompt(&self, prompt: impl Into<String>) -> Result<()> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(Error::InvalidInput("system prompt must not be empty".into()));
        }

        let mut settings = self.inner.write().await;
        settings.system_prompt = prompt;
        tracing::info!(system_prompt = %settings.system_prompt, "System prompt updated");
        Ok(())
    }

    /// Replace the reply token budget used by all sessions.
    pub async fn update_max_tokens(&self, max_tokens: u32) -> Result<()> {
        if max_tokens == 0 {
            return Err(Error::InvalidInput("max_tokens must be greater than 0".into()));
        }

        self.inner.write().await.max_tokens = max_tokens;
        tracing::info!(max_tokens, "Max tokens updated");
        Ok(())
    }
}
