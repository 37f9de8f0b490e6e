//! Compression of older conversation turns into a single summary message.

use crate::completion::CompletionProvider;
use crate::message::ChatMessage;
use std::sync::Arc;

/// Instruction sent ahead of the turns being summarized.
pub const SUMMARY_INSTRUCTION: &str = "Summarize the following conversation concisely. \
Preserve names, dates, and any facts the user shared about themselves.";

/// Prefix of the synthetic system message that replaces summarized turns.
pub const SUMMARY_PREFIX: &str = "Previous conversation summary: ";

/// Token budget for the summarization request.
pub const DEFAULT_SUMMARY_MAX_TOKENS: u32 = 150;

/// Replaces all but the most recent messages with an LLM-written summary.
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn CompletionProvider>,
    keep_recent: usize,
    max_tokens: u32,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn CompletionProvider>, keep_recent: usize) -> Self {
        Self {
            provider,
            keep_recent,
            max_tokens: DEFAULT_SUMMARY_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Compress `messages` to `[summary, ...recent]`.
    ///
    /// The summary is best-effort: when the API call fails only the recent
    /// messages are returned and the older ones are discarded.
    pub async fn summarize(&self, session_id: &str, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        let split = messages.len().saturating_sub(self.keep_recent);
        let (older, recent) = messages.split_at(split);

        if older.is_empty() {
            return recent.to_vec();
        }

        let transcript = older
            .iter()
            .map(ChatMessage::transcript_line)
            .collect::<Vec<_>>()
            .join("\n");

        let request = [
            ChatMessage::system(SUMMARY_INSTRUCTION),
            ChatMessage::user(transcript),
        ];

        match self.provider.complete(&request, self.max_tokens).await {
            Ok(summary) => {
                tracing::info!(
                    session_id,
                    summarized = older.len(),
                    kept = recent.len(),
                    "Conversation history summarized"
                );

                let mut compressed = Vec::with_capacity(recent.len() + 1);
                compressed.push(ChatMessage::system(format!("{SUMMARY_PREFIX}{summary}")));
                compressed.extend_from_slice(recent);
                compressed
            }
            Err(e) => {
                tracing::warn!(
                    session_id,
                    error = %e,
                    dropped = older.len(),
                    "Summarization failed, truncating history"
                );
                recent.to_vec()
            }
        }
    }
}
