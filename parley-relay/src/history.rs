//! Bounded per-session conversation history.

use crate::message::ChatMessage;
use crate::summarizer::Summarizer;

/// Ordered conversation history for one session, oldest first.
///
/// Grows by one user/assistant pair per turn. Once it holds more than
/// `2 * max_context_messages` entries it is compressed back down, so its
/// length never exceeds that bound between turns.
#[derive(Debug, Clone)]
pub struct History {
    messages: Vec<ChatMessage>,
    max_context_messages: usize,
}

impl History {
    pub fn new(max_context_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_context_messages,
        }
    }

    /// Messages in insertion order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Length above which the history is compressed.
    pub const fn capacity(&self) -> usize {
        self.max_context_messages * 2
    }

    /// Record one completed turn, compressing via `summarizer` when over capacity.
    pub async fn append(
        &mut self,
        session_id: &str,
        user_text: &str,
        assistant_text: &str,
        summarizer: &Summarizer,
    ) {
        self.messages.push(ChatMessage::user(user_text));
        self.messages.push(ChatMessage::assistant(assistant_text));

        if self.messages.len() > self.capacity() {
            tracing::debug!(
                session_id,
                length = self.messages.len(),
                capacity = self.capacity(),
                "History over capacity, compressing"
            );
            self.messages = summarizer.summarize(session_id, &self.messages).await;
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
