//! Turns transcripts into replies.
//!
//! For each transcript the dispatcher:
//! 1. Drops it if it is a near-copy of the session's last reply
//! 2. Sends system prompt + history + transcript to the completion API
//! 3. Records the turn in the session history (compressing if needed)
//! 4. Returns the reply, or a fixed apology if the API call failed

use crate::completion::CompletionProvider;
use crate::message::{ChatMessage, ResponsePayload};
use crate::session::Session;
use crate::settings::SharedSettings;
use crate::similarity::SimilarityGate;
use crate::summarizer::Summarizer;
use parley_common::util::truncate_with_ellipsis;
use parley_common::ConversationConfig;
use std::sync::Arc;

/// Characters of transcript/reply text included in log lines.
const LOG_PREVIEW_CHARS: usize = 80;

/// Handles transcripts for any number of sessions.
///
/// Holds no per-session data; each call receives the session it acts on.
pub struct Dispatcher {
    provider: Arc<dyn CompletionProvider>,
    settings: SharedSettings,
    gate: SimilarityGate,
    summarizer: Summarizer,
    max_context_messages: usize,
    fallback_response: String,
}

impl Dispatcher {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        settings: SharedSettings,
        config: &ConversationConfig,
    ) -> Self {
        let summarizer = Summarizer::new(provider.clone(), config.max_context_messages)
            .with_max_tokens(config.summary_max_tokens);

        Self {
            provider,
            settings,
            gate: SimilarityGate::new(config.similarity_threshold),
            summarizer,
            max_context_messages: config.max_context_messages,
            fallback_response: config.fallback_response.clone(),
        }
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Create the state for a newly opened connection.
    pub fn new_session(&self, id: impl Into<String>) -> Session {
        Session::new(id, self.max_context_messages)
    }

    /// Process one transcript for `session`.
    ///
    /// Returns `None` when the gate drops the transcript; nothing should be
    /// sent to the client in that case. A failed completion still returns a
    /// payload carrying the fallback reply, and leaves the session untouched.
    pub async fn handle_transcript(
        &self,
        session: &mut Session,
        transcript: &str,
    ) -> Option<ResponsePayload> {
        let session_id = session.id().to_string();

        let decision = self.gate.evaluate(transcript, session.last_reply());
        if !decision.is_pass() {
            tracing::debug!(
                session_id = %session_id,
                score = decision.score(),
                threshold = self.gate.threshold(),
                transcript = %truncate_with_ellipsis(transcript, LOG_PREVIEW_CHARS),
                "Transcript matches last reply, dropping"
            );
            return None;
        }

        session.begin_turn();
        let settings = self.settings.snapshot().await;

        let mut messages = Vec::with_capacity(session.history().len() + 2);
        messages.push(ChatMessage::system(settings.system_prompt));
        messages.extend_from_slice(session.history().messages());
        messages.push(ChatMessage::user(transcript));

        let ai_response = match self.provider.complete(&messages, settings.max_tokens).await {
            Ok(reply) => {
                tracing::info!(
                    session_id = %session_id,
                    context_messages = messages.len(),
                    reply = %truncate_with_ellipsis(&reply, LOG_PREVIEW_CHARS),
                    "Completion received"
                );

                session
                    .history_mut()
                    .append(&session_id, transcript, &reply, &self.summarizer)
                    .await;
                session.set_last_reply(reply.clone());
                reply
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session_id,
                    provider = self.provider.provider_name(),
                    error = %e,
                    "Completion failed, sending fallback reply"
                );
                self.fallback_response.clone()
            }
        };

        session.finish_turn();

        Some(ResponsePayload {
            transcript: transcript.to_string(),
            ai_response,
        })
    }
}
