//! Per-connection conversation state.

use crate::history::History;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Lifecycle of a connection's conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Idle, waiting for a transcript
    Connected,
    /// Completion request in flight
    Awaiting,
    /// Connection closed; state released
    Disconnected,
}

/// Conversation state owned by one connection.
///
/// Created when the socket opens and dropped when it closes. Nothing here is
/// shared with other connections.
#[derive(Debug)]
pub struct Session {
    id: String,
    history: History,
    last_reply: String,
    state: SessionState,
}

impl Session {
    pub fn new(id: impl Into<String>, max_context_messages: usize) -> Self {
        Self {
            id: id.into(),
            history: History::new(max_context_messages),
            last_reply: String::new(),
            state: SessionState::Connected,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// The most recent assistant reply, empty before the first turn.
    pub fn last_reply(&self) -> &str {
        &self.last_reply
    }

    pub fn set_last_reply(&mut self, reply: impl Into<String>) {
        self.last_reply = reply.into();
    }

    pub fn begin_turn(&mut self) {
        self.state = SessionState::Awaiting;
    }

    pub fn finish_turn(&mut self) {
        self.state = SessionState::Connected;
    }

    /// Forget the conversation but keep the connection.
    pub fn reset(&mut self) {
        self.history.clear();
        self.last_reply.clear();
    }

    /// Release conversation state. Terminal.
    pub fn disconnect(&mut self) {
        self.reset();
        self.state = SessionState::Disconnected;
    }
}

/// Ids of currently connected sessions.
///
/// Holds no conversation data; used for readiness and admin reporting.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    active: Arc<RwLock<HashSet<String>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: &str) {
        self.active.write().await.insert(id.to_string());
    }

    pub async fn unregister(&self, id: &str) -> bool {
        self.active.write().await.remove(id)
    }

    pub async fn count(&self) -> usize {
        self.active.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_connected_and_empty() {
        let session = Session::new("abc", 5);
        assert_eq!(session.id(), "abc");
        assert_eq!(session.state(), SessionState::Connected);
        assert!(session.history().is_empty());
        assert!(session.last_reply().is_empty());
    }

    #[test]
    fn test_turn_transitions() {
        let mut session = Session::new("abc", 5);
        session.begin_turn();
        assert_eq!(session.state(), SessionState::Awaiting);
        session.finish_turn();
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn test_disconnect_releases_state() {
        let mut session = Session::new("abc", 5);
        session.set_last_reply("Hello");
        session.disconnect();

        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.last_reply().is_empty());
    }

    #[tokio::test]
    async fn test_registry_tracks_sessions() {
        let registry = SessionRegistry::new();
        registry.register("a").await;
        registry.register("b").await;
        assert_eq!(registry.count().await, 2);

        assert!(registry.unregister("a").await);
        assert!(!registry.unregister("a").await);
        assert_eq!(registry.count().await, 1);
    }
}
