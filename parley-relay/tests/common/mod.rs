//! Shared helpers for relay integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parley_common::Config;
use parley_relay::{
    build_app, create_state, AppState, ChatMessage, CompletionError, CompletionProvider,
    CompletionResult,
};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Provider that replays canned replies and records every request.
///
/// `None` entries fail with a 500; an exhausted queue fails too.
#[derive(Default)]
pub struct FakeProvider {
    replies: Mutex<VecDeque<Option<String>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Some(text.to_string()));
        self
    }

    pub fn fail(self) -> Self {
        self.replies.lock().unwrap().push_back(None);
        self
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _max_tokens: u32,
    ) -> CompletionResult<String> {
        self.requests.lock().unwrap().push(messages.to_vec());

        match self.replies.lock().unwrap().pop_front() {
            Some(Some(text)) => Ok(text),
            _ => Err(CompletionError::Status {
                status: 500,
                body: "fake failure".into(),
            }),
        }
    }

    fn provider_name(&self) -> &str {
        "fake"
    }
}

/// Build state and app around `provider` with default configuration.
pub fn test_app(config: &Config, provider: Arc<FakeProvider>) -> (AppState, axum::Router) {
    let state = create_state(config, provider);
    let app = build_app(config, state.clone());
    (state, app)
}

/// Serve the app on an ephemeral local port.
pub async fn spawn_server(provider: Arc<FakeProvider>) -> (AppState, SocketAddr) {
    let config = Config::default();
    let (state, app) = test_app(&config, provider);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (state, addr)
}
