//! Parley Relay - Conversational relay between browser speech and a chat completion API.
//!
//! The browser sends final speech-recognition transcripts over a WebSocket;
//! the relay answers each one with a model-generated reply, keeping a short,
//! self-compressing history per connection.
//!
//! ## Architecture
//!
//! ```text
//! Browser ── transcript ──→ /ws ──→ Dispatcher ──→ Completion API
//!    ↑                                  │
//!    └──────── response ←───────────────┘
//! ```
//!
//! The dispatcher drops transcripts that merely echo the previous reply
//! (speaker output picked up by the microphone) and summarizes older turns
//! once a session's history outgrows its window.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod completion;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod message;
pub mod routes;
pub mod session;
pub mod settings;
pub mod similarity;
pub mod summarizer;
pub mod ws;

// Re-export commonly used types
pub use completion::{
    create_provider, CompletionError, CompletionProvider, CompletionResult, OpenAiCompletion,
};
pub use dispatcher::Dispatcher;
pub use error::RelayError;
pub use history::History;
pub use message::{ChatMessage, InboundEvent, OutboundEvent, ResponsePayload, Role};
pub use routes::{build_router, AppState};
pub use session::{Session, SessionRegistry, SessionState};
pub use settings::{CompletionSettings, SharedSettings};
pub use similarity::{similarity, GateDecision, SimilarityGate};
pub use summarizer::Summarizer;

use axum::Router;
use parley_common::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Wire the dispatcher and shared state for `provider`.
pub fn create_state(config: &Config, provider: Arc<dyn CompletionProvider>) -> AppState {
    let settings = SharedSettings::new(CompletionSettings::from(&config.conversation));
    let dispatcher = Dispatcher::new(provider, settings, &config.conversation);

    AppState::new(Arc::new(dispatcher), config.admin.token.clone())
}

/// Build the full application: routes, optional static files, CORS and tracing.
pub fn build_app(config: &Config, state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = build_router(state);

    if let Some(dir) = &config.server.static_dir {
        tracing::info!(dir = %dir.display(), "Serving static files");
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors).layer(TraceLayer::new_for_http())
}

/// Start the relay HTTP server and run until interrupted.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let addr = SocketAddr::from((
        config.server.bind.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let provider = create_provider(&config.llm)?;
    tracing::info!(
        provider = provider.provider_name(),
        model = %config.llm.model,
        "Completion provider ready"
    );

    let state = create_state(config, provider);
    let app = build_app(config, state);

    tracing::info!("Starting Parley Relay on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Parley Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
