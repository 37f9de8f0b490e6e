//! HTTP API routes.

use crate::dispatcher::Dispatcher;
use crate::error::RelayError;
use crate::session::SessionRegistry;
use crate::ws::ws_handler;
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub registry: SessionRegistry,
    /// Bearer token required by `/admin/*`; open when `None`.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, admin_token: Option<String>) -> Self {
        Self {
            dispatcher,
            registry: SessionRegistry::new(),
            admin_token: admin_token.filter(|t| !t.trim().is_empty()),
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/admin/settings", get(get_settings))
        .route("/admin/system-prompt", put(update_system_prompt))
        .route("/admin/max-tokens", put(update_max_tokens))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        // Conversation channel
        .route("/ws", get(ws_handler))
        .merge(admin)
        .with_state(state)
}

// ============ Health Check ============

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "parley-relay",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "active_sessions": state.registry.count().await
    }))
}

// ============ Admin ============

async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RelayError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    if provided != Some(expected) {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request");
        return Err(RelayError::Unauthorized(
            "missing or invalid admin token".into(),
        ));
    }

    Ok(next.run(request).await)
}

#[derive(Debug, Serialize)]
struct SettingsResponse {
    system_prompt: String,
    max_tokens: u32,
    active_sessions: usize,
}

async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    let settings = state.dispatcher.settings().snapshot().await;

    Json(serde_json::json!({
        "success": true,
        "data": SettingsResponse {
            system_prompt: settings.system_prompt,
            max_tokens: settings.max_tokens,
            active_sessions: state.registry.count().await,
        }
    }))
}

#[derive(Debug, Deserialize)]
struct SystemPromptRequest {
    system_prompt: String,
}

async fn update_system_prompt(
    State(state): State<AppState>,
    body: Result<Json<SystemPromptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let Json(request) = body.map_err(|e| RelayError::InvalidRequest(e.body_text()))?;

    state
        .dispatcher
        .settings()
        .update_system_prompt(request.system_prompt)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true
    })))
}

#[derive(Debug, Deserialize)]
struct MaxTokensRequest {
    max_tokens: u32,
}

async fn update_max_tokens(
    State(state): State<AppState>,
    body: Result<Json<MaxTokensRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let Json(request) = body.map_err(|e| RelayError::InvalidRequest(e.body_text()))?;

    state
        .dispatcher
        .settings()
        .update_max_tokens(request.max_tokens)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true
    })))
}
