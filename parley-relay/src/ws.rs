//! WebSocket channel between the browser and the dispatcher.
//!
//! One socket is one session. Frames of a socket are handled strictly in
//! order, so a session never has two completions in flight; separate sockets
//! run as separate tasks.
//!
//! The socket is not read while a completion is in flight. That is what keeps
//! a session's history updates ordered, so ping and close frames wait for the
//! current reply; do not move transcript handling onto per-frame tasks.

use crate::dispatcher::Dispatcher;
use crate::message::{InboundEvent, OutboundEvent};
use crate::routes::AppState;
use crate::session::Session;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use parley_common::logging::generate_trace_id;
use parley_common::util::truncate_with_ellipsis;
use tokio::sync::mpsc;
use tracing::Instrument;

/// Outbound events buffered per connection.
const OUTBOUND_BUFFER: usize = 32;

const LOG_PREVIEW_CHARS: usize = 80;

/// Upgrade `GET /ws` to a conversation socket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = generate_trace_id();
    let span = parley_common::session_span!(session_id);
    run_session(socket, state, session_id).instrument(span).await;
}

async fn run_session(socket: WebSocket, state: AppState, session_id: String) {
    state.registry.register(&session_id).await;
    let mut session = state.dispatcher.new_session(session_id.clone());
    tracing::info!("Connection opened");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<OutboundEvent>(OUTBOUND_BUFFER);

    let sender_task = tokio::spawn(
        async move {
            while let Some(event) = rx.recv().await {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize outbound event");
                        continue;
                    }
                };

                if let Err(e) = sender.send(Message::Text(json)).await {
                    tracing::warn!(error = %e, "Failed to send WebSocket frame");
                    break;
                }
            }
        }
        .in_current_span(),
    );

    while let Some(frame) = receiver.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "WebSocket receive error");
                break;
            }
        };

        if !process_message(message, &mut session, &state.dispatcher, &tx).await {
            break;
        }
    }

    // Closing the queue lets the sender flush what is left and exit.
    drop(tx);
    if let Err(e) = sender_task.await {
        tracing::warn!(error = %e, "Sender task ended abnormally");
    }

    session.disconnect();
    state.registry.unregister(&session_id).await;
    tracing::info!("Connection closed");
}

/// Handle one frame. Returns `false` when the connection should end.
async fn process_message(
    msg: Message,
    session: &mut Session,
    dispatcher: &Dispatcher,
    tx: &mpsc::Sender<OutboundEvent>,
) -> bool {
    match msg {
        Message::Text(text) => match InboundEvent::parse(&text) {
            Ok(InboundEvent::Transcript(transcript)) => {
                tracing::info!(
                    transcript = %truncate_with_ellipsis(&transcript, LOG_PREVIEW_CHARS),
                    "Transcript received"
                );

                match dispatcher.handle_transcript(session, &transcript).await {
                    Some(payload) => tx.send(OutboundEvent::Response(payload)).await.is_ok(),
                    None => true,
                }
            }
            Ok(InboundEvent::Clear) => {
                session.reset();
                tracing::info!("Conversation cleared");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rejected inbound frame");
                tx.send(OutboundEvent::Error {
                    message: e.to_string(),
                })
                .await
                .is_ok()
            }
        },
        Message::Binary(data) => {
            tracing::debug!(bytes = data.len(), "Ignoring binary frame");
            true
        }
        // Answered by axum
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!("Close frame received");
            false
        }
    }
}
