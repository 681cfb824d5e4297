//! WebSocket upgrade handler

use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::game::{GameState, SessionId};
use crate::http::routes::AppError;
use crate::util::rate_limit::InputRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);

    let session_id = state.sessions.register(peer).map_err(|e| {
        warn!(peer = ?peer, error = %e, "Rejecting WebSocket upgrade");
        AppError::Unavailable(e.to_string())
    })?;

    info!(session_id = %session_id, peer = ?peer, "WebSocket upgrade");

    let failed_state = state.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            error!(session_id = %session_id, error = %e, "WebSocket upgrade failed");
            failed_state.sessions.unregister(&session_id);
        })
        .on_upgrade(move |socket| handle_socket(socket, session_id, state)))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, session_id: SessionId, state: AppState) {
    info!(session_id = %session_id, "New WebSocket connection");

    run_session(session_id, socket, &state).await;

    if let Some(session) = state.sessions.unregister(&session_id) {
        info!(
            session_id = %session_id,
            snapshots_sent = session.snapshots_sent(),
            "WebSocket connection closed"
        );
    }
}

/// Run one game session. Frames are applied strictly in arrival order.
async fn run_session(session_id: SessionId, socket: WebSocket, state: &AppState) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let rate_limiter = InputRateLimiter::new(state.config.input_rate_limit);
    let mut game = GameState::new();

    // Initial state so the client can draw the parked cursor
    if let Err(e) = send_msg(&mut ws_sink, &ServerMsg::State(game.snapshot())).await {
        debug!(session_id = %session_id, error = %e, "Failed to send initial state");
        return;
    }
    state.sessions.record_snapshot(&session_id);

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let reply = match ClientMsg::parse(&text) {
                    // Only steering is throttled; control events always apply
                    Ok(ClientMsg::Move { .. }) if !rate_limiter.check() => {
                        warn!(session_id = %session_id, "Rate limited move message");
                        continue;
                    }
                    Ok(msg) => {
                        debug!(session_id = %session_id, msg = ?msg, "Received event");
                        game.handle(msg).map(ServerMsg::State)
                    }
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "Rejected client message");
                        Some(ServerMsg::from(&e))
                    }
                };

                let Some(reply) = reply else {
                    continue;
                };

                if let Err(e) = send_msg(&mut ws_sink, &reply).await {
                    debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                    break;
                }
                if matches!(reply, ServerMsg::State(_)) {
                    state.sessions.record_snapshot(&session_id);
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(session_id = %session_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(session_id = %session_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
