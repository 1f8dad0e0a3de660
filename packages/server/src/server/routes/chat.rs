//! Bidirectional chat channel.
//!
//! GET /api/chat?token=JWT
//!
//! WebSocket endpoint. Auth rides a `?token=` query param for symmetry with
//! the SSE stream (browser WebSocket constructors cannot set custom headers
//! either). Each connection gets one ChatSession; the loop below only pumps
//! frames - all state lives in the session.

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Extension, Query,
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::common::UserId;
use crate::domains::messaging::session::{error_frame, ChatSession, ClientCommand};
use crate::server::app::AppState;

#[derive(Deserialize)]
pub struct ChatQuery {
    /// JWT token for authentication
    token: String,
}

pub async fn chat_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<ChatQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let claims = state
        .jwt_service
        .verify_token(&query.token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let user_id = claims.user_id();

    Ok(ws.on_upgrade(move |socket| run_chat_connection(state, user_id, socket)))
}

async fn run_chat_connection(state: AppState, user_id: UserId, socket: WebSocket) {
    let (mut outbound, mut inbound) = socket.split();
    let mut session = ChatSession::new(
        user_id,
        state.coordinator.clone(),
        state.rooms.clone(),
        state.user_hub.clone(),
    );

    debug!(user = %user_id, "Chat connection opened");

    loop {
        tokio::select! {
            frame = inbound.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    let reply = match serde_json::from_str::<ClientCommand>(&text) {
                        Ok(command) => session.handle_command(command).await,
                        Err(e) => Some(error_frame("bad_command", &e.to_string())),
                    };
                    if let Some(reply) = reply {
                        if outbound.send(WsMessage::Text(reply.to_string())).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                // Ping/pong is answered by the library
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(user = %user_id, error = %e, "Chat socket error");
                    break;
                }
            },
            event = session.next_event() => match event {
                Some(value) => {
                    if outbound.send(WsMessage::Text(value.to_string())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    // Dropping the session drops every room/user receiver it held - the
    // implicit unsubscribe for this connection
    debug!(user = %user_id, "Chat connection closed");
}
