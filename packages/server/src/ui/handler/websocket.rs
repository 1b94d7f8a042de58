//! WebSocket connection handler.
//!
//! Authentication happens before the upgrade: a presented token must
//! verify or the handshake is rejected; no token at all yields a guest
//! connection. After the upgrade the socket is split into a reader loop
//! (inbound events) and a pusher loop (the connection's outbound queue).

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, RoomId, UserId},
    infrastructure::dto::websocket::{ClientEvent, ServerEvent},
    ui::state::AppState,
    usecase::{JoinRoomError, SendMessageError, TypingError},
};

/// Query parameters for the WebSocket handshake.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let user_id: Option<UserId> = match &query.token {
        Some(token) => match state.auth.verify(token).await {
            Ok(user_id) => Some(user_id),
            Err(e) => {
                tracing::warn!(error = %e, "rejecting connection with invalid token");
                return Err(StatusCode::UNAUTHORIZED);
            }
        },
        None => None,
    };

    let (tx, rx) = mpsc::channel(state.outbound_queue_capacity);
    let connection_id = match state.connect_usecase.execute(user_id, tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "could not register connection");
            return Err(StatusCode::CONFLICT);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id, rx)))
}

/// Drains the connection's outbound queue into the WebSocket sink.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    rx: mpsc::Receiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    let state_clone = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(connection = %connection_id, error = %e, "websocket error");
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    state_clone.registry.touch(&connection_id).await;
                    if let Some(reply) = dispatch(&state_clone, &connection_id, &text).await {
                        if let Err(e) = state_clone
                            .pusher
                            .push_to(&connection_id, &reply.to_json())
                            .await
                        {
                            tracing::debug!(
                                connection = %connection_id,
                                error = %e,
                                "could not push reply"
                            );
                        }
                    }
                }
                Message::Ping(_) | Message::Pong(_) => {
                    state_clone.registry.touch(&connection_id).await;
                }
                Message::Close(_) => {
                    tracing::debug!(connection = %connection_id, "client requested close");
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // If either direction finishes, tear down the other.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.disconnect_usecase.execute(&connection_id).await;
}

/// Event kinds the dispatcher understands, as spelled on the wire.
const KNOWN_EVENT_KINDS: [&str; 6] = [
    "join",
    "leave",
    "message",
    "typing",
    "stopTyping",
    "heartbeat",
];

/// Parse and route one inbound frame. Returns the event to push back to
/// the originating connection, if any. Protocol errors never drop the
/// connection; the client gets an `error` event instead.
async fn dispatch(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    text: &str,
) -> Option<ServerEvent> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            // A frame bearing an unrecognized type is reported as such; a
            // malformed frame of a known type is a bad request.
            let code = match serde_json::from_str::<serde_json::Value>(text) {
                Ok(value) => match value.get("type").and_then(|t| t.as_str()) {
                    Some(kind) if !KNOWN_EVENT_KINDS.contains(&kind) => "unknownEvent",
                    _ => "badRequest",
                },
                Err(_) => "badRequest",
            };
            return Some(ServerEvent::Error {
                code: code.to_string(),
                detail: e.to_string(),
            });
        }
    };

    match event {
        ClientEvent::Join { room_id } => {
            let room_id = match parse_room_id(&room_id) {
                Ok(id) => id,
                Err(reply) => return Some(reply),
            };
            match state.join_usecase.execute(connection_id, &room_id).await {
                Ok(()) => Some(ServerEvent::Ack {
                    event: "join".to_string(),
                    room_id: room_id.to_string(),
                }),
                Err(e) => Some(join_error_reply(e)),
            }
        }
        ClientEvent::Leave { room_id } => {
            let room_id = match parse_room_id(&room_id) {
                Ok(id) => id,
                Err(reply) => return Some(reply),
            };
            match state.leave_usecase.execute(connection_id, &room_id).await {
                Ok(()) => Some(ServerEvent::Ack {
                    event: "leave".to_string(),
                    room_id: room_id.to_string(),
                }),
                Err(e) => Some(ServerEvent::Error {
                    code: "badRequest".to_string(),
                    detail: e.to_string(),
                }),
            }
        }
        ClientEvent::Message {
            room_id,
            payload,
            kind,
            local_id,
        } => {
            let room_id = match parse_room_id(&room_id) {
                Ok(id) => id,
                Err(reply) => return Some(reply),
            };
            match state
                .send_usecase
                .execute(connection_id, &room_id, payload, kind, local_id)
                .await
            {
                Ok(()) => None,
                Err(e) => Some(send_error_reply(e)),
            }
        }
        ClientEvent::Typing { room_id } => {
            let room_id = match parse_room_id(&room_id) {
                Ok(id) => id,
                Err(reply) => return Some(reply),
            };
            match state.typing_usecase.set_typing(connection_id, &room_id).await {
                Ok(()) => None,
                Err(e) => Some(typing_error_reply(e)),
            }
        }
        ClientEvent::StopTyping { room_id } => {
            let room_id = match parse_room_id(&room_id) {
                Ok(id) => id,
                Err(reply) => return Some(reply),
            };
            match state
                .typing_usecase
                .clear_typing(connection_id, &room_id)
                .await
            {
                Ok(()) => None,
                Err(e) => Some(typing_error_reply(e)),
            }
        }
        // Liveness was already refreshed by the touch above.
        ClientEvent::Heartbeat => None,
    }
}

fn parse_room_id(raw: &str) -> Result<RoomId, ServerEvent> {
    RoomId::new(raw).map_err(|e| ServerEvent::Error {
        code: "badRequest".to_string(),
        detail: e.to_string(),
    })
}

fn join_error_reply(e: JoinRoomError) -> ServerEvent {
    let code = match &e {
        JoinRoomError::Forbidden => "forbidden",
        JoinRoomError::RoomNotFound => "notFound",
        JoinRoomError::Storage(_) => "storage",
        JoinRoomError::UnknownConnection => "badRequest",
    };
    ServerEvent::Error {
        code: code.to_string(),
        detail: e.to_string(),
    }
}

fn send_error_reply(e: SendMessageError) -> ServerEvent {
    let code = match &e {
        SendMessageError::NotAMember => "notAMember",
        SendMessageError::InvalidPayload(_) => "invalidPayload",
        SendMessageError::UnknownConnection => "badRequest",
    };
    ServerEvent::Error {
        code: code.to_string(),
        detail: e.to_string(),
    }
}

fn typing_error_reply(e: TypingError) -> ServerEvent {
    let code = match &e {
        TypingError::NotAMember => "notAMember",
        TypingError::UnknownConnection => "badRequest",
    };
    ServerEvent::Error {
        code: code.to_string(),
        detail: e.to_string(),
    }
}
