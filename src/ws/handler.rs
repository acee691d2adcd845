//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{stream::SplitSink, stream::SplitStream, SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::battle::ports::Member;
use crate::battle::ActorId;
use crate::battle::position::POSITION_SPECTATOR;
use crate::http::AppError;
use crate::room::{RoomHandle, RoomSubscription};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Direct replies queued per connection
const REPLY_CAPACITY: usize = 32;

fn spectator() -> i32 {
    POSITION_SPECTATOR
}

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Room to join
    pub room: Uuid,
    /// Display name
    pub name: String,
    /// 1..4 player slot, 0 guest, 11 spectator
    #[serde(default = "spectator")]
    pub position: i32,
    /// Main skill / character id
    #[serde(default)]
    pub skill: i32,
}

/// WebSocket upgrade handler
///
/// The room is joined before upgrading so slot conflicts come back as plain
/// HTTP errors.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let room = state
        .rooms
        .get(&query.room)
        .ok_or_else(|| AppError::NotFound(format!("room {}", query.room)))?;
    let (member, subscription) = room.hub.join(query.name, query.position, query.skill)?;
    info!(room_id = %room.id(), actor = member.actor, position = member.position, "WebSocket upgrade for room member");

    let failed_room = room.clone();
    let actor = member.actor;
    Ok(ws
        .on_failed_upgrade(move |e| {
            warn!(actor, error = %e, "WebSocket upgrade failed");
            let _ = failed_room.hub.leave(actor);
        })
        .on_upgrade(move |socket| handle_socket(socket, room, member, subscription)))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    room: RoomHandle,
    member: Member,
    subscription: RoomSubscription,
) {
    let room_id = room.id();
    let actor = member.actor;
    info!(room_id = %room_id, actor, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    let welcome = ServerMsg::Welcome {
        room_id,
        actor,
        position: member.position,
        is_master: room.hub.master() == Some(actor),
        server_time: unix_millis(),
    };
    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(room_id = %room_id, actor, error = %e, "Failed to send welcome");
        let _ = room.hub.leave(actor);
        return;
    }

    run_session(&room, actor, ws_sink, ws_stream, subscription).await;

    // Cleanup on disconnect
    if let Err(e) = room.hub.leave(actor) {
        debug!(room_id = %room_id, actor, error = %e, "Leave on disconnect ignored");
    }
    info!(room_id = %room_id, actor, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    room: &RoomHandle,
    actor: ActorId,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    mut subscription: RoomSubscription,
) {
    let rate_limiter = ConnectionRateLimiter::new();
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMsg>(REPLY_CAPACITY);

    // Spawn writer task: room events and direct replies -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                reply = reply_rx.recv() => match reply {
                    Some(msg) => msg,
                    None => break,
                },
                event = subscription.recv() => match event {
                    Ok(event) => ServerMsg::from(event),
                    Err(RecvError::Lagged(n)) => {
                        warn!(actor, lagged_count = n, "Client lagged, skipping {} room events", n);
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        debug!(actor, "Room event channel closed");
                        break;
                    }
                },
            };
            let closed = matches!(msg, ServerMsg::Closed { .. });
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(actor, error = %e, "WebSocket send failed");
                break;
            }
            if closed {
                let _ = ws_sink.close().await;
                break;
            }
        }
    });

    // Reader loop: WebSocket -> room
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_frame() {
                    warn!(actor, "Rate limited client message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(ClientMsg::Send { msg }) => {
                        if let Err(e) = room.hub.publish(actor, msg) {
                            let reply = ServerMsg::Error {
                                code: e.code().to_string(),
                                message: e.to_string(),
                            };
                            if reply_tx.send(reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(ClientMsg::Ping { t }) => {
                        if reply_tx.send(ServerMsg::Pong { t }).await.is_err() {
                            break;
                        }
                    }
                    Ok(ClientMsg::Leave) => {
                        info!(actor, "Client left the room");
                        break;
                    }
                    Err(e) => {
                        warn!(actor, error = %e, "Failed to parse client message");
                        let reply = ServerMsg::Error {
                            code: "bad_message".to_string(),
                            message: e.to_string(),
                        };
                        if reply_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(actor, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                debug!(actor, "Received ping/pong");
            }
            Ok(Message::Close(_)) => {
                info!(actor, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(actor, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

