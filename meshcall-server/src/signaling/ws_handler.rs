use crate::signaling::{RelaySession, SignalingRelay};
use crate::error::RegistryError;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use meshcall_core::utils::ROOM_FULL_REASON;
use meshcall_core::{RoomId, SignalMessage};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Close code sent after a refused join.
const CLOSE_ROOM_FULL: u16 = 4003;

#[derive(Debug, Deserialize)]
pub struct JoinParams {
    pub name: Option<String>,
    pub public: Option<bool>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(params): Query<JoinParams>,
    State(relay): State<SignalingRelay>,
) -> impl IntoResponse {
    let room_id = RoomId::from(room_id);
    let name = params
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "guest".to_owned());
    let session = RelaySession::connecting(room_id, name, params.public.unwrap_or(true));

    ws.on_upgrade(move |socket| handle_socket(socket, session, relay))
}

async fn handle_socket(socket: WebSocket, mut session: RelaySession, relay: SignalingRelay) {
    info!("New WebSocket connection for room {}", session.room_id());

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<SignalMessage>();

    let member_id = match relay.join(&mut session, tx) {
        Ok(id) => id,
        Err(e) => {
            warn!("Refusing connection to {}: {}", session.room_id(), e);
            let reason = match e {
                RegistryError::RoomFull { .. } => ROOM_FULL_REASON,
                _ => "rejected",
            };
            let refusal = SignalMessage::Error {
                reason: reason.to_owned(),
            };
            if let Ok(json) = serde_json::to_string(&refusal) {
                let _ = sender.send(Message::Text(json.into())).await;
            }
            let _ = sender
                .send(Message::Close(Some(CloseFrame {
                    code: CLOSE_ROOM_FULL,
                    reason: Utf8Bytes::from_static(reason),
                })))
                .await;
            return;
        }
    };

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();
        let session = session.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => {
                            relay.handle_inbound(&session, signal);
                        }
                        Err(e) => warn!("Invalid SignalMessage from {}: {:?}", member_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    relay.disconnect(&mut session);
    info!("WebSocket disconnected: {}", member_id);
}
