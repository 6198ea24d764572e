use crate::room::RoomSnapshot;
use crate::signaling::SignalingRelay;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use meshcall_core::RoomId;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct RoomCode {
    pub room_id: RoomId,
}

/// `GET /rooms/{room_id}`: members in join order.
pub async fn room_info(
    Path(room_id): Path<String>,
    State(relay): State<SignalingRelay>,
) -> Result<Json<RoomSnapshot>, (StatusCode, &'static str)> {
    relay
        .registry()
        .snapshot(&RoomId::from(room_id))
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "room not found"))
}

/// `POST /rooms`: a code no live room uses. The room itself appears on first join.
pub async fn create_room(State(relay): State<SignalingRelay>) -> Json<RoomCode> {
    let room_id = relay.registry().unused_room_id();
    info!("Issued room code {}", room_id);
    Json(RoomCode { room_id })
}

/// `POST /rooms/quick-join`: some public room with a free seat.
pub async fn quick_join(
    State(relay): State<SignalingRelay>,
) -> Result<Json<RoomCode>, (StatusCode, &'static str)> {
    relay
        .registry()
        .find_public_room()
        .map(|room_id| Json(RoomCode { room_id }))
        .ok_or((StatusCode::NOT_FOUND, "no public rooms available"))
}

pub async fn health() -> &'static str {
    "ok"
}
