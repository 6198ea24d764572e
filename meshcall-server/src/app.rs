use crate::http::{create_room, health, quick_join, room_info};
use crate::signaling::{SignalingRelay, ws_handler};
use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

pub fn router(relay: SignalingRelay) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/{room_id}", get(ws_handler))
        .route("/rooms", post(create_room))
        .route("/rooms/quick-join", post(quick_join))
        .route("/rooms/{room_id}", get(room_info))
        .route("/health", get(health))
        .layer(cors)
        .with_state(relay)
}
