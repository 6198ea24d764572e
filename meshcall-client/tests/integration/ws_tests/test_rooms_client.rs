use super::test_client_over_websocket::{connect, spawn_server};
use crate::integration::init_tracing;
use crate::utils::{MockFactory, wait_for_state};
use meshcall_client::{ClientConfig, MeshClient, RoomsClient};
use meshcall_core::RoomId;
use std::sync::Arc;

fn rooms_client(addr: std::net::SocketAddr) -> RoomsClient {
    let config = ClientConfig::new(format!("ws://{addr}"), RoomId::from("unused"), "lookup");
    RoomsClient::new(&config).expect("valid server url")
}

#[tokio::test]
async fn test_create_room_issues_fresh_code() {
    init_tracing();
    let addr = spawn_server().await;
    let rooms = rooms_client(addr);

    let code = rooms.create_room().await.expect("create room failed");

    assert_eq!(code.as_str().len(), 6);
    assert!(code.as_str().chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
}

#[tokio::test]
async fn test_quick_join_finds_only_public_rooms() {
    init_tracing();
    let addr = spawn_server().await;
    let rooms = rooms_client(addr);

    assert_eq!(rooms.quick_join().await.unwrap(), None);

    let mut config = ClientConfig::new(format!("ws://{addr}"), RoomId::from("hidden"), "cas");
    config.public = false;
    let cas = MeshClient::connect(config, Arc::new(MockFactory::new()))
        .await
        .expect("client failed to connect");
    let mut cas_state = cas.subscribe();
    wait_for_state(&mut cas_state, |s| s.local.is_some()).await;
    assert_eq!(rooms.quick_join().await.unwrap(), None);

    let ann = connect(addr, "open-room", "ann").await;
    assert_eq!(
        rooms.quick_join().await.unwrap(),
        Some(RoomId::from("open-room"))
    );

    ann.leave().unwrap();
    ann.join().await.unwrap();
    cas.leave().unwrap();
    cas.join().await.unwrap();
}
