use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{MockFactory, wait_for_state};
use meshcall_client::{ClientConfig, ClientHandle, MeshClient, PeerState, SessionError};
use meshcall_core::RoomId;
use meshcall_core::utils::MAX_USERS;
use std::net::SocketAddr;
use std::sync::Arc;

pub(super) async fn spawn_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = meshcall_server::serve_with(listener, create_test_relay(), std::future::pending()).await;
    });
    addr
}

pub(super) async fn connect(addr: SocketAddr, room: &str, name: &str) -> ClientHandle {
    let config = ClientConfig::new(format!("ws://{addr}"), RoomId::from(room), name);
    let handle = MeshClient::connect(config, Arc::new(MockFactory::new()))
        .await
        .expect("client failed to connect");
    let mut state = handle.subscribe();
    wait_for_state(&mut state, |s| s.local.is_some()).await;
    handle
}

#[tokio::test]
async fn test_two_clients_connect_and_part() {
    init_tracing();
    let addr = spawn_server().await;

    let ann = connect(addr, "ws-room", "ann").await;
    let bob = connect(addr, "ws-room", "bob").await;
    let ann_id = ann.state().local_id().unwrap();
    let bob_id = bob.state().local_id().unwrap();

    let mut bob_state = bob.subscribe();
    let mut ann_state = ann.subscribe();
    wait_for_state(&mut bob_state, |s| s.peer_state(ann_id) == Some(PeerState::Connected)).await;
    let ann_view =
        wait_for_state(&mut ann_state, |s| s.peer_state(bob_id) == Some(PeerState::Connected))
            .await;
    assert_eq!(ann_view.peers[&bob_id].name, "bob");

    ann.leave().unwrap();
    ann.join().await.unwrap();

    let bob_view =
        wait_for_state(&mut bob_state, |s| s.peer_state(ann_id) == Some(PeerState::Closed)).await;
    assert!(bob_view.slot_of(ann_id).is_none());

    bob.leave().unwrap();
    bob.join().await.unwrap();
}

#[tokio::test]
async fn test_fifth_client_is_refused() {
    init_tracing();
    let addr = spawn_server().await;

    let mut seated = Vec::new();
    for i in 0..MAX_USERS {
        seated.push(connect(addr, "full", &format!("m{i}")).await);
    }

    let config = ClientConfig::new(format!("ws://{addr}"), RoomId::from("full"), "late");
    let late = MeshClient::connect(config, Arc::new(MockFactory::new()))
        .await
        .unwrap();

    let err = late.join().await.unwrap_err();
    match err.downcast_ref::<SessionError>() {
        Some(SessionError::Rejected(reason)) => assert_eq!(reason, "room-full"),
        other => panic!("expected a refusal, got {other:?}"),
    }
}
