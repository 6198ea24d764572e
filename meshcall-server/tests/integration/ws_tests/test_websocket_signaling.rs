use futures::{SinkExt, StreamExt};
use meshcall_core::utils::{MAX_USERS, ROOM_FULL_REASON};
use meshcall_core::{MemberId, MemberInfo, SessionDescription, SignalMessage};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::integration::{create_test_relay, init_tracing};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn spawn_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind failed");
    let addr = listener.local_addr().expect("no local addr");
    let app = meshcall_server::router(create_test_relay());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

async fn connect(addr: SocketAddr, room: &str, name: &str) -> Ws {
    let url = format!("ws://{addr}/ws/{room}?name={name}");
    let (ws, _) = connect_async(url).await.expect("ws connect failed");
    ws
}

/// Next signaling message, or `None` once the server closed the socket.
async fn recv(ws: &mut Ws) -> Option<SignalMessage> {
    loop {
        let next = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for signal");
        match next {
            Some(Ok(Message::Text(text))) => {
                return Some(serde_json::from_str(text.as_str()).expect("bad signal json"));
            }
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

async fn send(ws: &mut Ws, msg: &SignalMessage) {
    let json = serde_json::to_string(msg).expect("serialize");
    ws.send(Message::text(json)).await.expect("ws send failed");
}

async fn greeting(ws: &mut Ws) -> (MemberId, Vec<MemberInfo>) {
    let Some(SignalMessage::Welcome { user_id, .. }) = recv(ws).await else {
        panic!("expected welcome");
    };
    let Some(SignalMessage::Peers { peers }) = recv(ws).await else {
        panic!("expected peers");
    };
    (user_id, peers)
}

#[tokio::test]
async fn test_two_members_exchange_offer_over_websocket() {
    init_tracing();
    let addr = spawn_server().await;

    let mut m1 = connect(addr, "r1", "alice").await;
    let (m1_id, m1_peers) = greeting(&mut m1).await;
    assert!(m1_peers.is_empty());

    let mut m2 = connect(addr, "r1", "bob").await;
    let (m2_id, m2_peers) = greeting(&mut m2).await;
    assert_eq!(m2_peers, vec![MemberInfo::new(m1_id, "alice")]);

    assert_eq!(
        recv(&mut m1).await,
        Some(SignalMessage::PeerJoined {
            user_id: m2_id,
            name: "bob".into()
        })
    );

    send(
        &mut m2,
        &SignalMessage::Offer {
            to: m1_id,
            from: Some(MemberId(424242)),
            data: SessionDescription::offer("v=0"),
        },
    )
    .await;

    assert_eq!(
        recv(&mut m1).await,
        Some(SignalMessage::Offer {
            to: m1_id,
            from: Some(m2_id),
            data: SessionDescription::offer("v=0"),
        })
    );

    m2.close(None).await.expect("close failed");

    assert_eq!(
        recv(&mut m1).await,
        Some(SignalMessage::PeerLeft { user_id: m2_id })
    );
}

#[tokio::test]
async fn test_fifth_websocket_gets_room_full() {
    init_tracing();
    let addr = spawn_server().await;

    let mut seated = Vec::new();
    for i in 0..MAX_USERS {
        let mut ws = connect(addr, "busy", &format!("m{i}")).await;
        greeting(&mut ws).await;
        seated.push(ws);
    }

    let mut late = connect(addr, "busy", "late").await;

    assert_eq!(
        recv(&mut late).await,
        Some(SignalMessage::Error {
            reason: ROOM_FULL_REASON.into()
        })
    );
    assert_eq!(recv(&mut late).await, None);
}
