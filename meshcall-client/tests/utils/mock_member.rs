use super::mock_connection::MockFactory;
use meshcall_client::{CallController, CallState, ClientConfig, PeerSessionManager, SessionError};
use meshcall_core::{MemberId, RoomId, SignalMessage};
use meshcall_server::{RelaySession, SignalingRelay};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub const STATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait until `pred` holds for the published state.
pub async fn wait_for_state(
    state: &mut watch::Receiver<CallState>,
    pred: impl FnMut(&CallState) -> bool,
) -> CallState {
    tokio::time::timeout(STATE_TIMEOUT, state.wait_for(pred))
        .await
        .expect("timed out waiting for call state")
        .expect("session loop dropped its state")
        .clone()
}

/// A session manager wired to an in-process relay, the way the websocket
/// handler wires a real client.
pub struct MeshMember {
    pub id: MemberId,
    pub name: String,
    pub factory: MockFactory,
    pub controller: CallController,
    pub state: watch::Receiver<CallState>,
    task: JoinHandle<Result<(), SessionError>>,
    pump: JoinHandle<()>,
}

impl MeshMember {
    pub async fn join(relay: &SignalingRelay, room: &str, name: &str) -> Self {
        Self::join_with(relay, room, name, MockFactory::new()).await
    }

    pub async fn join_with(
        relay: &SignalingRelay,
        room: &str,
        name: &str,
        factory: MockFactory,
    ) -> Self {
        let (to_client, inbound) = mpsc::unbounded_channel::<SignalMessage>();
        let (outbound, mut from_client) = mpsc::unbounded_channel::<SignalMessage>();

        let mut session = RelaySession::connecting(RoomId::from(room), name, true);
        let id = relay
            .join(&mut session, to_client)
            .expect("relay refused the member");

        let mut config = ClientConfig::new("ws://in-process", RoomId::from(room), name);
        config.sample_interval_ms = 10;
        let (manager, controller) =
            PeerSessionManager::new(&config, Arc::new(factory.clone()), inbound, outbound);
        let state = controller.subscribe();
        let task = tokio::spawn(manager.run());

        let relay = relay.clone();
        let pump = tokio::spawn(async move {
            while let Some(msg) = from_client.recv().await {
                relay.handle_inbound(&session, msg);
            }
            relay.disconnect(&mut session);
        });

        let mut member = Self {
            id,
            name: name.to_owned(),
            factory,
            controller,
            state,
            task,
            pump,
        };
        member.wait_for(|s| s.local_id() == Some(id)).await;
        member
    }

    pub async fn wait_for(&mut self, pred: impl FnMut(&CallState) -> bool) -> CallState {
        wait_for_state(&mut self.state, pred).await
    }

    pub async fn wait_connected_to(&mut self, peer: MemberId) -> CallState {
        self.wait_for(|s| s.peer_state(peer) == Some(meshcall_client::PeerState::Connected))
            .await
    }

    /// Leave and wait until the relay has seen the socket go away.
    pub async fn leave(self) -> Result<(), SessionError> {
        self.controller.leave()?;
        let result = self.task.await.expect("session task panicked");
        self.pump.await.expect("relay pump panicked");
        result
    }
}

/// Poll `check` until it holds or the state timeout runs out.
pub async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + STATE_TIMEOUT;
    while !check().await {
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
