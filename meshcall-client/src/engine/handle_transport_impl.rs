use crate::engine::PeerSessionManager;
use crate::transport::TransportEvent;
use meshcall_core::SignalMessage;
use tracing::{debug, info};

impl PeerSessionManager {
    pub(super) async fn handle_transport_event(&mut self, event: TransportEvent) {
        let peer_id = event.peer_id();

        // events from a connection that has since been replaced or closed
        let current = self
            .sessions
            .get(&peer_id)
            .is_some_and(|s| s.state.is_live() && s.connection_id == event.connection_id());
        if !current {
            debug!("Ignoring stale transport event for {}", peer_id);
            return;
        }

        match event {
            TransportEvent::StateChanged { state, .. } => {
                if state.is_terminal() {
                    info!("Connection to {} is {:?}, tearing down", peer_id, state);
                    self.teardown(peer_id).await;
                } else {
                    debug!("Connection to {} is {:?}", peer_id, state);
                }
            }

            TransportEvent::CandidateGenerated { candidate, .. } => {
                self.send(SignalMessage::IceCandidate {
                    to: peer_id,
                    from: None,
                    data: candidate,
                });
            }

            TransportEvent::RemoteTrack { meter, .. } => {
                debug!("Remote audio from {} (analysed: {})", peer_id, meter.is_some());
                if let Some(session) = self.sessions.get_mut(&peer_id) {
                    session.meter = meter;
                }
            }
        }
    }
}
