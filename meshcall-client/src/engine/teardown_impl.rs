use crate::engine::PeerSessionManager;
use crate::state::PeerState;
use meshcall_core::MemberId;
use tracing::{debug, info};

impl PeerSessionManager {
    /// Close the session with `peer_id` and free its seat.
    ///
    /// Returns false when there was nothing live to close; repeated calls are
    /// harmless.
    pub async fn teardown(&mut self, peer_id: MemberId) -> bool {
        let Some(session) = self.sessions.get_mut(&peer_id) else {
            return false;
        };
        if !session.state.is_live() {
            return false;
        }

        session.state = PeerState::Closed;
        session.remote_description_set = false;
        session.buffered_candidates.clear();
        session.meter = None;
        let connection = session.connection.take();

        self.pending_candidates.remove(&peer_id);
        self.slots.release(peer_id);

        if let Some(connection) = connection {
            if let Err(e) = connection.release_local_tracks().await {
                debug!("Releasing tracks for {}: {:?}", peer_id, e);
            }
            if let Err(e) = connection.close().await {
                debug!("Closing connection to {}: {:?}", peer_id, e);
            }
        }

        info!("Session with {} closed", peer_id);
        self.publish();
        true
    }

    pub(super) async fn teardown_all(&mut self) {
        let peers: Vec<MemberId> = self.sessions.keys().copied().collect();
        for peer_id in peers {
            self.teardown(peer_id).await;
        }
        self.pending_candidates.clear();
    }
}
