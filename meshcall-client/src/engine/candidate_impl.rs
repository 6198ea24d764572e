use crate::engine::PeerSessionManager;
use meshcall_core::{IceCandidate, MemberId};
use tracing::{debug, warn};

impl PeerSessionManager {
    /// Attach a remote candidate, or hold it until the remote description is
    /// in place.
    pub async fn apply_remote_candidate(&mut self, peer_id: MemberId, candidate: IceCandidate) {
        match self.sessions.get_mut(&peer_id) {
            Some(session) if session.state.is_live() && session.remote_description_set => {}
            Some(session) if session.state.is_live() => {
                debug!("Buffering candidate from {} until its description is set", peer_id);
                session.buffered_candidates.push(candidate);
                return;
            }
            Some(_) => {
                debug!("Discarding candidate for closed session with {}", peer_id);
                return;
            }
            None => {
                debug!("Holding candidate from {}, no session yet", peer_id);
                self.pending_candidates
                    .entry(peer_id)
                    .or_default()
                    .push(candidate);
                return;
            }
        }

        self.add_candidate(peer_id, candidate).await;
    }

    /// Mark the remote description applied and drain everything held back,
    /// oldest first.
    pub(super) async fn flush_candidates(&mut self, peer_id: MemberId) {
        let Some(session) = self.sessions.get_mut(&peer_id) else {
            return;
        };
        session.remote_description_set = true;

        let mut queued = self.pending_candidates.remove(&peer_id).unwrap_or_default();
        queued.append(&mut session.buffered_candidates);

        if !queued.is_empty() {
            debug!("Flushing {} buffered candidates for {}", queued.len(), peer_id);
        }
        for candidate in queued {
            self.add_candidate(peer_id, candidate).await;
        }
    }

    async fn add_candidate(&self, peer_id: MemberId, candidate: IceCandidate) {
        let Ok(connection) = self.live_connection(peer_id) else {
            return;
        };
        let Err(e) = connection.add_ice_candidate(candidate).await else {
            return;
        };
        warn!("Failed to add ICE candidate from {}: {:?}", peer_id, e);
    }
}
