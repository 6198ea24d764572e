use crate::engine::PeerSessionManager;
use crate::error::SessionError;
use meshcall_core::{MemberInfo, SignalMessage};
use tracing::{debug, error, info, warn};

impl PeerSessionManager {
    /// Apply one message from the relay.
    ///
    /// Per-pair failures are logged and end only that pair. An `Err` return
    /// means the whole call is over.
    pub async fn handle_signal(&mut self, msg: SignalMessage) -> Result<(), SessionError> {
        match msg {
            SignalMessage::Welcome {
                user_id,
                room_id,
                ice_servers,
            } => {
                info!(
                    "Joined room {} as member {} ('{}')",
                    room_id, user_id, self.display_name
                );
                if !ice_servers.is_empty() {
                    self.ice_servers = ice_servers;
                }
                self.slots.assign(user_id, &self.display_name);
                self.local = Some(MemberInfo::new(user_id, self.display_name.clone()));
                self.room_id = Some(room_id);
                self.publish();
            }

            SignalMessage::Peers { peers } => {
                info!("Room has {} other members, offering to each", peers.len());
                for peer in peers {
                    self.known_names.insert(peer.user_id, peer.name.clone());
                    let result = self.establish_as_offerer(peer.user_id, &peer.name).await;
                    self.isolate_failure(result).await;
                }
            }

            SignalMessage::PeerJoined { user_id, name } => {
                info!("Member {} ('{}') joined, waiting for its offer", user_id, name);
                self.known_names.insert(user_id, name);
            }

            SignalMessage::PeerLeft { user_id } => {
                info!("Member {} left", user_id);
                self.teardown(user_id).await;
                self.pending_candidates.remove(&user_id);
            }

            SignalMessage::Offer {
                from: Some(from),
                data,
                ..
            } => {
                let name = self.peer_name(from);
                let result = self.establish_as_answerer(from, &name, data).await;
                self.isolate_failure(result).await;
            }

            SignalMessage::Answer {
                from: Some(from),
                data,
                ..
            } => {
                let result = self.complete_as_offerer(from, data).await;
                self.isolate_failure(result).await;
            }

            SignalMessage::IceCandidate {
                from: Some(from),
                data,
                ..
            } => {
                self.apply_remote_candidate(from, data).await;
            }

            SignalMessage::Speaking {
                user_id: Some(user_id),
                speaking,
            } => {
                self.apply_remote_speaking(user_id, speaking);
            }

            SignalMessage::Error { reason } => {
                error!("Server refused the session: {}", reason);
                return Err(SessionError::Rejected(reason));
            }

            other => {
                debug!("Ignoring '{}' without a sender", other.kind());
            }
        }

        Ok(())
    }

    async fn isolate_failure(&mut self, result: Result<(), SessionError>) {
        match result {
            Ok(()) => {}
            Err(SessionError::Negotiation { peer_id, source }) => {
                warn!("Negotiation with {} failed: {:?}", peer_id, source);
                self.teardown(peer_id).await;
            }
            Err(e) => warn!("{}", e),
        }
    }
}
