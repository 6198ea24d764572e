use crate::engine::{PeerSession, PeerSessionManager};
use crate::error::SessionError;
use crate::state::PeerState;
use crate::transport::{ConnectionRequest, MediaConnection};
use meshcall_core::{MemberId, SdpKind, SessionDescription, SignalMessage};
use tracing::{info, warn};

impl PeerSessionManager {
    /// Start the connection toward a member that was already in the room.
    ///
    /// Only called for entries of our own `peers` message.
    pub async fn establish_as_offerer(
        &mut self,
        peer_id: MemberId,
        peer_name: &str,
    ) -> Result<(), SessionError> {
        if self.has_live_session(peer_id) {
            warn!("Already negotiating with {}, not offering again", peer_id);
            return Ok(());
        }

        self.open_session(peer_id, peer_name).await?;

        let offer = {
            let connection = self.live_connection(peer_id)?;
            connection
                .create_offer()
                .await
                .map_err(|e| SessionError::negotiation(peer_id, e))?
        };

        info!("Sending offer to {} ('{}')", peer_id, peer_name);
        self.send(SignalMessage::Offer {
            to: peer_id,
            from: None,
            data: offer,
        });
        self.set_state(peer_id, PeerState::Offering);
        Ok(())
    }

    /// Answer an offer from a newcomer.
    ///
    /// A live session with the same peer is replaced, so there is never more
    /// than one connection per pair.
    pub async fn establish_as_answerer(
        &mut self,
        peer_id: MemberId,
        peer_name: &str,
        offer: SessionDescription,
    ) -> Result<(), SessionError> {
        if offer.kind != SdpKind::Offer {
            return Err(SessionError::negotiation(
                peer_id,
                anyhow::anyhow!("expected an offer, got {:?}", offer.kind),
            ));
        }

        if self.teardown(peer_id).await {
            warn!("New offer from {} replaces the existing session", peer_id);
        }

        self.open_session(peer_id, peer_name).await?;

        {
            let connection = self.live_connection(peer_id)?;
            connection
                .set_remote_description(offer)
                .await
                .map_err(|e| SessionError::negotiation(peer_id, e))?;
        }
        self.flush_candidates(peer_id).await;
        self.set_state(peer_id, PeerState::Answering);

        let answer = {
            let connection = self.live_connection(peer_id)?;
            connection
                .create_answer()
                .await
                .map_err(|e| SessionError::negotiation(peer_id, e))?
        };

        info!("Sending answer to {} ('{}')", peer_id, peer_name);
        self.send(SignalMessage::Answer {
            to: peer_id,
            from: None,
            data: answer,
        });
        self.set_state(peer_id, PeerState::Connected);
        Ok(())
    }

    /// Apply the answer to our own offer.
    pub async fn complete_as_offerer(
        &mut self,
        peer_id: MemberId,
        answer: SessionDescription,
    ) -> Result<(), SessionError> {
        match self.sessions.get(&peer_id).map(|s| s.state) {
            Some(PeerState::Offering) => {}
            Some(state) => {
                warn!("Ignoring answer from {} in state {:?}", peer_id, state);
                return Ok(());
            }
            None => return Err(SessionError::UnknownPeer(peer_id)),
        }

        {
            let connection = self.live_connection(peer_id)?;
            connection
                .set_remote_description(answer)
                .await
                .map_err(|e| SessionError::negotiation(peer_id, e))?;
        }
        self.flush_candidates(peer_id).await;

        info!("Answer from {} applied", peer_id);
        self.set_state(peer_id, PeerState::Connected);
        Ok(())
    }

    /// Create the connection, attach our audio and give the peer a seat.
    async fn open_session(&mut self, peer_id: MemberId, peer_name: &str) -> Result<(), SessionError> {
        let connection_id = self.allocate_connection_id();
        let request = ConnectionRequest {
            peer_id,
            connection_id,
            ice_servers: self.ice_servers.clone(),
            events: self.transport_tx.clone(),
        };

        let connection = self
            .factory
            .create(request)
            .await
            .map_err(|e| SessionError::negotiation(peer_id, e))?;

        if let Err(e) = connection.attach_local_audio().await {
            let _ = connection.close().await;
            return Err(SessionError::negotiation(peer_id, e));
        }

        self.sessions.insert(
            peer_id,
            PeerSession::new(peer_id, peer_name, connection, connection_id),
        );

        if self.slots.assign(peer_id, peer_name).is_none() {
            warn!("{}", SessionError::SlotsExhausted(peer_id));
        }

        self.publish();
        Ok(())
    }

    pub(super) fn has_live_session(&self, peer_id: MemberId) -> bool {
        self.sessions
            .get(&peer_id)
            .is_some_and(|s| s.state.is_live())
    }

    pub(super) fn live_connection(&self, peer_id: MemberId) -> Result<&dyn MediaConnection, SessionError> {
        self.sessions
            .get(&peer_id)
            .and_then(|s| s.connection())
            .ok_or(SessionError::UnknownPeer(peer_id))
    }
}
