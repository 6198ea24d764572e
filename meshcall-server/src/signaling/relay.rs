use crate::error::RegistryError;
use crate::room::RoomRegistry;
use crate::signaling::MemberChannel;
use meshcall_core::{IceServerConfig, MemberId, RoomId, SignalMessage};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    Connecting,
    Joined,
    Closed,
}

/// Relay-side state of one signaling connection.
#[derive(Debug, Clone)]
pub struct RelaySession {
    room_id: RoomId,
    name: String,
    public: bool,
    member_id: Option<MemberId>,
    phase: RelayPhase,
}

impl RelaySession {
    pub fn connecting(room_id: RoomId, name: impl Into<String>, public: bool) -> Self {
        Self {
            room_id,
            name: name.into(),
            public,
            member_id: None,
            phase: RelayPhase::Connecting,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn member_id(&self) -> Option<MemberId> {
        self.member_id
    }

    pub fn phase(&self) -> RelayPhase {
        self.phase
    }
}

/// What the relay did with one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Forwarded(MemberId),
    Broadcast(usize),
    Dropped,
}

struct RelayInner {
    registry: RoomRegistry,
    ice_servers: Vec<IceServerConfig>,
}

#[derive(Clone)]
pub struct SignalingRelay {
    inner: Arc<RelayInner>,
}

impl SignalingRelay {
    pub fn new(registry: RoomRegistry, ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                registry,
                ice_servers,
            }),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    /// Admit the connection, greet it with `welcome` + `peers`, then announce
    /// it to the rest of the room.
    ///
    /// The greeting is queued under the room lock, so a concurrent joiner's
    /// `peer-joined` or offer always lands after it.
    ///
    /// Only the newcomer ever receives `peers`, so only the newcomer offers.
    pub fn join<C>(&self, session: &mut RelaySession, channel: C) -> Result<MemberId, RegistryError>
    where
        C: MemberChannel + 'static,
    {
        match (session.phase, session.member_id) {
            (RelayPhase::Connecting, _) => {}
            (RelayPhase::Joined, Some(member_id)) => return Ok(member_id),
            _ => return Err(RegistryError::SessionClosed),
        }

        let ice_servers = self.get_ice_servers();
        let room_id = session.room_id.clone();
        let admission = match self.inner.registry.join_greeted(
            &session.room_id,
            &session.name,
            session.public,
            Box::new(channel),
            |member_id, peers| {
                vec![
                    SignalMessage::Welcome {
                        user_id: member_id,
                        room_id,
                        ice_servers,
                    },
                    SignalMessage::Peers {
                        peers: peers.to_vec(),
                    },
                ]
            },
        ) {
            Ok(admission) => admission,
            Err(e) => {
                session.phase = RelayPhase::Closed;
                return Err(e);
            }
        };

        let member_id = admission.member_id;
        session.member_id = Some(member_id);
        session.phase = RelayPhase::Joined;

        self.inner.registry.broadcast(
            &session.room_id,
            &SignalMessage::PeerJoined {
                user_id: member_id,
                name: session.name.clone(),
            },
            Some(member_id),
        );

        Ok(member_id)
    }

    pub fn handle_inbound(&self, session: &RelaySession, mut msg: SignalMessage) -> RelayOutcome {
        let (RelayPhase::Joined, Some(sender)) = (session.phase, session.member_id) else {
            debug!("Ignoring '{}' on a session that is not joined", msg.kind());
            return RelayOutcome::Dropped;
        };

        match msg {
            SignalMessage::Offer { to, .. }
            | SignalMessage::Answer { to, .. }
            | SignalMessage::IceCandidate { to, .. } => {
                if to == sender {
                    warn!("Member {} addressed '{}' to itself", sender, msg.kind());
                    return RelayOutcome::Dropped;
                }

                msg.stamp_sender(sender);
                let kind = msg.kind();
                match self.inner.registry.send_to(&session.room_id, to, msg) {
                    Ok(()) => {
                        debug!("Relayed '{}' {} -> {}", kind, sender, to);
                        RelayOutcome::Forwarded(to)
                    }
                    Err(e) => {
                        warn!("Dropping '{}' from {}: {}", kind, sender, e);
                        RelayOutcome::Dropped
                    }
                }
            }

            SignalMessage::Speaking { .. } => {
                msg.stamp_sender(sender);
                let delivered = self
                    .inner
                    .registry
                    .broadcast(&session.room_id, &msg, Some(sender));
                RelayOutcome::Broadcast(delivered)
            }

            other => {
                warn!(
                    "Unexpected '{}' from member {}, ignoring",
                    other.kind(),
                    sender
                );
                RelayOutcome::Dropped
            }
        }
    }

    /// Leave the room and tell the remaining members. Safe to call repeatedly.
    pub fn disconnect(&self, session: &mut RelaySession) -> bool {
        let previous = std::mem::replace(&mut session.phase, RelayPhase::Closed);
        let (RelayPhase::Joined, Some(member_id)) = (previous, session.member_id) else {
            return false;
        };

        let Some((room_id, _)) = self.inner.registry.leave(member_id) else {
            return false;
        };

        let notified = self.inner.registry.broadcast(
            &room_id,
            &SignalMessage::PeerLeft { user_id: member_id },
            None,
        );
        info!(
            "Member {} disconnected, notified {} remaining in {}",
            member_id, notified, room_id
        );
        true
    }
}
