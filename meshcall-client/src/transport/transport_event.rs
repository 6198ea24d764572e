use crate::speaking::EnergyMeter;
use meshcall_core::{IceCandidate, MemberId};

/// Distinguishes successive connections to the same peer.
pub type ConnectionId = u64;

/// Platform connection state, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl LinkState {
    /// States that end the session for this pair.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LinkState::Disconnected | LinkState::Failed | LinkState::Closed
        )
    }
}

/// Events pushed from connection callbacks into the session manager loop.
#[derive(Debug)]
pub enum TransportEvent {
    StateChanged {
        peer_id: MemberId,
        connection_id: ConnectionId,
        state: LinkState,
    },
    CandidateGenerated {
        peer_id: MemberId,
        connection_id: ConnectionId,
        candidate: IceCandidate,
    },
    /// Remote audio arrived. `meter` is set when the stream can be analysed
    /// locally.
    RemoteTrack {
        peer_id: MemberId,
        connection_id: ConnectionId,
        meter: Option<EnergyMeter>,
    },
}

impl TransportEvent {
    pub fn peer_id(&self) -> MemberId {
        match self {
            TransportEvent::StateChanged { peer_id, .. }
            | TransportEvent::CandidateGenerated { peer_id, .. }
            | TransportEvent::RemoteTrack { peer_id, .. } => *peer_id,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        match self {
            TransportEvent::StateChanged { connection_id, .. }
            | TransportEvent::CandidateGenerated { connection_id, .. }
            | TransportEvent::RemoteTrack { connection_id, .. } => *connection_id,
        }
    }
}
