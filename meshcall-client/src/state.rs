use crate::slots::Slot;
use meshcall_core::{MemberId, MemberInfo, RoomId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Coarse status shown to the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Connecting,
    Ready,
    Connected,
    Muted,
    Disconnected,
}

/// Per-pair negotiation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerState {
    New,
    Offering,
    Answering,
    Connected,
    Closed,
}

impl PeerState {
    pub fn is_live(self) -> bool {
        !matches!(self, PeerState::Closed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerView {
    pub name: String,
    pub state: PeerState,
}

/// Everything a presentation layer needs, published on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallState {
    pub status: CallStatus,
    pub room_id: Option<RoomId>,
    pub local: Option<MemberInfo>,
    pub muted: bool,
    pub peers: BTreeMap<MemberId, PeerView>,
    pub slots: Vec<Slot>,
}

impl Default for CallState {
    fn default() -> Self {
        Self {
            status: CallStatus::Connecting,
            room_id: None,
            local: None,
            muted: false,
            peers: BTreeMap::new(),
            slots: Vec::new(),
        }
    }
}

impl CallState {
    pub fn peer_state(&self, peer_id: MemberId) -> Option<PeerState> {
        self.peers.get(&peer_id).map(|p| p.state)
    }

    pub fn slot_of(&self, member_id: MemberId) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|s| s.member_id() == Some(member_id))
    }

    pub fn connected_peers(&self) -> usize {
        self.peers
            .values()
            .filter(|p| p.state == PeerState::Connected)
            .count()
    }

    pub fn local_id(&self) -> Option<MemberId> {
        self.local.as_ref().map(|m| m.user_id)
    }
}
