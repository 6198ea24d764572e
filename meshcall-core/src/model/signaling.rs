use crate::model::member::{MemberId, MemberInfo};
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Session description as exchanged by browsers (`{type, sdp}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Network-path candidate in the browser `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        default,
        rename = "sdpMLineIndex",
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

/// Signaling envelope, discriminated by `type`.
///
/// `offer`, `answer` and `ice-candidate` are addressed with `to`; the relay
/// overwrites `from` with the sender's own id before forwarding, whatever the
/// client put there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    Welcome {
        user_id: MemberId,
        room_id: RoomId,
        #[serde(default)]
        ice_servers: Vec<IceServerConfig>,
    },
    Peers {
        peers: Vec<MemberInfo>,
    },
    PeerJoined {
        user_id: MemberId,
        name: String,
    },
    PeerLeft {
        user_id: MemberId,
    },
    Offer {
        to: MemberId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<MemberId>,
        data: SessionDescription,
    },
    Answer {
        to: MemberId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<MemberId>,
        data: SessionDescription,
    },
    IceCandidate {
        to: MemberId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<MemberId>,
        data: IceCandidate,
    },
    Speaking {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<MemberId>,
        speaking: bool,
    },
    Error {
        reason: String,
    },
}

impl SignalMessage {
    /// Recipient of a peer-addressed message, `None` for everything else.
    pub fn relay_target(&self) -> Option<MemberId> {
        match self {
            SignalMessage::Offer { to, .. }
            | SignalMessage::Answer { to, .. }
            | SignalMessage::IceCandidate { to, .. } => Some(*to),
            _ => None,
        }
    }

    /// Overwrite the sender field on peer-addressed and speaking messages.
    pub fn stamp_sender(&mut self, sender: MemberId) {
        match self {
            SignalMessage::Offer { from, .. }
            | SignalMessage::Answer { from, .. }
            | SignalMessage::IceCandidate { from, .. } => *from = Some(sender),
            SignalMessage::Speaking { user_id, .. } => *user_id = Some(sender),
            _ => {}
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SignalMessage::Welcome { .. } => "welcome",
            SignalMessage::Peers { .. } => "peers",
            SignalMessage::PeerJoined { .. } => "peer-joined",
            SignalMessage::PeerLeft { .. } => "peer-left",
            SignalMessage::Offer { .. } => "offer",
            SignalMessage::Answer { .. } => "answer",
            SignalMessage::IceCandidate { .. } => "ice-candidate",
            SignalMessage::Speaking { .. } => "speaking",
            SignalMessage::Error { .. } => "error",
        }
    }
}
