use meshcall_core::MemberId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Connection setup with one peer failed. Only that pair is torn down.
    #[error("negotiation with {peer_id} failed: {source}")]
    Negotiation {
        peer_id: MemberId,
        #[source]
        source: anyhow::Error,
    },

    #[error("no session for peer {0}")]
    UnknownPeer(MemberId),

    #[error("signaling channel closed")]
    ChannelClosed,

    #[error("join refused by server: {0}")]
    Rejected(String),

    #[error("no free slot for member {0}")]
    SlotsExhausted(MemberId),
}

impl SessionError {
    pub fn negotiation(peer_id: MemberId, source: anyhow::Error) -> Self {
        SessionError::Negotiation { peer_id, source }
    }
}
