mod local_audio;
pub mod opus_codec;
mod rtc_connection;
mod transport_event;

pub use local_audio::LocalAudio;
pub use opus_codec::{AudioDecoder, DecoderFactory, OpusDecoder, OpusEncoder, opus_decoder_factory};
pub use rtc_connection::{RtcConnection, RtcConnectionFactory};
pub use transport_event::{ConnectionId, LinkState, TransportEvent};

use crate::speaking::EnergyMeter;
use anyhow::Result;
use async_trait::async_trait;
use meshcall_core::{IceCandidate, IceServerConfig, MemberId, SessionDescription};
use tokio::sync::mpsc;

/// Everything a factory needs to build one pairwise connection.
pub struct ConnectionRequest {
    pub peer_id: MemberId,
    pub connection_id: ConnectionId,
    pub ice_servers: Vec<IceServerConfig>,
    /// Callbacks of the new connection report here.
    pub events: mpsc::UnboundedSender<TransportEvent>,
}

/// One negotiated peer-to-peer media connection.
#[async_trait]
pub trait MediaConnection: Send + Sync {
    async fn attach_local_audio(&self) -> Result<()>;

    /// Generate an offer and install it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Generate an answer and install it as the local description.
    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn release_local_tracks(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn create(&self, request: ConnectionRequest) -> Result<Box<dyn MediaConnection>>;

    /// Gate the shared outbound audio.
    fn set_muted(&self, _muted: bool) {}

    /// Energy of the local microphone, if the factory has one.
    fn local_meter(&self) -> Option<EnergyMeter> {
        None
    }
}
