//! Client side of a mesh audio call: one negotiated connection per remote
//! member, a fixed seat table and a speaking indicator.

pub mod config;
pub mod engine;
pub mod error;
mod mesh_client;
pub mod rooms;
pub mod slots;
pub mod speaking;
pub mod state;
pub mod transport;

pub use config::ClientConfig;
pub use engine::{CallController, Command, PeerSession, PeerSessionManager};
pub use error::SessionError;
pub use mesh_client::{ClientHandle, MeshClient};
pub use rooms::RoomsClient;
pub use slots::{Slot, SlotAllocator, SlotOccupant};
pub use speaking::{EnergyMeter, SpeakingDetector};
pub use state::{CallState, CallStatus, PeerState, PeerView};
pub use transport::{
    ConnectionFactory, ConnectionRequest, LinkState, LocalAudio, MediaConnection, OpusDecoder,
    OpusEncoder, RtcConnectionFactory, TransportEvent, opus_decoder_factory,
};
