mod member;
mod room;
mod signaling;

pub use member::{MemberId, MemberInfo};
pub use room::RoomId;
pub use signaling::{IceCandidate, IceServerConfig, SdpKind, SessionDescription, SignalMessage};
