use meshcall_core::{MemberId, RoomId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("room {room_id} is full ({capacity} members)")]
    RoomFull { room_id: RoomId, capacity: usize },

    #[error("member {0} is not present in the room")]
    UnknownPeer(MemberId),

    #[error("signaling session is already closed")]
    SessionClosed,
}
