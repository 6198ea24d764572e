/// Seats per room. Registry capacity and the client slot table share it.
pub const MAX_USERS: usize = 4;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Reason carried by `error` when a join is refused at capacity.
pub const ROOM_FULL_REASON: &str = "room-full";
