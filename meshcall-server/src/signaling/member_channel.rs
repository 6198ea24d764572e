use meshcall_core::SignalMessage;
use tokio::sync::mpsc;

/// Outbound half of one member's signaling channel.
///
/// Delivery only enqueues; the WebSocket send task drains the queue, so it is
/// safe to call while a room is locked.
pub trait MemberChannel: Send + Sync {
    /// Returns `false` once the receiving side is gone.
    fn deliver(&self, msg: SignalMessage) -> bool;
}

impl MemberChannel for mpsc::UnboundedSender<SignalMessage> {
    fn deliver(&self, msg: SignalMessage) -> bool {
        self.send(msg).is_ok()
    }
}
