use crate::engine::PeerSessionManager;
use meshcall_core::{MemberId, SignalMessage};

impl PeerSessionManager {
    /// One detector tick over the local microphone and every analysed stream.
    pub(super) fn sample_speaking(&mut self) {
        let mut changed = false;

        if let (Some(local_id), Some(meter)) = (self.local_id(), self.local_meter.as_ref()) {
            let level = meter.take();
            let speaking = !self.muted && self.detector.is_speaking(level);
            changed |= self.slots.mark_speaking(local_id, speaking);

            if speaking != self.local_speaking {
                self.local_speaking = speaking;
                self.send(SignalMessage::Speaking {
                    user_id: None,
                    speaking,
                });
            }
        }

        for (peer_id, session) in &self.sessions {
            if let Some(meter) = &session.meter {
                changed |= self
                    .slots
                    .mark_speaking(*peer_id, self.detector.sample(meter));
            }
        }

        if changed {
            self.publish();
        }
    }

    /// Speaking report relayed by the server. Local analysis wins when a
    /// stream is being metered.
    pub(super) fn apply_remote_speaking(&mut self, peer_id: MemberId, speaking: bool) {
        let metered = self
            .sessions
            .get(&peer_id)
            .is_some_and(|s| s.meter.is_some());
        if metered {
            return;
        }
        if self.slots.mark_speaking(peer_id, speaking) {
            self.publish();
        }
    }
}
