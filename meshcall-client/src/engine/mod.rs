use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::slots::SlotAllocator;
use crate::speaking::{EnergyMeter, SpeakingDetector};
use crate::state::{CallState, CallStatus, PeerState, PeerView};
use crate::transport::{ConnectionFactory, ConnectionId, MediaConnection, TransportEvent};
use meshcall_core::{IceCandidate, IceServerConfig, MemberId, MemberInfo, RoomId, SignalMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

mod candidate_impl;
mod establish_impl;
mod handle_signal_impl;
mod handle_transport_impl;
mod speaking_impl;
mod teardown_impl;

/// Local requests into the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetMuted(bool),
    Leave,
}

/// Connection to one remote member.
pub struct PeerSession {
    pub remote_id: MemberId,
    pub remote_name: String,
    pub state: PeerState,
    connection: Option<Box<dyn MediaConnection>>,
    connection_id: ConnectionId,
    remote_description_set: bool,
    buffered_candidates: Vec<IceCandidate>,
    meter: Option<EnergyMeter>,
}

impl PeerSession {
    fn new(
        remote_id: MemberId,
        remote_name: &str,
        connection: Box<dyn MediaConnection>,
        connection_id: ConnectionId,
    ) -> Self {
        Self {
            remote_id,
            remote_name: remote_name.to_owned(),
            state: PeerState::New,
            connection: Some(connection),
            connection_id,
            remote_description_set: false,
            buffered_candidates: Vec::new(),
            meter: None,
        }
    }

    fn connection(&self) -> Option<&dyn MediaConnection> {
        if self.state.is_live() {
            self.connection.as_deref()
        } else {
            None
        }
    }
}

/// Cloneable handle onto a running [`PeerSessionManager`].
#[derive(Clone)]
pub struct CallController {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<CallState>,
}

impl CallController {
    pub fn subscribe(&self) -> watch::Receiver<CallState> {
        self.state.clone()
    }

    pub fn state(&self) -> CallState {
        self.state.borrow().clone()
    }

    pub fn set_muted(&self, muted: bool) -> Result<(), SessionError> {
        self.commands
            .send(Command::SetMuted(muted))
            .map_err(|_| SessionError::ChannelClosed)
    }

    pub fn leave(&self) -> Result<(), SessionError> {
        self.commands
            .send(Command::Leave)
            .map_err(|_| SessionError::ChannelClosed)
    }
}

/// Owns every pairwise session of this client.
///
/// All session state lives here and is only touched from [`run`](Self::run),
/// one event at a time. Presentation layers read it through [`CallState`].
pub struct PeerSessionManager {
    factory: Arc<dyn ConnectionFactory>,
    display_name: String,
    local: Option<MemberInfo>,
    room_id: Option<RoomId>,
    ice_servers: Vec<IceServerConfig>,

    sessions: HashMap<MemberId, PeerSession>,
    // candidates that arrived before any session for that peer existed
    pending_candidates: HashMap<MemberId, Vec<IceCandidate>>,
    known_names: HashMap<MemberId, String>,
    next_connection_id: ConnectionId,

    slots: SlotAllocator,
    detector: SpeakingDetector,
    local_meter: Option<EnergyMeter>,
    local_speaking: bool,
    muted: bool,
    finished: bool,

    inbound: mpsc::UnboundedReceiver<SignalMessage>,
    outbound: mpsc::UnboundedSender<SignalMessage>,
    commands: mpsc::UnboundedReceiver<Command>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    speaking_tick: Interval,
    state_tx: watch::Sender<CallState>,
}

impl PeerSessionManager {
    /// `inbound` and `outbound` are the two halves of the signaling channel.
    pub fn new(
        config: &ClientConfig,
        factory: Arc<dyn ConnectionFactory>,
        inbound: mpsc::UnboundedReceiver<SignalMessage>,
        outbound: mpsc::UnboundedSender<SignalMessage>,
    ) -> (Self, CallController) {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(CallState::default());

        let mut speaking_tick = tokio::time::interval(config.sample_interval());
        speaking_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let manager = Self {
            local_meter: factory.local_meter(),
            factory,
            display_name: config.display_name.clone(),
            local: None,
            room_id: None,
            ice_servers: config.ice_servers.clone(),
            sessions: HashMap::new(),
            pending_candidates: HashMap::new(),
            known_names: HashMap::new(),
            next_connection_id: 1,
            slots: SlotAllocator::new(),
            detector: SpeakingDetector::new(config.speaking_threshold),
            local_speaking: false,
            muted: false,
            finished: false,
            inbound,
            outbound,
            commands,
            transport_rx,
            transport_tx,
            speaking_tick,
            state_tx,
        };

        let controller = CallController {
            commands: commands_tx,
            state: state_rx,
        };

        (manager, controller)
    }

    /// Process events until the user leaves or the signaling channel drops.
    ///
    /// Every session is torn down before this returns.
    pub async fn run(mut self) -> Result<(), SessionError> {
        info!(
            "Peer session loop started for '{}' (speaking threshold {})",
            self.display_name,
            self.detector.threshold()
        );
        self.publish();

        let result = loop {
            tokio::select! {
                msg = self.inbound.recv() => {
                    match msg {
                        Some(m) => {
                            if let Err(e) = self.handle_signal(m).await {
                                break Err(e);
                            }
                        }
                        None => {
                            warn!("Signaling channel closed, ending all sessions");
                            break Err(SessionError::ChannelClosed);
                        }
                    }
                }

                Some(evt) = self.transport_rx.recv() => {
                    self.handle_transport_event(evt).await;
                }

                cmd = self.commands.recv() => {
                    match cmd {
                        Some(Command::SetMuted(muted)) => self.set_muted(muted),
                        Some(Command::Leave) | None => {
                            info!("Leaving room");
                            break Ok(());
                        }
                    }
                }

                _ = self.speaking_tick.tick() => {
                    self.sample_speaking();
                }
            }
        };

        self.teardown_all().await;
        self.finished = true;
        self.publish();
        info!("Peer session loop finished");

        result
    }

    pub fn local_id(&self) -> Option<MemberId> {
        self.local.as_ref().map(|m| m.user_id)
    }

    pub fn session(&self, peer_id: MemberId) -> Option<&PeerSession> {
        self.sessions.get(&peer_id)
    }

    pub fn slots(&self) -> &SlotAllocator {
        &self.slots
    }

    fn set_muted(&mut self, muted: bool) {
        if self.muted == muted {
            return;
        }
        info!("Microphone {}", if muted { "muted" } else { "unmuted" });
        self.muted = muted;
        self.factory.set_muted(muted);
        self.publish();
    }

    fn send(&self, msg: SignalMessage) {
        let kind = msg.kind();
        if self.outbound.send(msg).is_err() {
            debug!("Signaling channel gone, '{}' not sent", kind);
        }
    }

    fn allocate_connection_id(&mut self) -> ConnectionId {
        let id = self.next_connection_id;
        self.next_connection_id += 1;
        id
    }

    fn peer_name(&self, peer_id: MemberId) -> String {
        self.known_names
            .get(&peer_id)
            .cloned()
            .unwrap_or_else(|| format!("peer-{}", peer_id))
    }

    fn set_state(&mut self, peer_id: MemberId, state: PeerState) {
        if let Some(session) = self.sessions.get_mut(&peer_id) {
            debug!("Peer {}: {:?} -> {:?}", peer_id, session.state, state);
            session.state = state;
        }
        self.publish();
    }

    fn snapshot(&self) -> CallState {
        let peers = self
            .sessions
            .values()
            .map(|s| {
                (
                    s.remote_id,
                    PeerView {
                        name: s.remote_name.clone(),
                        state: s.state,
                    },
                )
            })
            .collect();

        let any_connected = self
            .sessions
            .values()
            .any(|s| s.state == PeerState::Connected);

        let status = if self.finished {
            CallStatus::Disconnected
        } else if self.local.is_none() {
            CallStatus::Connecting
        } else if self.muted {
            CallStatus::Muted
        } else if any_connected {
            CallStatus::Connected
        } else {
            CallStatus::Ready
        };

        CallState {
            status,
            room_id: self.room_id.clone(),
            local: self.local.clone(),
            muted: self.muted,
            peers,
            slots: self.slots.slots().to_vec(),
        }
    }

    fn publish(&self) {
        let next = self.snapshot();
        self.state_tx.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
    }
}
