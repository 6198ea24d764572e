use crate::error::RegistryError;
use crate::room::Room;
use crate::signaling::MemberChannel;
use dashmap::DashMap;
use meshcall_core::utils::MAX_USERS;
use meshcall_core::{MemberId, MemberInfo, RoomId, SignalMessage};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Result of a successful join: the new id and everyone who was already there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub member_id: MemberId,
    pub peers: Vec<MemberInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub public: bool,
    pub capacity: usize,
    pub members: Vec<MemberInfo>,
}

struct RegistryInner {
    rooms: DashMap<RoomId, Room>,
    members: DashMap<MemberId, RoomId>,
    next_id: AtomicU64,
    capacity: usize,
}

/// Room → members mapping shared by every connection handler.
///
/// Each operation holds the room's map entry for its whole critical section,
/// which serializes join/leave/broadcast per room.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                rooms: DashMap::new(),
                members: DashMap::new(),
                next_id: AtomicU64::new(1),
                capacity: MAX_USERS,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Admit a member, creating the room on first join.
    ///
    /// `public` only matters when this join creates the room.
    pub fn join(
        &self,
        room_id: &RoomId,
        name: &str,
        public: bool,
        channel: Box<dyn MemberChannel>,
    ) -> Result<Admission, RegistryError> {
        self.join_greeted(room_id, name, public, channel, |_, _| Vec::new())
    }

    /// Like [`join`](Self::join), but the messages built by `greeting` are
    /// queued on the newcomer's channel before it becomes reachable, so
    /// nothing another member sends can overtake them.
    pub fn join_greeted<F>(
        &self,
        room_id: &RoomId,
        name: &str,
        public: bool,
        channel: Box<dyn MemberChannel>,
        greeting: F,
    ) -> Result<Admission, RegistryError>
    where
        F: FnOnce(MemberId, &[MemberInfo]) -> Vec<SignalMessage>,
    {
        let mut room = self
            .inner
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!("Creating new room: {}", room_id);
                Room::new(room_id.clone(), public)
            });

        if room.len() >= self.inner.capacity {
            return Err(RegistryError::RoomFull {
                room_id: room_id.clone(),
                capacity: self.inner.capacity,
            });
        }

        let member_id = MemberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let peers = room.infos();
        for msg in greeting(member_id, &peers) {
            channel.deliver(msg);
        }
        room.push(member_id, name.to_owned(), channel);
        self.inner.members.insert(member_id, room_id.clone());

        info!(
            "Member {} ('{}') joined room {} ({}/{})",
            member_id,
            name,
            room_id,
            room.len(),
            self.inner.capacity
        );

        Ok(Admission { member_id, peers })
    }

    /// Remove a member. Returns its info and room, `None` if it was already gone.
    pub fn leave(&self, member_id: MemberId) -> Option<(RoomId, MemberInfo)> {
        let (_, room_id) = self.inner.members.remove(&member_id)?;

        let removed = {
            let mut room = self.inner.rooms.get_mut(&room_id)?;
            room.remove(member_id)
        }?;

        if self
            .inner
            .rooms
            .remove_if(&room_id, |_, room| room.is_empty())
            .is_some()
        {
            info!("Room {} is empty, forgetting it", room_id);
        }

        info!("Member {} left room {}", member_id, room_id);
        Some((room_id, removed.info()))
    }

    pub fn list_members(&self, room_id: &RoomId) -> Vec<MemberInfo> {
        self.inner
            .rooms
            .get(room_id)
            .map(|room| room.infos())
            .unwrap_or_default()
    }

    pub fn broadcast(
        &self,
        room_id: &RoomId,
        msg: &SignalMessage,
        exclude: Option<MemberId>,
    ) -> usize {
        let Some(room) = self.inner.rooms.get(room_id) else {
            debug!("Broadcast to unknown room {}", room_id);
            return 0;
        };
        room.broadcast(msg, exclude)
    }

    /// Deliver to one member of `room_id`.
    pub fn send_to(
        &self,
        room_id: &RoomId,
        member_id: MemberId,
        msg: SignalMessage,
    ) -> Result<(), RegistryError> {
        let room = self
            .inner
            .rooms
            .get(room_id)
            .ok_or(RegistryError::UnknownPeer(member_id))?;
        let member = room
            .get(member_id)
            .ok_or(RegistryError::UnknownPeer(member_id))?;

        if member.deliver(msg) {
            Ok(())
        } else {
            Err(RegistryError::UnknownPeer(member_id))
        }
    }

    pub fn snapshot(&self, room_id: &RoomId) -> Option<RoomSnapshot> {
        self.inner.rooms.get(room_id).map(|room| RoomSnapshot {
            room_id: room.id.clone(),
            public: room.public,
            capacity: self.inner.capacity,
            members: room.infos(),
        })
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.inner.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms.len()
    }

    /// A generated code that no live room is using.
    pub fn unused_room_id(&self) -> RoomId {
        loop {
            let candidate = RoomId::generate();
            if !self.contains_room(&candidate) {
                return candidate;
            }
        }
    }

    /// Random public room that still has a free seat.
    pub fn find_public_room(&self) -> Option<RoomId> {
        let open: Vec<RoomId> = self
            .inner
            .rooms
            .iter()
            .filter(|entry| entry.public && entry.len() < self.inner.capacity)
            .map(|entry| entry.key().clone())
            .collect();

        open.choose(&mut rand::thread_rng()).cloned()
    }
}
