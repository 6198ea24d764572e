use crate::signaling::MemberChannel;
use meshcall_core::{MemberId, MemberInfo, RoomId, SignalMessage};
use tracing::debug;

pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub room_id: RoomId,
    pub join_index: u64,
    channel: Box<dyn MemberChannel>,
}

impl Member {
    pub fn info(&self) -> MemberInfo {
        MemberInfo::new(self.id, self.name.clone())
    }

    pub fn deliver(&self, msg: SignalMessage) -> bool {
        let kind = msg.kind();
        let delivered = self.channel.deliver(msg);
        if !delivered {
            debug!("Dropping '{}' for member {}: channel closed", kind, self.id);
        }
        delivered
    }
}

/// Members of one room in join order.
pub struct Room {
    pub id: RoomId,
    pub public: bool,
    members: Vec<Member>,
    next_join_index: u64,
}

impl Room {
    pub fn new(id: RoomId, public: bool) -> Self {
        Self {
            id,
            public,
            members: Vec::new(),
            next_join_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, member_id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn push(&mut self, id: MemberId, name: String, channel: Box<dyn MemberChannel>) {
        let join_index = self.next_join_index;
        self.next_join_index += 1;
        self.members.push(Member {
            id,
            name,
            room_id: self.id.clone(),
            join_index,
            channel,
        });
    }

    pub fn remove(&mut self, member_id: MemberId) -> Option<Member> {
        let pos = self.members.iter().position(|m| m.id == member_id)?;
        Some(self.members.remove(pos))
    }

    pub fn infos(&self) -> Vec<MemberInfo> {
        self.members.iter().map(Member::info).collect()
    }

    /// Deliver to every member except `exclude`; returns how many accepted it.
    pub fn broadcast(&self, msg: &SignalMessage, exclude: Option<MemberId>) -> usize {
        self.members
            .iter()
            .filter(|m| Some(m.id) != exclude)
            .filter(|m| m.deliver(msg.clone()))
            .count()
    }
}
