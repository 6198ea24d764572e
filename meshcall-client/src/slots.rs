use meshcall_core::MemberId;
use meshcall_core::utils::MAX_USERS;
use serde::Serialize;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotOccupant {
    pub member_id: MemberId,
    pub name: String,
}

/// One fixed display seat. `occupant == None` is an empty seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub index: usize,
    pub occupant: Option<SlotOccupant>,
    pub speaking: bool,
}

impl Slot {
    fn empty(index: usize) -> Self {
        Self {
            index,
            occupant: None,
            speaking: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn member_id(&self) -> Option<MemberId> {
        self.occupant.as_ref().map(|o| o.member_id)
    }
}

/// Member → seat binding, sized to the room capacity.
#[derive(Debug, Clone)]
pub struct SlotAllocator {
    slots: [Slot; MAX_USERS],
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(Slot::empty),
        }
    }

    /// Bind `member_id` to the lowest free seat.
    ///
    /// Rebinding a member that already has a seat returns that seat. `None`
    /// means the seats ran out, which the room capacity should have prevented.
    pub fn assign(&mut self, member_id: MemberId, name: &str) -> Option<usize> {
        if let Some(index) = self.slot_of(member_id) {
            return Some(index);
        }

        let Some(slot) = self.slots.iter_mut().find(|s| s.is_empty()) else {
            error!(
                "No free slot for member {} ('{}'): slot table and room capacity disagree",
                member_id, name
            );
            return None;
        };

        slot.occupant = Some(SlotOccupant {
            member_id,
            name: name.to_owned(),
        });
        slot.speaking = false;
        debug!("Member {} bound to slot {}", member_id, slot.index);
        Some(slot.index)
    }

    pub fn release(&mut self, member_id: MemberId) -> Option<usize> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.member_id() == Some(member_id))?;
        *slot = Slot::empty(slot.index);
        Some(slot.index)
    }

    /// Returns true when the flag actually changed.
    pub fn mark_speaking(&mut self, member_id: MemberId, speaking: bool) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|s| s.member_id() == Some(member_id))
        {
            Some(slot) if slot.speaking != speaking => {
                slot.speaking = speaking;
                true
            }
            _ => false,
        }
    }

    pub fn slot_of(&self, member_id: MemberId) -> Option<usize> {
        self.slots
            .iter()
            .find(|s| s.member_id() == Some(member_id))
            .map(|s| s.index)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }
}
