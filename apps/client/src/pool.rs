use std::collections::HashMap;

use query::PanelKey;

/// Request id marking a free slot. Live ids start at 1, so 0 never
/// collides with an outstanding request.
pub const IDLE: u64 = 0;

/// One in-flight panel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSlot {
    /// [`IDLE`] when the slot is free.
    pub request_id: u64,
    /// Interaction generation the request belongs to.
    pub generation: u64,
    pub panel: PanelKey,
}

/// Fixed set of reusable slots for outstanding requests. The pool grows
/// when every slot is busy and never shrinks; lookups go through the
/// request-id map, not a scan.
#[derive(Debug, Default)]
pub struct SlotPool {
    slots: Vec<RequestSlot>,
    by_request: HashMap<u64, usize>,
    next_request_id: u64,
}

impl SlotPool {
    /// Claim a slot for a new request and return its request id.
    pub fn acquire(&mut self, generation: u64, panel: PanelKey) -> u64 {
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let slot = RequestSlot {
            request_id,
            generation,
            panel,
        };
        let index = match self.slots.iter().position(|s| s.request_id == IDLE) {
            Some(free) => {
                self.slots[free] = slot;
                free
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };
        self.by_request.insert(request_id, index);
        request_id
    }

    /// Free the slot holding `request_id`, returning what it held. Unknown
    /// ids (already released, or never issued) return `None`.
    pub fn release(&mut self, request_id: u64) -> Option<RequestSlot> {
        let index = self.by_request.remove(&request_id)?;
        let slot = self.slots[index];
        self.slots[index].request_id = IDLE;
        Some(slot)
    }

    pub fn get(&self, request_id: u64) -> Option<&RequestSlot> {
        self.by_request
            .get(&request_id)
            .map(|&index| &self.slots[index])
    }

    /// Outstanding requests belonging to `generation`.
    pub fn outstanding(&self, generation: u64) -> usize {
        self.slots
            .iter()
            .filter(|s| s.request_id != IDLE && s.generation == generation)
            .count()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
