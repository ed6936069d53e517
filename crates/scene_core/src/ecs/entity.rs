//! Entity handles and the allocator that issues them
//!
//! A handle packs a 20-bit slot index with a 12-bit generation. Slot 0 is
//! never issued, so the all-zero handle doubles as "no entity" and as the
//! parent of scene roots.

use std::collections::VecDeque;
use std::fmt;

/// Number of low bits holding the slot index
pub const SLOT_BITS: u32 = 20;

/// Number of high bits holding the generation
pub const GENERATION_BITS: u32 = 12;

/// Largest slot index a handle can address
pub const MAX_SLOTS: u32 = (1 << SLOT_BITS) - 1;

const SLOT_MASK: u32 = MAX_SLOTS;
const GENERATION_MASK: u16 = (1 << GENERATION_BITS) - 1;

/// Opaque entity identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityHandle(u32);

impl EntityHandle {
    /// The invalid handle. Also used as the parent of root nodes.
    pub const INVALID: EntityHandle = EntityHandle(0);

    fn from_parts(slot: u32, generation: u16) -> Self {
        Self((slot & SLOT_MASK) | (u32::from(generation & GENERATION_MASK) << SLOT_BITS))
    }

    /// Rebuild a handle from its raw encoding
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw 32-bit encoding
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Storage slot this handle refers to
    pub const fn slot(self) -> u32 {
        self.0 & SLOT_MASK
    }

    /// Generation the slot had when this handle was issued
    pub const fn generation(self) -> u16 {
        (self.0 >> SLOT_BITS) as u16
    }

    /// True for the sentinel handle, or any handle pointing at slot 0
    pub const fn is_null(self) -> bool {
        self.slot() == 0
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.slot(), self.generation())
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.slot(), self.generation())
    }
}

/// Issues and invalidates entity handles.
///
/// Disposed slots are queued and handed out again in FIFO order once more
/// than `recycle_threshold` of them are waiting. A threshold above zero
/// delays reuse, which keeps a freshly stale handle from aliasing a new
/// entity for a while.
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    // Index 0 is the reserved sentinel slot.
    generations: Vec<u16>,
    live: Vec<bool>,
    free: VecDeque<u32>,
    recycle_threshold: usize,
    max_slots: u32,
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityAllocator {
    /// Create an allocator that reuses slots as soon as any are free
    pub fn new() -> Self {
        Self::with_recycle_threshold(0)
    }

    /// Create an allocator that only reuses slots once more than
    /// `recycle_threshold` are waiting in the free list
    pub fn with_recycle_threshold(recycle_threshold: usize) -> Self {
        Self {
            generations: vec![0],
            live: vec![false],
            free: VecDeque::new(),
            recycle_threshold,
            max_slots: MAX_SLOTS,
        }
    }

    /// Cap the number of addressable slots (clamped to the handle encoding)
    pub fn with_capacity_limit(mut self, max_slots: u32) -> Self {
        self.max_slots = max_slots.min(MAX_SLOTS);
        self
    }

    /// Issue a new handle, or [`EntityHandle::INVALID`] when every slot is taken
    pub fn create(&mut self) -> EntityHandle {
        if self.free.len() > self.recycle_threshold {
            if let Some(slot) = self.free.pop_front() {
                return self.revive(slot);
            }
        }

        let next_slot = self.generations.len() as u32;
        if next_slot <= self.max_slots {
            self.generations.push(0);
            self.live.push(true);
            return EntityHandle::from_parts(next_slot, 0);
        }

        // Out of fresh slots: take a recycled one even below the threshold.
        if let Some(slot) = self.free.pop_front() {
            return self.revive(slot);
        }

        log::warn!("Entity allocator exhausted ({} slots in use)", self.max_slots);
        EntityHandle::INVALID
    }

    fn revive(&mut self, slot: u32) -> EntityHandle {
        self.live[slot as usize] = true;
        EntityHandle::from_parts(slot, self.generations[slot as usize])
    }

    /// Invalidate a handle and queue its slot for reuse
    pub fn dispose(&mut self, handle: EntityHandle) {
        if !self.valid(handle) {
            log::warn!("Dispose of invalid entity {handle}");
            return;
        }
        let slot = handle.slot();
        let generation = &mut self.generations[slot as usize];
        *generation = generation.wrapping_add(1) & GENERATION_MASK;
        self.live[slot as usize] = false;
        self.free.push_back(slot);
    }

    /// True if the handle refers to a live entity
    pub fn valid(&self, handle: EntityHandle) -> bool {
        let slot = handle.slot() as usize;
        slot != 0
            && slot < self.generations.len()
            && self.live[slot]
            && self.generations[slot] == handle.generation()
    }

    /// Number of handles currently live
    pub fn live_count(&self) -> usize {
        self.generations.len() - 1 - self.free.len()
    }

    /// Forget every handle. Previously issued handles may become valid again.
    pub fn reset(&mut self) {
        self.generations.truncate(1);
        self.live.truncate(1);
        self.free.clear();
    }
}
