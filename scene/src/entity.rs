use std::hash::{Hash, Hasher};

/// Handle to an entity in a [`MotionScene`](crate::MotionScene).
///
/// Layout: `u32 index` + `u64 spawn_tick`. If a slot is reused the new
/// entity gets a different spawn tick, so old handles stop resolving.
#[derive(Clone, Copy)]
pub struct EntityId {
    index: u32,
    spawn_tick: u64,
}

impl EntityId {
    pub(crate) fn new(index: u32, spawn_tick: u64) -> Self {
        Self { index, spawn_tick }
    }

    /// Returns the slot index of this entity.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the spawn tick of this entity.
    pub fn spawn_tick(&self) -> u64 {
        self.spawn_tick
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.spawn_tick == other.spawn_tick
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.spawn_tick.hash(state);
    }
}

impl std::fmt::Debug for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}@{})", self.index, self.spawn_tick)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}@{})", self.index, self.spawn_tick)
    }
}

/// Allocates and recycles entity slots with spawn-tick tracking.
///
/// Every allocation advances the tick, so a recycled slot never hands out a
/// handle equal to one given out before.
#[derive(Debug, Default)]
pub(crate) struct EntityAllocator {
    /// Spawn tick of the live entity in each slot, `None` when free.
    slots: Vec<Option<u64>>,
    /// Free list of recyclable indices (LIFO stack).
    free_list: Vec<u32>,
    tick: u64,
}

impl EntityAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let tick = self.tick;
        self.tick += 1;
        match self.free_list.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(tick);
                EntityId::new(index, tick)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Some(tick));
                EntityId::new(index, tick)
            }
        }
    }

    /// Returns false if the entity is already dead or the spawn tick differs.
    pub fn deallocate(&mut self, entity: EntityId) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.slots[entity.index as usize] = None;
        self.free_list.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.slots
            .get(entity.index as usize)
            .copied()
            .flatten()
            .is_some_and(|tick| tick == entity.spawn_tick)
    }

    /// Handle of the live entity in slot `index`.
    pub fn id_at(&self, index: u32) -> Option<EntityId> {
        let tick = (*self.slots.get(index as usize)?)?;
        Some(EntityId::new(index, tick))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
    }
}
