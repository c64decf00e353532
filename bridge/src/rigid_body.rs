//! Tracked (physics body, render entity) pairs.
//!
//! [`RigidBodySet`] is an arena of [`RigidBody`] records addressed by a
//! generational [`RigidBodyHandle`], with a reverse index on both ids so each
//! physics body and each render entity is tracked at most once.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use posebridge_core::VelocitySmoother;
use posebridge_core::math::{Quat, UnitQuat};

use crate::error::BridgeError;

/// Stable handle to a tracked rigid body.
///
/// Handles of removed bodies never resolve again, even after their slot is
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RigidBodyHandle {
    index: u32,
    generation: u32,
}

impl RigidBodyHandle {
    /// Slot index in the arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Correlates a physics body with the render entity that displays it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBody<B, E> {
    pub physics_id: B,
    pub render_id: E,
    /// Rotation composed after the physics orientation, for meshes authored
    /// in a different frame than their collision body.
    pub base_rotation: UnitQuat,
}

impl<B, E> RigidBody<B, E> {
    pub fn new(physics_id: B, render_id: E) -> Self {
        Self {
            physics_id,
            render_id,
            base_rotation: UnitQuat::identity(),
        }
    }

    /// Returns this body with a base rotation (normalized).
    #[must_use]
    pub fn with_base_rotation(mut self, rotation: Quat) -> Self {
        self.base_rotation = UnitQuat::new_normalize(rotation);
        self
    }
}

/// A tracked body together with its smoothed velocity state.
#[derive(Debug, Clone)]
pub struct TrackedBody<B, E> {
    pub body: RigidBody<B, E>,
    pub velocity: VelocitySmoother,
}

#[derive(Debug)]
struct Slot<B, E> {
    generation: u32,
    entry: Option<TrackedBody<B, E>>,
}

/// Arena of tracked bodies with a bidirectional id index.
#[derive(Debug)]
pub struct RigidBodySet<B, E> {
    slots: Vec<Slot<B, E>>,
    free: Vec<u32>,
    by_physics: HashMap<B, RigidBodyHandle>,
    by_render: HashMap<E, RigidBodyHandle>,
}

impl<B, E> Default for RigidBodySet<B, E> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            by_physics: HashMap::new(),
            by_render: HashMap::new(),
        }
    }
}

impl<B, E> RigidBodySet<B, E>
where
    B: Copy + Eq + Hash + Debug,
    E: Copy + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked bodies.
    pub fn len(&self) -> usize {
        self.by_physics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts tracking `body`.
    ///
    /// Fails if either id is already tracked; the set is left unchanged.
    pub fn insert(
        &mut self,
        body: RigidBody<B, E>,
        velocity: VelocitySmoother,
    ) -> Result<RigidBodyHandle, BridgeError> {
        if self.by_render.contains_key(&body.render_id) {
            return Err(BridgeError::DuplicateRenderId(format!(
                "{:?}",
                body.render_id
            )));
        }
        if self.by_physics.contains_key(&body.physics_id) {
            return Err(BridgeError::DuplicatePhysicsId(format!(
                "{:?}",
                body.physics_id
            )));
        }

        let (physics_id, render_id) = (body.physics_id, body.render_id);
        let entry = TrackedBody { body, velocity };
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                RigidBodyHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                RigidBodyHandle {
                    index,
                    generation: 0,
                }
            }
        };
        self.by_physics.insert(physics_id, handle);
        self.by_render.insert(render_id, handle);
        Ok(handle)
    }

    /// Stops tracking the body behind `handle` and returns it.
    pub fn remove(&mut self, handle: RigidBodyHandle) -> Option<RigidBody<B, E>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.by_physics.remove(&entry.body.physics_id);
        self.by_render.remove(&entry.body.render_id);
        Some(entry.body)
    }

    /// Returns the tracked entry behind `handle`, if it is still live.
    pub fn get(&self, handle: RigidBodyHandle) -> Option<&TrackedBody<B, E>> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub fn get_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut TrackedBody<B, E>> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    pub fn handle_for_physics_id(&self, id: &B) -> Option<RigidBodyHandle> {
        self.by_physics.get(id).copied()
    }

    pub fn handle_for_render_id(&self, id: &E) -> Option<RigidBodyHandle> {
        self.by_render.get(id).copied()
    }

    /// Iterates live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (RigidBodyHandle, &TrackedBody<B, E>)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry.as_ref().map(|entry| {
                (
                    RigidBodyHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    entry,
                )
            })
        })
    }

    /// Iterates live entries mutably in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (RigidBodyHandle, &mut TrackedBody<B, E>)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.entry.as_mut().map(|entry| {
                (
                    RigidBodyHandle {
                        index: index as u32,
                        generation,
                    },
                    entry,
                )
            })
        })
    }
}
