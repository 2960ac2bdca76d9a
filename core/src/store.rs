//! Generational record store for actors, segments and food.
//!
//! Slots are recycled LIFO, so slot order stops matching creation order as
//! soon as anything is destroyed. Callers that iterate for gameplay go through
//! `crate::ordering` instead of the raw id lists returned here.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use slotmap::{new_key_type, SlotMap};

use crate::error::SimError;
use crate::types::{Actor, Food, OwnerId, Segment};

new_key_type! {
    /// Handle to a live (or formerly live) actor record.
    pub struct ActorId;
    pub struct SegmentId;
    pub struct FoodId;
}

#[derive(Clone, Debug)]
struct Entry<T> {
    seq: u64,
    value: T,
}

/// Typed tables plus the owner index. Every insert draws the next value of a
/// store-wide creation sequence.
#[derive(Clone, Debug)]
pub struct Store {
    actors: SlotMap<ActorId, Entry<Actor>>,
    segments: SlotMap<SegmentId, Entry<Segment>>,
    food: SlotMap<FoodId, Entry<Food>>,
    owners: BTreeMap<OwnerId, ActorId>,
    next_seq: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            actors: SlotMap::with_key(),
            segments: SlotMap::with_key(),
            food: SlotMap::with_key(),
            owners: BTreeMap::new(),
            next_seq: 0,
        }
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub fn insert_actor(&mut self, actor: Actor) -> Result<ActorId, SimError> {
        if self.owners.contains_key(&actor.owner) {
            return Err(SimError::OwnerAlreadyLive { owner: actor.owner });
        }
        let owner = actor.owner;
        let seq = self.take_seq();
        let id = self.actors.insert(Entry { seq, value: actor });
        self.owners.insert(owner, id);
        Ok(id)
    }

    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        let actor = self.actors.remove(id)?.value;
        if self.owners.get(&actor.owner) == Some(&id) {
            self.owners.remove(&actor.owner);
        }
        Some(actor)
    }

    pub fn insert_segment(&mut self, segment: Segment) -> SegmentId {
        let seq = self.take_seq();
        self.segments.insert(Entry { seq, value: segment })
    }

    pub fn remove_segment(&mut self, id: SegmentId) -> Option<Segment> {
        self.segments.remove(id).map(|entry| entry.value)
    }

    pub fn insert_food(&mut self, food: Food) -> FoodId {
        let seq = self.take_seq();
        self.food.insert(Entry { seq, value: food })
    }

    pub fn remove_food(&mut self, id: FoodId) -> Option<Food> {
        self.food.remove(id).map(|entry| entry.value)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id).map(|entry| &entry.value)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id).map(|entry| &mut entry.value)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id).map(|entry| &entry.value)
    }

    pub fn food(&self, id: FoodId) -> Option<&Food> {
        self.food.get(id).map(|entry| &entry.value)
    }

    pub fn actor_for_owner(&self, owner: OwnerId) -> Option<ActorId> {
        self.owners.get(&owner).copied()
    }

    pub fn actor_seq(&self, id: ActorId) -> Option<u64> {
        self.actors.get(id).map(|entry| entry.seq)
    }

    pub fn segment_seq(&self, id: SegmentId) -> Option<u64> {
        self.segments.get(id).map(|entry| entry.seq)
    }

    pub fn food_seq(&self, id: FoodId) -> Option<u64> {
        self.food.get(id).map(|entry| entry.seq)
    }

    /// Live actor ids in slot order.
    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.actors.keys().collect()
    }

    /// Live segment ids in slot order.
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        self.segments.keys().collect()
    }

    /// Live food ids in slot order.
    pub fn food_ids(&self) -> Vec<FoodId> {
        self.food.keys().collect()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn food_count(&self) -> usize {
        self.food.len()
    }

    /// Inserts without touching the owner index, producing states that only a
    /// broken store could reach.
    #[cfg(test)]
    pub(crate) fn insert_actor_unindexed(&mut self, actor: Actor) -> ActorId {
        let seq = self.take_seq();
        self.actors.insert(Entry { seq, value: actor })
    }

    #[cfg(test)]
    pub(crate) fn unindex_owner(&mut self, owner: OwnerId) {
        self.owners.remove(&owner);
    }
}
