//! Deterministic iteration order over store records.
//!
//! Store iteration follows slot layout, which depends on the history of
//! inserts and removals and so differs between sites that saw events arrive
//! in different orders. Every gameplay pass iterates through these functions.
//!
//! - Identity order: creation sequence.
//! - Processing order (actors): owner id as a decimal string, then sequence.
//! - Segments: owner string, spawn frame, then sequence.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::store::{ActorId, FoodId, SegmentId, Store};
use crate::types::OwnerId;

/// Canonical sort key for an owner.
pub fn owner_key(owner: OwnerId) -> String {
    owner.to_string()
}

pub fn actors_by_sequence(store: &Store) -> Vec<ActorId> {
    let mut ids = store.actor_ids();
    ids.sort_by_key(|id| store.actor_seq(*id));
    ids
}

pub fn actors_in_processing_order(store: &Store) -> Vec<ActorId> {
    let mut ids = store.actor_ids();
    ids.sort_by_cached_key(|id| {
        let owner = store.actor(*id).map(|actor| owner_key(actor.owner));
        (owner, store.actor_seq(*id))
    });
    ids
}

pub fn segments_in_order(store: &Store) -> Vec<SegmentId> {
    let mut ids = store.segment_ids();
    ids.sort_by_cached_key(|id| {
        let segment = store.segment(*id);
        (
            segment.map(|s| owner_key(s.owner)),
            segment.map(|s| s.spawn_frame),
            store.segment_seq(*id),
        )
    });
    ids
}

/// Segments of one owner, oldest first.
pub fn segments_of(store: &Store, owner: OwnerId) -> Vec<SegmentId> {
    let mut ids: Vec<SegmentId> = store
        .segment_ids()
        .into_iter()
        .filter(|id| store.segment(*id).is_some_and(|s| s.owner == owner))
        .collect();
    ids.sort_by_key(|id| (store.segment(*id).map(|s| s.spawn_frame), store.segment_seq(*id)));
    ids
}

pub fn food_in_order(store: &Store) -> Vec<FoodId> {
    let mut ids = store.food_ids();
    ids.sort_by_key(|id| store.food_seq(*id));
    ids
}
