//! Buffered overlap events.
//!
//! The physics side may report overlaps at any time and in any order. They
//! are held here and drained once per frame, sorted, so their effects never
//! depend on when or in what order they were reported.

use alloc::string::String;
use alloc::vec::Vec;

use crate::ordering::owner_key;
use crate::store::{ActorId, FoodId, SegmentId, Store};

/// A record of any kind, as reported by a physics collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordRef {
    Actor(ActorId),
    Segment(SegmentId),
    Food(FoodId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Contact {
    ActorSegment { actor: ActorId, segment: SegmentId },
    ActorFood { actor: ActorId, food: FoodId },
}

impl Contact {
    /// Normalizes an unordered pair. Pairs of kinds that have no rule
    /// (actor/actor, segment/food, ...) yield `None`.
    pub fn from_pair(a: RecordRef, b: RecordRef) -> Option<Self> {
        match (a, b) {
            (RecordRef::Actor(actor), RecordRef::Segment(segment))
            | (RecordRef::Segment(segment), RecordRef::Actor(actor)) => {
                Some(Self::ActorSegment { actor, segment })
            }
            (RecordRef::Actor(actor), RecordRef::Food(food))
            | (RecordRef::Food(food), RecordRef::Actor(actor)) => {
                Some(Self::ActorFood { actor, food })
            }
            _ => None,
        }
    }

    pub fn actor(&self) -> ActorId {
        match *self {
            Self::ActorSegment { actor, .. } | Self::ActorFood { actor, .. } => actor,
        }
    }

    // Deaths resolve before pickups for the same actor.
    fn kind_rank(&self) -> u8 {
        match self {
            Self::ActorSegment { .. } => 0,
            Self::ActorFood { .. } => 1,
        }
    }

    fn other_seq(&self, store: &Store) -> Option<u64> {
        match *self {
            Self::ActorSegment { segment, .. } => store.segment_seq(segment),
            Self::ActorFood { food, .. } => store.food_seq(food),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ContactQueue {
    pending: Vec<Contact>,
}

impl ContactQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, contact: Contact) {
        self.pending.push(contact);
    }

    /// Returns false when the pair has no collision rule and was dropped.
    pub fn push_pair(&mut self, a: RecordRef, b: RecordRef) -> bool {
        match Contact::from_pair(a, b) {
            Some(contact) => {
                self.push(contact);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Empties the queue into resolution order: actor owner string, then
    /// contact kind, then the other record's creation sequence. Duplicates
    /// collapse, and contacts naming a record that is already gone are
    /// dropped.
    pub fn drain_ordered(&mut self, store: &Store) -> Vec<Contact> {
        let mut keyed: Vec<((String, u8, u64), Contact)> = self
            .pending
            .drain(..)
            .filter_map(|contact| {
                let actor = store.actor(contact.actor())?;
                let other_seq = contact.other_seq(store)?;
                Some(((owner_key(actor.owner), contact.kind_rank(), other_seq), contact))
            })
            .collect();

        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.dedup_by(|a, b| a.1 == b.1);
        keyed.into_iter().map(|(_, contact)| contact).collect()
    }
}
