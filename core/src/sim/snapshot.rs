use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::fixed_point::FxVec2;
use crate::types::{Color, OwnerId};

/// Replicated per-actor state: the minimal set needed to resume prediction
/// plus the boost bookkeeping that drives the next frames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub owner: OwnerId,
    pub position: FxVec2,
    pub direction: FxVec2,
    pub length: u32,
    pub color: Color,
    pub boosting: bool,
    pub boost_frame_counter: u32,
    pub last_segment_spawn_frame: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSnapshot {
    pub owner: OwnerId,
    pub position: FxVec2,
    pub color: Color,
    pub spawn_frame: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodSnapshot {
    pub position: FxVec2,
    pub color: Color,
}

/// Whole-world state in deterministic order: actors by owner string,
/// segments by owner then age, food by creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub frame: u32,
    pub rng_state: u32,
    pub actors: Vec<ActorSnapshot>,
    pub segments: Vec<SegmentSnapshot>,
    pub food: Vec<FoodSnapshot>,
}

impl WorldSnapshot {
    pub fn actor(&self, owner: OwnerId) -> Option<&ActorSnapshot> {
        self.actors.iter().find(|actor| actor.owner == owner)
    }

    pub fn segments_of(&self, owner: OwnerId) -> impl Iterator<Item = &SegmentSnapshot> + '_ {
        self.segments
            .iter()
            .filter(move |segment| segment.owner == owner)
    }

    /// FNV-1a over every field. Two sites agree on this exactly when they
    /// agree on the whole world.
    pub fn digest(&self) -> u64 {
        let mut hash = Fnv1a::new();
        hash.write_u32(self.frame);
        hash.write_u32(self.rng_state);

        hash.write_u32(self.actors.len() as u32);
        for actor in &self.actors {
            hash.write_u32(actor.owner.0);
            hash.write_vec(actor.position);
            hash.write_vec(actor.direction);
            hash.write_u32(actor.length);
            hash.write_u32(actor.color.0);
            hash.write_u32(actor.boosting as u32);
            hash.write_u32(actor.boost_frame_counter);
            hash.write_u32(actor.last_segment_spawn_frame);
        }

        hash.write_u32(self.segments.len() as u32);
        for segment in &self.segments {
            hash.write_u32(segment.owner.0);
            hash.write_vec(segment.position);
            hash.write_u32(segment.color.0);
            hash.write_u32(segment.spawn_frame);
        }

        hash.write_u32(self.food.len() as u32);
        for food in &self.food {
            hash.write_vec(food.position);
            hash.write_u32(food.color.0);
        }

        hash.finish()
    }
}

struct Fnv1a(u64);

impl Fnv1a {
    const OFFSET: u64 = 0xCBF2_9CE4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    fn new() -> Self {
        Self(Self::OFFSET)
    }

    fn write_u32(&mut self, value: u32) {
        for byte in value.to_le_bytes() {
            self.0 ^= byte as u64;
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn write_vec(&mut self, value: FxVec2) {
        self.write_u32(value.x as u32);
        self.write_u32(value.y as u32);
    }

    fn finish(&self) -> u64 {
        self.0
    }
}
