use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::fixed_point::{Fx, FxVec2, IVec2};

/// Stable identifier of the controlling client.
///
/// Processing order uses the decimal string form (`"10"` sorts before `"9"`),
/// so `Display` is part of the determinism contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub u32);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque 0xRRGGBB color token picked by the spawn source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

/// Snake head. Positions are Q16.16 world coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub owner: OwnerId,
    pub position: FxVec2,
    pub direction: FxVec2,
    /// Render interpolation only; never read by a gameplay system.
    pub previous_direction: FxVec2,
    pub length: u32,
    pub boost_frame_counter: u32,
    pub boosting: bool,
    pub speed: Fx,
    pub last_segment_spawn_frame: u32,
    pub color: Color,
    pub spawn_frame: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub owner: OwnerId,
    pub position: FxVec2,
    pub color: Color,
    pub spawn_frame: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Food {
    pub position: FxVec2,
    pub color: Color,
}

/// One client's controls for one frame. `target` is already integer-rounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInput {
    pub target: Option<IVec2>,
    pub boost: bool,
}

impl ControlInput {
    pub fn toward(target: IVec2) -> Self {
        Self {
            target: Some(target),
            boost: false,
        }
    }

    pub fn boosting(mut self) -> Self {
        self.boost = true;
        self
    }
}

/// Everything the outside world hands the simulation for one frame.
///
/// `connects` and `disconnects` may arrive in any order; the simulation sorts
/// them before applying.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    pub connects: Vec<OwnerId>,
    pub disconnects: Vec<OwnerId>,
    pub controls: BTreeMap<OwnerId, ControlInput>,
}

impl FrameInput {
    pub fn is_empty(&self) -> bool {
        self.connects.is_empty() && self.disconnects.is_empty() && self.controls.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.connects.len() + self.disconnects.len() + self.controls.len()
    }
}
