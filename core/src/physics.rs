//! Position integration and overlap detection.

use alloc::collections::BTreeMap;

use crate::config::SimConfig;
use crate::contact::{Contact, ContactQueue};
use crate::fixed_point::{circles_overlap, fx_div, fx_from_int, FxVec2, IVec2};
use crate::ordering::{actors_in_processing_order, food_in_order, segments_in_order};
use crate::store::{ActorId, Store};

/// The physics collaborator.
///
/// It owns position integration and reports overlaps into a `ContactQueue`;
/// it never applies gameplay consequences itself.
pub trait Physics {
    /// Velocity in whole units per second for the coming integration.
    fn set_velocity(&mut self, actor: ActorId, velocity: IVec2);

    /// Drops all state held for a destroyed actor.
    fn forget(&mut self, actor: ActorId);

    fn integrate(&mut self, store: &mut Store, config: &SimConfig);

    fn detect(&self, store: &Store, config: &SimConfig, contacts: &mut ContactQueue);
}

/// Circle-vs-circle reference physics. Brute force over every pair, which is
/// fine at arena scale.
#[derive(Clone, Debug, Default)]
pub struct CirclePhysics {
    velocities: BTreeMap<ActorId, IVec2>,
}

impl CirclePhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn velocity(&self, actor: ActorId) -> Option<IVec2> {
        self.velocities.get(&actor).copied()
    }
}

/// Displacement for one frame: `velocity / frame_rate`, in Q16.16.
pub fn frame_displacement(velocity: IVec2, frame_rate: i32) -> FxVec2 {
    let rate = fx_from_int(frame_rate);
    FxVec2::new(
        fx_div(fx_from_int(velocity.x), rate),
        fx_div(fx_from_int(velocity.y), rate),
    )
}

impl Physics for CirclePhysics {
    fn set_velocity(&mut self, actor: ActorId, velocity: IVec2) {
        self.velocities.insert(actor, velocity);
    }

    fn forget(&mut self, actor: ActorId) {
        self.velocities.remove(&actor);
    }

    fn integrate(&mut self, store: &mut Store, config: &SimConfig) {
        self.velocities.retain(|id, velocity| match store.actor_mut(*id) {
            Some(actor) => {
                let step = frame_displacement(*velocity, config.frame_rate);
                actor.position = actor.position.add(step);
                true
            }
            None => false,
        });
    }

    fn detect(&self, store: &Store, config: &SimConfig, contacts: &mut ContactQueue) {
        let actor_radius = fx_from_int(config.actor_radius);
        let segment_radius = fx_from_int(config.segment_radius);
        let food_radius = fx_from_int(config.food_radius);
        let segments = segments_in_order(store);
        let food = food_in_order(store);

        for actor_id in actors_in_processing_order(store) {
            let Some(actor) = store.actor(actor_id) else {
                continue;
            };

            for &segment_id in &segments {
                let Some(segment) = store.segment(segment_id) else {
                    continue;
                };
                if circles_overlap(actor.position, actor_radius, segment.position, segment_radius) {
                    contacts.push(Contact::ActorSegment {
                        actor: actor_id,
                        segment: segment_id,
                    });
                }
            }

            for &food_id in &food {
                let Some(item) = store.food(food_id) else {
                    continue;
                };
                if circles_overlap(actor.position, actor_radius, item.position, food_radius) {
                    contacts.push(Contact::ActorFood {
                        actor: actor_id,
                        food: food_id,
                    });
                }
            }
        }
    }
}
