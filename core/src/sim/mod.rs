//! The simulation context and its per-frame pipeline.
//!
//! One `Simulation` is one site's copy of the world. It has a single writer;
//! everything that happens in a frame happens inside `step`, in this order:
//!
//! 1. lifecycle (disconnects, then connects, each in owner order)
//! 2. length snapshot for pruning
//! 3. steering, boost and velocity request per actor
//! 4. integration by the physics collaborator
//! 5. boundary deaths
//! 6. contact drain (segment deaths, food pickups)
//! 7. trail spawn, then trail prune
//! 8. periodic food
//!
//! Every per-actor pass walks `ordering::actors_in_processing_order`.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::SimConfig;
use crate::contact::{ContactQueue, RecordRef};
use crate::error::{RuleCode, SimError};
use crate::fixed_point::{fx_from_int, FxVec2, IVec2};
use crate::ordering::{
    actors_by_sequence, actors_in_processing_order, food_in_order, owner_key, segments_in_order,
    segments_of,
};
use crate::physics::{CirclePhysics, Physics};
use crate::rng::{SeededSpawner, SpawnSource};
use crate::store::{ActorId, FoodId, Store};
use crate::types::{Actor, Color, Food, FrameInput, OwnerId, Segment};

mod boost;
mod boundary;
mod collision;
mod replay;
mod snapshot;
mod steering;
mod trail;

#[cfg(test)]
mod tests;

pub use replay::{replay, replay_strict, replay_with_checkpoints, ReplayCheckpoint, ReplayResult};
pub use snapshot::{ActorSnapshot, FoodSnapshot, SegmentSnapshot, WorldSnapshot};

use collision::Outcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Boundary,
    Collision { by: OwnerId },
    Disconnect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Death {
    pub owner: OwnerId,
    pub cause: DeathCause,
    pub segments_destroyed: u32,
}

/// What one `step` did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame: u32,
    pub spawned: Vec<OwnerId>,
    pub deaths: Vec<Death>,
    pub food_eaten: u32,
    pub food_dropped: u32,
    pub food_spawned: u32,
    pub segments_spawned: u32,
    pub segments_pruned: u32,
}

impl FrameReport {
    fn new(frame: u32) -> Self {
        Self {
            frame,
            ..Self::default()
        }
    }

    pub fn death_of(&self, owner: OwnerId) -> Option<&Death> {
        self.deaths.iter().find(|death| death.owner == owner)
    }
}

pub struct Simulation<P: Physics = CirclePhysics, R: SpawnSource = SeededSpawner> {
    config: SimConfig,
    frame: u32,
    store: Store,
    physics: P,
    spawner: R,
    contacts: ContactQueue,
}

impl Simulation {
    /// Reference collaborators: circle physics and the seeded spawner.
    pub fn new(config: SimConfig, seed: u32) -> Result<Self, SimError> {
        Self::with_collaborators(config, CirclePhysics::new(), SeededSpawner::new(seed))
    }
}

impl<P: Physics, R: SpawnSource> Simulation<P, R> {
    pub fn with_collaborators(config: SimConfig, physics: P, spawner: R) -> Result<Self, SimError> {
        config.validate()?;

        let mut sim = Self {
            config,
            frame: 0,
            store: Store::new(),
            physics,
            spawner,
            contacts: ContactQueue::new(),
        };
        for _ in 0..sim.config.initial_food {
            sim.spawn_random_food();
        }
        Ok(sim)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Last completed frame; 0 before the first `step`.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn rng_state(&self) -> u32 {
        self.spawner.state()
    }

    pub fn actor(&self, owner: OwnerId) -> Option<&Actor> {
        self.store
            .actor_for_owner(owner)
            .and_then(|id| self.store.actor(id))
    }

    pub fn pending_contacts(&self) -> usize {
        self.contacts.len()
    }

    /// Spawns an actor for `owner` at a spawner-chosen point, facing the arena
    /// center.
    pub fn connect(&mut self, owner: OwnerId) -> Result<ActorId, SimError> {
        if self.store.actor_for_owner(owner).is_some() {
            return Err(SimError::OwnerAlreadyLive { owner });
        }

        let position = self.spawner.spawn_point(&self.config).to_fx();
        let color = self.spawner.pick_color();
        let direction =
            steering::initial_direction(position, self.config.arena_width, self.config.arena_height);

        let id = self.store.insert_actor(Actor {
            owner,
            position,
            direction,
            previous_direction: direction,
            length: self.config.initial_length,
            boost_frame_counter: 0,
            boosting: false,
            speed: self.config.base_speed,
            last_segment_spawn_frame: self.frame,
            color,
            spawn_frame: self.frame,
        })?;
        debug!(owner = %owner, frame = self.frame, "actor spawned");
        Ok(id)
    }

    pub fn disconnect(&mut self, owner: OwnerId) -> Result<Death, SimError> {
        let id = self
            .store
            .actor_for_owner(owner)
            .ok_or(SimError::UnknownOwner { owner })?;
        self.destroy_actor(id, DeathCause::Disconnect)
            .ok_or(SimError::UnknownOwner { owner })
    }

    /// Queues an overlap reported by an external physics engine. It takes
    /// effect at the next frame's contact drain. Returns false for pairs
    /// with no collision rule.
    pub fn report_contact(&mut self, a: RecordRef, b: RecordRef) -> bool {
        self.contacts.push_pair(a, b)
    }

    /// Places a food item replicated from an authoritative site. `None` when
    /// the food cap is reached.
    pub fn place_food(&mut self, position: IVec2, color: Color) -> Option<FoodId> {
        if self.store.food_count() >= self.config.food_cap {
            return None;
        }
        let position = self.clamp_to_arena(position.to_fx(), 0);
        Some(self.store.insert_food(Food { position, color }))
    }

    /// Advances one frame.
    pub fn step(&mut self, input: &FrameInput) -> FrameReport {
        self.frame += 1;
        let mut report = FrameReport::new(self.frame);

        self.apply_lifecycle(input, &mut report);

        let order = actors_in_processing_order(&self.store);

        // Growth and boost cost from this frame only affect next frame's prune.
        let lengths: Vec<(OwnerId, u32)> = order
            .iter()
            .filter_map(|id| self.store.actor(*id))
            .map(|actor| (actor.owner, actor.length))
            .collect();

        for &id in &order {
            self.drive_actor(id, input, &mut report);
        }

        self.physics.integrate(&mut self.store, &self.config);

        for &id in &order {
            let outside = self.store.actor(id).is_some_and(|actor| {
                boundary::outside_arena(actor.position, self.config.actor_radius, &self.config)
            });
            if outside {
                self.kill(id, DeathCause::Boundary, &mut report);
            }
        }

        self.physics
            .detect(&self.store, &self.config, &mut self.contacts);
        self.resolve_contacts(&mut report);

        self.spawn_segments(&order, &mut report);
        self.prune_segments(&lengths, &mut report);
        self.spawn_periodic_food(&mut report);

        trace!(
            frame = self.frame,
            actors = self.store.actor_count(),
            segments = self.store.segment_count(),
            food = self.store.food_count(),
            "frame complete"
        );
        report
    }

    fn apply_lifecycle(&mut self, input: &FrameInput, report: &mut FrameReport) {
        let mut disconnects = input.disconnects.clone();
        disconnects.sort_by_cached_key(|owner| owner_key(*owner));
        disconnects.dedup();
        for owner in disconnects {
            match self.store.actor_for_owner(owner) {
                Some(id) => self.kill(id, DeathCause::Disconnect, report),
                None => debug!(owner = %owner, frame = self.frame, "disconnect without live actor"),
            }
        }

        let mut connects = input.connects.clone();
        connects.sort_by_cached_key(|owner| owner_key(*owner));
        connects.dedup();
        for owner in connects {
            match self.connect(owner) {
                Ok(_) => report.spawned.push(owner),
                Err(err) => debug!(owner = %owner, frame = self.frame, error = %err, "connect ignored"),
            }
        }
    }

    fn drive_actor(&mut self, id: ActorId, input: &FrameInput, report: &mut FrameReport) {
        let Some(actor) = self.store.actor_mut(id) else {
            return;
        };
        let control = input.controls.get(&actor.owner).copied().unwrap_or_default();

        steering::steer(actor, control.target, self.config.turn_rate);
        let paid = boost::apply(actor, control.boost, &self.config);
        let velocity = steering::requested_velocity(actor, self.config.frame_rate);
        let drop = paid.then(|| {
            (
                actor.owner,
                actor.length,
                boost::drop_point(actor, self.config.food_drop_offset),
                actor.color,
            )
        });

        self.physics.set_velocity(id, velocity);

        let Some((owner, length, position, color)) = drop else {
            return;
        };
        if self.store.food_count() >= self.config.food_cap {
            debug!(owner = %owner, frame = self.frame, length, "food cap reached, boost drop skipped");
            return;
        }
        let position = self.clamp_to_arena(position, 0);
        self.store.insert_food(Food { position, color });
        report.food_dropped += 1;
        trace!(owner = %owner, frame = self.frame, length, "boost cost paid");
    }

    fn resolve_contacts(&mut self, report: &mut FrameReport) {
        let contacts = self.contacts.drain_ordered(&self.store);
        if !contacts.is_empty() {
            trace!(frame = self.frame, contacts = contacts.len(), "draining contacts");
        }

        for contact in contacts {
            match collision::classify(&self.store, contact) {
                Outcome::Kill { victim, by } => {
                    self.kill(victim, DeathCause::Collision { by }, report);
                }
                Outcome::Eat { actor, food } => {
                    self.store.remove_food(food);
                    if let Some(actor) = self.store.actor_mut(actor) {
                        actor.length = actor.length.saturating_add(1);
                    }
                    report.food_eaten += 1;
                }
                Outcome::Ignore => {}
            }
        }
    }

    fn spawn_segments(&mut self, order: &[ActorId], report: &mut FrameReport) {
        let frame = self.frame;
        for &id in order {
            let Some(actor) = self.store.actor_mut(id) else {
                continue;
            };
            if !trail::spawn_due(actor, frame, self.config.segment_spawn_interval) {
                continue;
            }
            actor.last_segment_spawn_frame = frame;
            let segment = Segment {
                owner: actor.owner,
                position: actor.position,
                color: actor.color,
                spawn_frame: frame,
            };
            self.store.insert_segment(segment);
            report.segments_spawned += 1;
        }
    }

    fn prune_segments(&mut self, lengths: &[(OwnerId, u32)], report: &mut FrameReport) {
        let interval = self.config.segment_spawn_interval;
        for &(owner, length) in lengths {
            if self.store.actor_for_owner(owner).is_none() {
                continue;
            }
            let oldest = trail::oldest_allowed_frame(self.frame, length, interval);
            // Oldest first, so the first survivor ends the scan.
            for id in segments_of(&self.store, owner) {
                let expired = self
                    .store
                    .segment(id)
                    .is_some_and(|segment| trail::expired(segment.spawn_frame, oldest));
                if !expired {
                    break;
                }
                self.store.remove_segment(id);
                report.segments_pruned += 1;
            }
        }

        for id in segments_in_order(&self.store) {
            let orphaned = self
                .store
                .segment(id)
                .is_some_and(|segment| self.store.actor_for_owner(segment.owner).is_none());
            debug_assert!(!orphaned, "segment {id:?} outlived its owner");
            if orphaned {
                self.store.remove_segment(id);
            }
        }
    }

    fn spawn_periodic_food(&mut self, report: &mut FrameReport) {
        let interval = self.config.food_spawn_interval;
        if interval == 0 || self.frame % interval != 0 {
            return;
        }
        if self.store.food_count() >= self.config.food_cap {
            return;
        }
        self.spawn_random_food();
        report.food_spawned += 1;
    }

    fn spawn_random_food(&mut self) -> FoodId {
        let position = self.spawner.food_point(&self.config).to_fx();
        let color = self.spawner.pick_color();
        self.store.insert_food(Food { position, color })
    }

    fn kill(&mut self, id: ActorId, cause: DeathCause, report: &mut FrameReport) {
        if let Some(death) = self.destroy_actor(id, cause) {
            report.deaths.push(death);
        }
    }

    /// Removes the actor and, in deterministic order, every segment it owns.
    fn destroy_actor(&mut self, id: ActorId, cause: DeathCause) -> Option<Death> {
        let actor = self.store.remove_actor(id)?;
        self.physics.forget(id);

        let mut segments_destroyed = 0;
        for segment in segments_of(&self.store, actor.owner) {
            if self.store.remove_segment(segment).is_some() {
                segments_destroyed += 1;
            }
        }

        debug!(
            owner = %actor.owner,
            frame = self.frame,
            length = actor.length,
            cause = ?cause,
            segments_destroyed,
            "actor destroyed"
        );
        Some(Death {
            owner: actor.owner,
            cause,
            segments_destroyed,
        })
    }

    /// Clamps into the arena shrunk by `margin` units on every side.
    fn clamp_to_arena(&self, position: FxVec2, margin: i32) -> FxVec2 {
        let margin = fx_from_int(margin);
        FxVec2::new(
            position
                .x
                .clamp(margin, fx_from_int(self.config.arena_width) - margin),
            position
                .y
                .clamp(margin, fx_from_int(self.config.arena_height) - margin),
        )
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let actors = actors_in_processing_order(&self.store)
            .into_iter()
            .filter_map(|id| self.store.actor(id))
            .map(|actor| ActorSnapshot {
                owner: actor.owner,
                position: actor.position,
                direction: actor.direction,
                length: actor.length,
                color: actor.color,
                boosting: actor.boosting,
                boost_frame_counter: actor.boost_frame_counter,
                last_segment_spawn_frame: actor.last_segment_spawn_frame,
            })
            .collect();

        let segments = segments_in_order(&self.store)
            .into_iter()
            .filter_map(|id| self.store.segment(id))
            .map(|segment| SegmentSnapshot {
                owner: segment.owner,
                position: segment.position,
                color: segment.color,
                spawn_frame: segment.spawn_frame,
            })
            .collect();

        let food = food_in_order(&self.store)
            .into_iter()
            .filter_map(|id| self.store.food(id))
            .map(|food| FoodSnapshot {
                position: food.position,
                color: food.color,
            })
            .collect();

        WorldSnapshot {
            frame: self.frame,
            rng_state: self.spawner.state(),
            actors,
            segments,
            food,
        }
    }

    pub fn digest(&self) -> u64 {
        self.snapshot().digest()
    }

    /// Overwrites (or creates) the owner's actor with replicated state.
    ///
    /// The head is clamped inside the arena, a non-unit direction
    /// re-normalized, the length floored at 1 and the boost counter folded
    /// into range, so a replicated value can never put the local world into a
    /// state `validate` rejects for those fields.
    pub fn apply_authoritative(&mut self, state: &ActorSnapshot) -> Result<ActorId, SimError> {
        let position = self.clamp_to_arena(state.position, self.config.actor_radius);
        let direction = if state.direction.is_unit() {
            state.direction
        } else {
            state.direction.normalize().unwrap_or(FxVec2::UNIT_X)
        };
        let length = state.length.max(1);
        let boost_frame_counter = state.boost_frame_counter % self.config.boost_cost_period;
        let boosting = state.boosting && length > self.config.min_boost_length;
        let speed = if boosting {
            self.config.boost_speed
        } else {
            self.config.base_speed
        };
        let last_segment_spawn_frame = state.last_segment_spawn_frame.min(self.frame);

        if let Some(id) = self.store.actor_for_owner(state.owner) {
            if let Some(actor) = self.store.actor_mut(id) {
                actor.position = position;
                actor.direction = direction;
                actor.previous_direction = direction;
                actor.length = length;
                actor.color = state.color;
                actor.boosting = boosting;
                actor.boost_frame_counter = boost_frame_counter;
                actor.speed = speed;
                actor.last_segment_spawn_frame = last_segment_spawn_frame;
                return Ok(id);
            }
        }

        self.store.insert_actor(Actor {
            owner: state.owner,
            position,
            direction,
            previous_direction: direction,
            length,
            boost_frame_counter,
            boosting,
            speed,
            last_segment_spawn_frame,
            color: state.color,
            spawn_frame: self.frame,
        })
    }

    /// Checks every world invariant, reporting the first rule broken.
    pub fn validate(&self) -> Result<(), RuleCode> {
        let mut owners = BTreeSet::new();
        for id in actors_by_sequence(&self.store) {
            let Some(actor) = self.store.actor(id) else {
                continue;
            };
            if !owners.insert(actor.owner) {
                return Err(RuleCode::ActorOwnerUnique);
            }
            if self.store.actor_for_owner(actor.owner) != Some(id) {
                return Err(RuleCode::ActorOwnerIndex);
            }
            if !actor.direction.is_unit() {
                return Err(RuleCode::ActorDirectionUnit);
            }
            if actor.boost_frame_counter >= self.config.boost_cost_period {
                return Err(RuleCode::ActorBoostCounterRange);
            }
            if actor.length == 0 || (actor.boosting && actor.length < self.config.min_boost_length)
            {
                return Err(RuleCode::ActorLengthFloor);
            }
            if boundary::outside_arena(actor.position, self.config.actor_radius, &self.config) {
                return Err(RuleCode::ActorInsideArena);
            }
        }

        for id in segments_in_order(&self.store) {
            let Some(segment) = self.store.segment(id) else {
                continue;
            };
            if self.store.actor_for_owner(segment.owner).is_none() {
                return Err(RuleCode::SegmentOwnerLive);
            }
            if segment.spawn_frame > self.frame {
                return Err(RuleCode::SegmentSpawnFrame);
            }
        }

        if self.store.food_count() > self.config.food_cap {
            return Err(RuleCode::FoodCap);
        }
        Ok(())
    }
}
