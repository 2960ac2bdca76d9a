use alloc::vec;
use alloc::vec::Vec;

use super::*;
use crate::contact::Contact;
use crate::fixed_point::FX_ONE;
use crate::types::ControlInput;

const SEED: u32 = 0xDEAD_BEEF;

fn quiet_sim() -> Simulation {
    Simulation::new(SimConfig::without_food(), SEED).expect("valid config")
}

fn connect_frame(owners: &[u32]) -> FrameInput {
    FrameInput {
        connects: owners.iter().copied().map(OwnerId).collect(),
        ..FrameInput::default()
    }
}

/// Moves an owner's head to `(x, y)` facing `direction`, keeping the rest of
/// its replicated state.
fn place(sim: &mut Simulation, owner: u32, x: i32, y: i32, direction: FxVec2) {
    let mut state = sim
        .snapshot()
        .actor(OwnerId(owner))
        .cloned()
        .expect("owner must be live");
    state.position = IVec2::new(x, y).to_fx();
    state.direction = direction;
    sim.apply_authoritative(&state).expect("owner is live");
}

fn assert_invariant_violation(mutator: impl FnOnce(&mut Simulation), expected: RuleCode) {
    let mut sim = quiet_sim();
    sim.step(&connect_frame(&[1, 2]));
    sim.validate().expect("fresh world must be valid");
    mutator(&mut sim);
    assert_eq!(sim.validate(), Err(expected));
}

fn scripted_inputs(frames: u32) -> Vec<FrameInput> {
    (0..frames)
        .map(|frame| {
            let mut input = FrameInput::default();
            if frame == 0 {
                input.connects = vec![OwnerId(3), OwnerId(12), OwnerId(7)];
            }
            if frame == 90 {
                input.disconnects.push(OwnerId(12));
            }
            if frame == 120 {
                input.connects.push(OwnerId(12));
            }
            let sweep = (frame as i32 * 37) % 4_000;
            input.controls.insert(
                OwnerId(3),
                ControlInput {
                    target: Some(IVec2::new(sweep, 4_000 - sweep)),
                    boost: frame % 50 < 20,
                },
            );
            input
                .controls
                .insert(OwnerId(7), ControlInput::toward(IVec2::new(2_000, 2_000)));
            input
        })
        .collect()
}

#[test]
fn new_world_seeds_initial_food() {
    let sim = Simulation::new(SimConfig::default(), SEED).expect("valid config");
    assert_eq!(sim.store().food_count(), sim.config().initial_food);
    assert_eq!(sim.frame(), 0);
    sim.validate().expect("initial world must be valid");
}

#[test]
fn rejects_invalid_config() {
    let config = SimConfig {
        frame_rate: 0,
        ..SimConfig::default()
    };
    assert!(matches!(
        Simulation::new(config, SEED),
        Err(SimError::InvalidConfig(crate::error::ConfigError::FrameRate))
    ));
}

#[test]
fn same_seed_and_inputs_are_deterministic() {
    let inputs = scripted_inputs(400);
    let mut a = Simulation::new(SimConfig::default(), SEED).expect("valid config");
    let mut b = Simulation::new(SimConfig::default(), SEED).expect("valid config");

    for input in &inputs {
        let report_a = a.step(input);
        let report_b = b.step(input);
        assert_eq!(report_a, report_b);
        assert_eq!(a.digest(), b.digest());
        a.validate().expect("post-step state must satisfy invariants");
    }
    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn different_seeds_diverge() {
    let inputs = scripted_inputs(10);
    let mut a = Simulation::new(SimConfig::default(), 1).expect("valid config");
    let mut b = Simulation::new(SimConfig::default(), 2).expect("valid config");
    for input in &inputs {
        a.step(input);
        b.step(input);
    }
    assert_ne!(a.digest(), b.digest());
}

#[test]
fn lifecycle_is_independent_of_arrival_order() {
    let mut a = quiet_sim();
    let mut b = quiet_sim();

    let report_a = a.step(&connect_frame(&[5, 40, 3]));
    let report_b = b.step(&connect_frame(&[3, 5, 40, 5]));

    assert_eq!(report_a.spawned, [OwnerId(3), OwnerId(40), OwnerId(5)]);
    assert_eq!(report_a, report_b);
    assert_eq!(a.digest(), b.digest());
}

#[test]
fn connect_for_live_owner_is_rejected_or_ignored() {
    let mut sim = quiet_sim();
    sim.connect(OwnerId(1)).expect("first connect");
    assert_eq!(
        sim.connect(OwnerId(1)),
        Err(SimError::OwnerAlreadyLive { owner: OwnerId(1) })
    );

    let report = sim.step(&connect_frame(&[1]));
    assert!(report.spawned.is_empty());
    assert_eq!(sim.store().actor_count(), 1);
}

#[test]
fn disconnect_cascades_and_allows_respawn() {
    let mut sim = quiet_sim();
    sim.step(&connect_frame(&[1, 2]));
    for _ in 0..12 {
        sim.step(&FrameInput::default());
    }
    let snapshot = sim.snapshot();
    let owned_by_2 = snapshot.segments_of(OwnerId(2)).count();
    assert!(snapshot.segments_of(OwnerId(1)).count() > 0);

    let report = sim.step(&FrameInput {
        disconnects: vec![OwnerId(1), OwnerId(99)],
        ..FrameInput::default()
    });
    let death = report.death_of(OwnerId(1)).expect("owner 1 removed");
    assert_eq!(death.cause, DeathCause::Disconnect);
    assert!(death.segments_destroyed > 0);

    let after = sim.snapshot();
    assert_eq!(after.segments_of(OwnerId(1)).count(), 0);
    assert!(after.segments_of(OwnerId(2)).count() >= owned_by_2);

    assert_eq!(
        sim.disconnect(OwnerId(1)),
        Err(SimError::UnknownOwner { owner: OwnerId(1) })
    );
    let report = sim.step(&connect_frame(&[1]));
    assert_eq!(report.spawned, [OwnerId(1)]);
    assert_eq!(
        sim.actor(OwnerId(1)).map(|a| a.length),
        Some(sim.config().initial_length)
    );
}

#[test]
fn trail_length_follows_actor_length() {
    let mut sim = quiet_sim();
    sim.step(&connect_frame(&[1]));
    place(&mut sim, 1, 500, 2_000, FxVec2::UNIT_X);

    let config = sim.config().clone();
    for _ in 0..(config.initial_length * config.segment_spawn_interval * 2) {
        sim.step(&FrameInput::default());
    }
    let owned = sim.snapshot().segments_of(OwnerId(1)).count() as u32;
    assert!(
        owned == config.initial_length || owned == config.initial_length + 1,
        "got {owned}"
    );
    assert!(sim
        .snapshot()
        .segments_of(OwnerId(1))
        .all(|s| s.spawn_frame as i64
            >= sim.frame() as i64 - (config.initial_length * config.segment_spawn_interval) as i64));
}

#[test]
fn longer_actors_keep_longer_trails() {
    let mut previous = 0;
    for length in (11..=39).step_by(4) {
        let mut sim = quiet_sim();
        sim.step(&connect_frame(&[1]));
        let mut state = sim.snapshot().actor(OwnerId(1)).cloned().expect("live");
        state.position = IVec2::new(500, 2_000).to_fx();
        state.direction = FxVec2::UNIT_X;
        state.length = length;
        sim.apply_authoritative(&state).expect("owner is live");

        for _ in 0..400 {
            sim.step(&FrameInput::default());
        }
        let owned = sim.snapshot().segments_of(OwnerId(1)).count() as u32;
        assert!(
            owned == length || owned == length + 1,
            "length {length} kept {owned} segments"
        );
        assert!(owned >= previous, "length {length} kept {owned}, shorter kept {previous}");
        previous = owned;
    }
}

#[test]
fn food_pickup_grows_by_one() {
    let mut sim = quiet_sim();
    sim.step(&connect_frame(&[1]));
    place(&mut sim, 1, 500, 2_000, FxVec2::UNIT_X);
    for _ in 0..60 {
        sim.step(&FrameInput::default());
    }

    // Food just ahead of the head; the pickup lands this frame.
    let head = sim.actor(OwnerId(1)).map(|a| a.position).expect("live");
    let x = (head.x >> 16) + 3;
    sim.place_food(IVec2::new(x, head.y >> 16), Color(7))
        .expect("below cap");
    let report = sim.step(&FrameInput::default());
    assert_eq!(report.food_eaten, 1);
    assert_eq!(
        sim.actor(OwnerId(1)).map(|a| a.length),
        Some(sim.config().initial_length + 1)
    );
}

#[test]
fn own_trail_never_kills() {
    let mut sim = quiet_sim();
    sim.step(&connect_frame(&[1]));
    place(&mut sim, 1, 2_000, 2_000, FxVec2::UNIT_X);

    // A tight circle keeps the head inside its own trail.
    for frame in 0..300u32 {
        let angle_target = match (frame / 10) % 4 {
            0 => IVec2::new(2_100, 2_000),
            1 => IVec2::new(2_000, 2_100),
            2 => IVec2::new(1_900, 2_000),
            _ => IVec2::new(2_000, 1_900),
        };
        let mut input = FrameInput::default();
        input
            .controls
            .insert(OwnerId(1), ControlInput::toward(angle_target));
        let report = sim.step(&input);
        assert!(report.deaths.is_empty(), "self kill at frame {}", report.frame);
    }
}

#[test]
fn externally_reported_contacts_resolve_at_drain() {
    let mut sim = quiet_sim();
    sim.step(&connect_frame(&[1, 2]));
    for _ in 0..6 {
        sim.step(&FrameInput::default());
    }
    let victim = sim.store().actor_for_owner(OwnerId(1)).expect("live");
    let foreign = segments_of(sim.store(), OwnerId(2))[0];

    assert!(sim.report_contact(RecordRef::Segment(foreign), RecordRef::Actor(victim)));
    assert!(!sim.report_contact(RecordRef::Actor(victim), RecordRef::Actor(victim)));
    assert_eq!(sim.pending_contacts(), 1);
    assert!(sim.actor(OwnerId(1)).is_some(), "nothing applies before the drain");

    let report = sim.step(&FrameInput::default());
    assert_eq!(
        report.death_of(OwnerId(1)).map(|d| d.cause),
        Some(DeathCause::Collision { by: OwnerId(2) })
    );
    assert_eq!(sim.pending_contacts(), 0);
}

#[test]
fn double_contacts_resolve_once() {
    let mut sim = quiet_sim();
    sim.step(&connect_frame(&[1]));
    let actor = sim.store().actor_for_owner(OwnerId(1)).expect("live");
    let food = sim.place_food(IVec2::new(10, 10), Color(1)).expect("below cap");

    sim.contacts.push(Contact::ActorFood { actor, food });
    sim.contacts.push(Contact::ActorFood { actor, food });
    let report = sim.step(&FrameInput::default());

    assert_eq!(report.food_eaten, 1);
    assert_eq!(
        sim.actor(OwnerId(1)).map(|a| a.length),
        Some(sim.config().initial_length + 1)
    );
}

#[test]
fn boost_drop_respects_food_cap() {
    let config = SimConfig {
        food_cap: 2,
        initial_food: 2,
        food_spawn_interval: 0,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config, SEED).expect("valid config");
    sim.step(&connect_frame(&[1]));
    place(&mut sim, 1, 2_000, 2_000, FxVec2::UNIT_X);

    let mut input = FrameInput::default();
    input.controls.insert(
        OwnerId(1),
        ControlInput::toward(IVec2::new(3_000, 2_000)).boosting(),
    );
    let mut dropped = 0;
    for _ in 0..sim.config().boost_cost_period {
        dropped += sim.step(&input).food_dropped;
    }
    assert_eq!(dropped, 0);
    assert_eq!(sim.store().food_count(), 2);
    assert_eq!(
        sim.actor(OwnerId(1)).map(|a| a.length),
        Some(sim.config().initial_length - 1)
    );
}

#[test]
fn boost_drop_with_longest_offset_lands_on_the_wall() {
    let config = SimConfig {
        food_drop_offset: 4_000,
        ..SimConfig::without_food()
    };
    let mut sim = Simulation::new(config, SEED).expect("valid config");
    sim.step(&connect_frame(&[1]));
    place(&mut sim, 1, 3_000, 2_000, FxVec2::new(-FX_ONE, 0));

    let mut input = FrameInput::default();
    input.controls.insert(
        OwnerId(1),
        ControlInput::toward(IVec2::new(0, 2_000)).boosting(),
    );
    let mut dropped = 0;
    for _ in 0..sim.config().boost_cost_period {
        dropped += sim.step(&input).food_dropped;
    }

    assert_eq!(dropped, 1);
    let food = sim.snapshot().food;
    assert_eq!(food.len(), 1);
    assert_eq!(food[0].position, IVec2::new(4_000, 2_000).to_fx());
    sim.validate().expect("world stays valid");
}

#[test]
fn periodic_food_spawns_on_interval() {
    let config = SimConfig {
        initial_food: 0,
        food_spawn_interval: 5,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config, SEED).expect("valid config");
    let spawned: u32 = (0..20)
        .map(|_| sim.step(&FrameInput::default()).food_spawned)
        .sum();
    assert_eq!(spawned, 4);
    assert_eq!(sim.store().food_count(), 4);
}

#[test]
fn apply_authoritative_creates_and_sanitizes() {
    let mut sim = quiet_sim();
    let state = ActorSnapshot {
        owner: OwnerId(9),
        position: IVec2::new(1_000, 1_000).to_fx(),
        direction: FxVec2::new(3 * FX_ONE, 4 * FX_ONE),
        length: 0,
        color: Color(5),
        boosting: true,
        boost_frame_counter: 1_000,
        last_segment_spawn_frame: 77,
    };
    sim.apply_authoritative(&state).expect("owner not live");

    let actor = sim.actor(OwnerId(9)).expect("created");
    assert!(actor.direction.is_unit());
    assert_eq!(actor.length, 1);
    assert!(!actor.boosting);
    assert!(actor.boost_frame_counter < sim.config().boost_cost_period);
    assert_eq!(actor.last_segment_spawn_frame, 0);
    sim.validate().expect("sanitized state is valid");
}

#[test]
fn apply_authoritative_clamps_heads_into_the_arena() {
    let mut sim = quiet_sim();
    sim.step(&connect_frame(&[1]));
    let config = sim.config().clone();
    let mut state = sim.snapshot().actor(OwnerId(1)).cloned().expect("live");

    state.position = FxVec2::new(i32::MIN, i32::MAX);
    sim.apply_authoritative(&state).expect("owner is live");
    let head = sim.actor(OwnerId(1)).map(|a| a.position).expect("live");
    assert_eq!(
        head,
        IVec2::new(config.actor_radius, config.arena_height - config.actor_radius).to_fx()
    );
    sim.validate().expect("clamped head is inside");

    // Steering from the clamped head toward a far target must not overflow.
    let mut input = FrameInput::default();
    input
        .controls
        .insert(OwnerId(1), ControlInput::toward(IVec2::new(i32::MAX, i32::MIN)));
    sim.step(&input);

    state.owner = OwnerId(2);
    state.position = IVec2::new(-50, 9_000).to_fx();
    sim.apply_authoritative(&state).expect("owner not live");
    sim.validate().expect("created actor is inside");
}

#[test]
fn replicated_actors_reconcile_a_predicting_site() {
    let inputs = scripted_inputs(150);
    let mut server = quiet_sim();
    let mut client = quiet_sim();
    for input in &inputs {
        server.step(input);
        client.step(input);
    }

    let truth = server.snapshot();
    let owner = truth.actors.first().map(|a| a.owner.0).expect("someone survives");
    place(&mut client, owner, 1_234, 1_234, FxVec2::UNIT_X);
    assert_ne!(client.digest(), truth.digest());

    for actor in &truth.actors {
        client.apply_authoritative(actor).expect("replicated state applies");
    }
    assert_eq!(client.snapshot(), truth);
}

#[test]
fn validate_catches_duplicate_owner() {
    assert_invariant_violation(
        |sim| {
            let copy = sim.actor(OwnerId(1)).cloned().expect("live");
            sim.store.insert_actor_unindexed(copy);
        },
        RuleCode::ActorOwnerUnique,
    );
}

#[test]
fn validate_catches_owner_index_drift() {
    assert_invariant_violation(
        |sim| sim.store.unindex_owner(OwnerId(2)),
        RuleCode::ActorOwnerIndex,
    );
}

#[test]
fn validate_catches_non_unit_direction() {
    assert_invariant_violation(
        |sim| {
            let id = sim.store.actor_for_owner(OwnerId(1)).expect("live");
            if let Some(actor) = sim.store.actor_mut(id) {
                actor.direction = FxVec2::new(FX_ONE, FX_ONE);
            }
        },
        RuleCode::ActorDirectionUnit,
    );
}

#[test]
fn validate_catches_boost_counter_overflow() {
    assert_invariant_violation(
        |sim| {
            let id = sim.store.actor_for_owner(OwnerId(2)).expect("live");
            let period = sim.config.boost_cost_period;
            if let Some(actor) = sim.store.actor_mut(id) {
                actor.boost_frame_counter = period;
            }
        },
        RuleCode::ActorBoostCounterRange,
    );
}

#[test]
fn validate_catches_boosting_below_floor() {
    assert_invariant_violation(
        |sim| {
            let id = sim.store.actor_for_owner(OwnerId(1)).expect("live");
            let floor = sim.config.min_boost_length;
            if let Some(actor) = sim.store.actor_mut(id) {
                actor.boosting = true;
                actor.length = floor - 1;
            }
        },
        RuleCode::ActorLengthFloor,
    );
}

#[test]
fn validate_catches_actor_outside_arena() {
    assert_invariant_violation(
        |sim| {
            let id = sim.store.actor_for_owner(OwnerId(2)).expect("live");
            if let Some(actor) = sim.store.actor_mut(id) {
                actor.position = IVec2::new(-50, 100).to_fx();
            }
        },
        RuleCode::ActorInsideArena,
    );
}

#[test]
fn validate_catches_orphan_segment() {
    assert_invariant_violation(
        |sim| {
            sim.store.insert_segment(Segment {
                owner: OwnerId(404),
                position: FxVec2::ZERO,
                color: Color(0),
                spawn_frame: 1,
            });
        },
        RuleCode::SegmentOwnerLive,
    );
}

#[test]
fn validate_catches_segment_from_the_future() {
    assert_invariant_violation(
        |sim| {
            sim.store.insert_segment(Segment {
                owner: OwnerId(1),
                position: FxVec2::ZERO,
                color: Color(0),
                spawn_frame: 1_000,
            });
        },
        RuleCode::SegmentSpawnFrame,
    );
}

#[test]
fn validate_catches_food_over_cap() {
    assert_invariant_violation(
        |sim| {
            sim.config.food_cap = 1;
            for _ in 0..2 {
                sim.store.insert_food(Food {
                    position: FxVec2::ZERO,
                    color: Color(0),
                });
            }
        },
        RuleCode::FoodCap,
    );
}
