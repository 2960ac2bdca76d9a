//! Scripted players. Every controller is a pure function of its own seed and
//! the actor state it is shown, so a recorded session is reproducible.

use arena_core::fixed_point::{fx_round_to_int, IVec2};
use arena_core::rng::SeededRng;
use arena_core::types::Actor;
use arena_core::{ControlInput, SimConfig};

pub trait Controller: Send {
    fn name(&self) -> &'static str;

    /// Control for `frame`. Only asked while the owner has a live actor.
    fn control(&mut self, frame: u32, actor: &Actor, config: &SimConfig) -> ControlInput;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotKind {
    Wanderer,
    Circler,
    Booster,
}

impl BotKind {
    const ROTATION: [BotKind; 3] = [BotKind::Wanderer, BotKind::Circler, BotKind::Booster];

    /// Kinds are dealt round-robin so any bot count gets a mix.
    pub fn for_index(index: u32) -> Self {
        Self::ROTATION[index as usize % Self::ROTATION.len()]
    }

    pub fn build(self, seed: u32) -> Box<dyn Controller> {
        match self {
            Self::Wanderer => Box::new(Wanderer::new(seed)),
            Self::Circler => Box::new(Circler::new(seed)),
            Self::Booster => Box::new(Booster::new(seed)),
        }
    }
}

fn position_units(actor: &Actor) -> IVec2 {
    IVec2::new(fx_round_to_int(actor.position.x), fx_round_to_int(actor.position.y))
}

fn near(a: IVec2, b: IVec2, radius: i32) -> bool {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy <= (radius as i64) * (radius as i64)
}

fn random_waypoint(rng: &mut SeededRng, config: &SimConfig) -> IVec2 {
    let pad = config.spawn_padding;
    IVec2::new(
        rng.next_range(pad, config.arena_width - pad),
        rng.next_range(pad, config.arena_height - pad),
    )
}

/// Picks a random waypoint, heads for it, and picks another once close or
/// after a timeout.
pub struct Wanderer {
    rng: SeededRng,
    waypoint: Option<IVec2>,
    picked_at: u32,
}

impl Wanderer {
    const ARRIVAL_RADIUS: i32 = 60;
    const TIMEOUT_FRAMES: u32 = 240;

    pub fn new(seed: u32) -> Self {
        Self {
            rng: SeededRng::new(seed),
            waypoint: None,
            picked_at: 0,
        }
    }
}

impl Controller for Wanderer {
    fn name(&self) -> &'static str {
        "wanderer"
    }

    fn control(&mut self, frame: u32, actor: &Actor, config: &SimConfig) -> ControlInput {
        let here = position_units(actor);
        let stale = match self.waypoint {
            Some(waypoint) => {
                near(here, waypoint, Self::ARRIVAL_RADIUS)
                    || frame.saturating_sub(self.picked_at) > Self::TIMEOUT_FRAMES
            }
            None => true,
        };
        if stale {
            self.waypoint = Some(random_waypoint(&mut self.rng, config));
            self.picked_at = frame;
        }
        ControlInput {
            target: self.waypoint,
            boost: false,
        }
    }
}

/// Laps an octagon around the arena center.
pub struct Circler {
    corner: usize,
    clockwise: bool,
}

impl Circler {
    // Octagon corners as (x, y) offsets in eighths of the half-extent.
    const CORNERS: [(i32, i32); 8] = [
        (8, 0),
        (6, 6),
        (0, 8),
        (-6, 6),
        (-8, 0),
        (-6, -6),
        (0, -8),
        (6, -6),
    ];
    const ARRIVAL_RADIUS: i32 = 80;

    pub fn new(seed: u32) -> Self {
        let mut rng = SeededRng::new(seed);
        Self {
            corner: rng.next_int(Self::CORNERS.len() as u32) as usize,
            clockwise: rng.next() & 1 == 0,
        }
    }

    fn corner_point(&self, config: &SimConfig) -> IVec2 {
        let (cx, cy) = (config.arena_width / 2, config.arena_height / 2);
        let reach_x = (cx - config.spawn_padding).max(0) / 8;
        let reach_y = (cy - config.spawn_padding).max(0) / 8;
        let (ox, oy) = Self::CORNERS[self.corner];
        IVec2::new(cx + ox * reach_x, cy + oy * reach_y)
    }
}

impl Controller for Circler {
    fn name(&self) -> &'static str {
        "circler"
    }

    fn control(&mut self, _frame: u32, actor: &Actor, config: &SimConfig) -> ControlInput {
        if near(position_units(actor), self.corner_point(config), Self::ARRIVAL_RADIUS) {
            let count = Self::CORNERS.len();
            self.corner = if self.clockwise {
                (self.corner + 1) % count
            } else {
                (self.corner + count - 1) % count
            };
        }
        ControlInput::toward(self.corner_point(config))
    }
}

/// Sprints between random waypoints while it can afford to, then cruises
/// until it has regrown.
pub struct Booster {
    wanderer: Wanderer,
    sprinting: bool,
}

impl Booster {
    /// Spare length kept above the boost threshold before sprinting again.
    const RESERVE: u32 = 3;

    pub fn new(seed: u32) -> Self {
        Self {
            wanderer: Wanderer::new(seed ^ 0x9E37_79B9),
            sprinting: true,
        }
    }
}

impl Controller for Booster {
    fn name(&self) -> &'static str {
        "booster"
    }

    fn control(&mut self, frame: u32, actor: &Actor, config: &SimConfig) -> ControlInput {
        if actor.length <= config.min_boost_length {
            self.sprinting = false;
        } else if actor.length >= config.min_boost_length + Self::RESERVE {
            self.sprinting = true;
        }
        let mut control = self.wanderer.control(frame, actor, config);
        control.boost = self.sprinting;
        control
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::fixed_point::FxVec2;
    use arena_core::types::Color;
    use arena_core::OwnerId;

    fn actor_at(x: i32, y: i32, length: u32) -> Actor {
        Actor {
            owner: OwnerId(1),
            position: IVec2::new(x, y).to_fx(),
            direction: FxVec2::UNIT_X,
            previous_direction: FxVec2::UNIT_X,
            length,
            boost_frame_counter: 0,
            boosting: false,
            speed: 0,
            last_segment_spawn_frame: 0,
            color: Color(0),
            spawn_frame: 0,
        }
    }

    #[test]
    fn same_seed_same_controls() {
        let config = SimConfig::default();
        let mut a = BotKind::Wanderer.build(9);
        let mut b = BotKind::Wanderer.build(9);
        let actor = actor_at(1_000, 1_000, 15);
        for frame in 1..600 {
            assert_eq!(
                a.control(frame, &actor, &config),
                b.control(frame, &actor, &config)
            );
        }
    }

    #[test]
    fn wanderer_targets_stay_inside_spawn_area() {
        let config = SimConfig::default();
        let mut bot = Wanderer::new(1234);
        let actor = actor_at(2_000, 2_000, 15);
        for frame in (1..5_000).step_by(Wanderer::TIMEOUT_FRAMES as usize + 1) {
            let target = bot.control(frame, &actor, &config).target.expect("always steers");
            assert!(target.x >= config.spawn_padding && target.x < config.arena_width - config.spawn_padding);
            assert!(target.y >= config.spawn_padding && target.y < config.arena_height - config.spawn_padding);
        }
    }

    #[test]
    fn circler_advances_on_arrival() {
        let config = SimConfig::default();
        let mut bot = Circler::new(5);
        let first = bot.corner_point(&config);
        let control = bot.control(1, &actor_at(first.x, first.y, 15), &config);
        assert_ne!(control.target, Some(first));
    }

    #[test]
    fn booster_rests_at_threshold_and_resumes_after_regrowth() {
        let config = SimConfig::default();
        let mut bot = Booster::new(3);
        assert!(bot.control(1, &actor_at(2_000, 2_000, 15), &config).boost);
        assert!(!bot.control(2, &actor_at(2_000, 2_000, config.min_boost_length), &config).boost);
        assert!(!bot.control(3, &actor_at(2_000, 2_000, config.min_boost_length + 1), &config).boost);
        assert!(bot.control(4, &actor_at(2_000, 2_000, config.min_boost_length + Booster::RESERVE), &config).boost);
    }

    #[test]
    fn kinds_rotate() {
        assert_eq!(BotKind::for_index(0), BotKind::Wanderer);
        assert_eq!(BotKind::for_index(4), BotKind::Circler);
        assert_eq!(BotKind::for_index(5).build(1).name(), "booster");
    }
}
