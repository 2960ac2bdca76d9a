use crate::config::SimConfig;
use crate::fixed_point::{fx_from_int, FxVec2};
use crate::types::Actor;

/// Re-evaluates boost eligibility, picks the frame's speed and pays the
/// periodic length cost. Returns true on frames where the cost was paid.
///
/// Boosting requires `length > min_boost_length`, so a payment can bring the
/// length down to the threshold but never past it.
pub(crate) fn apply(actor: &mut Actor, held: bool, config: &SimConfig) -> bool {
    actor.boosting = held && actor.length > config.min_boost_length;

    if !actor.boosting {
        actor.speed = config.base_speed;
        actor.boost_frame_counter = 0;
        return false;
    }

    actor.speed = config.boost_speed;
    actor.boost_frame_counter += 1;
    if actor.boost_frame_counter < config.boost_cost_period {
        return false;
    }

    actor.boost_frame_counter = 0;
    actor.length -= 1;
    true
}

/// Where the food paid for a boost lands: behind the head along its heading.
pub(crate) fn drop_point(actor: &Actor, offset: i32) -> FxVec2 {
    actor
        .position
        .sub(actor.direction.scale(fx_from_int(offset)))
}
