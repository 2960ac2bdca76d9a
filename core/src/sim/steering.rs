use crate::constants::TARGET_LIMIT;
use crate::fixed_point::{fx_from_int, Fx, FxVec2, IVec2, FX_ONE};
use crate::types::Actor;

/// Squared distance (Q16.16) at or under which steering is skipped: 1 unit².
const MIN_STEER_DIST_SQ: i64 = FX_ONE as i64;

/// Blends the actor's direction toward `target`.
///
/// `previous_direction` always takes the pre-frame value. Without a target,
/// with a target under a unit away, or when the blend degenerates to zero,
/// the direction holds.
pub(crate) fn steer(actor: &mut Actor, target: Option<IVec2>, turn_rate: Fx) {
    actor.previous_direction = actor.direction;

    let Some(target) = target else {
        return;
    };
    let to_target = target.clamp_abs(TARGET_LIMIT).to_fx().sub(actor.position);
    if to_target.length_sq() <= MIN_STEER_DIST_SQ {
        return;
    }
    let Some(desired) = to_target.normalize() else {
        return;
    };

    let blended = actor
        .direction
        .add(desired.sub(actor.direction).scale(turn_rate));
    if let Some(direction) = blended.normalize() {
        actor.direction = direction;
    }
}

/// `direction * speed * frame_rate`, rounded to whole units per second so
/// every site requests the same velocity.
pub(crate) fn requested_velocity(actor: &Actor, frame_rate: i32) -> IVec2 {
    actor
        .direction
        .scale(actor.speed)
        .scale(fx_from_int(frame_rate))
        .round_to_ivec()
}

/// Initial heading for a fresh spawn: toward the arena center.
pub(crate) fn initial_direction(position: FxVec2, width: i32, height: i32) -> FxVec2 {
    let center = FxVec2::new(fx_from_int(width) / 2, fx_from_int(height) / 2);
    center.sub(position).normalize().unwrap_or(FxVec2::UNIT_X)
}
