use crate::config::SimConfig;
use crate::fixed_point::{fx_from_int, FxVec2};

/// True when a circle of `radius` at `position` pokes out of
/// `[0, width] x [0, height]`. Touching the wall is still inside.
pub(crate) fn outside_arena(position: FxVec2, radius: i32, config: &SimConfig) -> bool {
    let r = fx_from_int(radius);
    let width = fx_from_int(config.arena_width);
    let height = fx_from_int(config.arena_height);

    position.x - r < 0 || position.y - r < 0 || position.x + r > width || position.y + r > height
}
