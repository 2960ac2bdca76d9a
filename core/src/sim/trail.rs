use crate::types::Actor;

pub(crate) fn spawn_due(actor: &Actor, frame: u32, interval: u32) -> bool {
    frame.saturating_sub(actor.last_segment_spawn_frame) >= interval
}

/// First spawn frame a segment may carry and still be kept. May be negative
/// early in a session, in which case nothing is pruned.
pub(crate) fn oldest_allowed_frame(frame: u32, length: u32, interval: u32) -> i64 {
    frame as i64 - length as i64 * interval as i64
}

pub(crate) fn expired(spawn_frame: u32, oldest_allowed: i64) -> bool {
    (spawn_frame as i64) < oldest_allowed
}
