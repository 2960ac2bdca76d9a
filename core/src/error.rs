use core::fmt;

use crate::types::OwnerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    ArenaSize,
    SpawnPadding,
    FrameRate,
    Radius,
    BoostLength,
    Speed,
    TurnRate,
    BoostCostPeriod,
    SegmentSpawnInterval,
    FoodDropOffset,
    FoodCap,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArenaSize => write!(f, "arena width and height must be in 1..=16000"),
            Self::SpawnPadding => {
                write!(f, "spawn padding must cover the actor radius and stay under half the arena")
            }
            Self::FrameRate => write!(f, "frame rate must be in 1..=1000"),
            Self::Radius => {
                write!(f, "radii must be positive, fit the arena and not exceed the spawn padding")
            }
            Self::BoostLength => {
                write!(f, "min boost length must be below a non-zero initial length")
            }
            Self::Speed => {
                write!(f, "speeds must be positive and under 16000 units per second")
            }
            Self::TurnRate => write!(f, "turn rate must be in (0, 1]"),
            Self::BoostCostPeriod => write!(f, "boost cost period must be non-zero"),
            Self::SegmentSpawnInterval => write!(f, "segment spawn interval must be non-zero"),
            Self::FoodDropOffset => {
                write!(f, "food drop offset must be between 0 and the longer arena side")
            }
            Self::FoodCap => write!(f, "initial food exceeds the food cap"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    OwnerAlreadyLive { owner: OwnerId },
    UnknownOwner { owner: OwnerId },
    InvalidConfig(ConfigError),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OwnerAlreadyLive { owner } => {
                write!(f, "owner {owner} already controls a live actor")
            }
            Self::UnknownOwner { owner } => write!(f, "owner {owner} has no live actor"),
            Self::InvalidConfig(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfig(err)
    }
}

/// Invariants checked by `Simulation::validate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleCode {
    ActorOwnerUnique,
    ActorOwnerIndex,
    ActorDirectionUnit,
    ActorBoostCounterRange,
    ActorLengthFloor,
    ActorInsideArena,
    SegmentOwnerLive,
    SegmentSpawnFrame,
    FoodCap,
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActorOwnerUnique => write!(f, "ACTOR_OWNER_UNIQUE"),
            Self::ActorOwnerIndex => write!(f, "ACTOR_OWNER_INDEX"),
            Self::ActorDirectionUnit => write!(f, "ACTOR_DIRECTION_UNIT"),
            Self::ActorBoostCounterRange => write!(f, "ACTOR_BOOST_COUNTER_RANGE"),
            Self::ActorLengthFloor => write!(f, "ACTOR_LENGTH_FLOOR"),
            Self::ActorInsideArena => write!(f, "ACTOR_INSIDE_ARENA"),
            Self::SegmentOwnerLive => write!(f, "SEGMENT_OWNER_LIVE"),
            Self::SegmentSpawnFrame => write!(f, "SEGMENT_SPAWN_FRAME"),
            Self::FoodCap => write!(f, "FOOD_CAP"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TapeError {
    TooShort { actual: usize, min: usize },
    InvalidMagic { found: u32 },
    UnsupportedVersion { found: u8 },
    HeaderReservedNonZero,
    FrameCountOutOfRange { frame_count: u32, max_frames: u32 },
    Truncated { frame: u32 },
    TrailingData { expected: usize, actual: usize },
    UnknownEvent { frame: u32, tag: u8 },
    ReservedControlBits { frame: u32, flags: u8 },
    CrcMismatch { stored: u32, computed: u32 },
    TooManyEvents { frame: u32, count: usize },
}

impl fmt::Display for TapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { actual, min } => {
                write!(f, "tape too short: got {actual} bytes, need at least {min}")
            }
            Self::InvalidMagic { found } => write!(f, "invalid tape magic: 0x{found:08x}"),
            Self::UnsupportedVersion { found } => write!(f, "unsupported tape version: {found}"),
            Self::HeaderReservedNonZero => write!(f, "header reserved bytes are non-zero"),
            Self::FrameCountOutOfRange {
                frame_count,
                max_frames,
            } => write!(
                f,
                "frame count out of range: {frame_count} (allowed 0..={max_frames})"
            ),
            Self::Truncated { frame } => write!(f, "tape body truncated in frame {frame}"),
            Self::TrailingData { expected, actual } => write!(
                f,
                "tape has trailing data: expected {expected} bytes, got {actual}"
            ),
            Self::UnknownEvent { frame, tag } => {
                write!(f, "unknown event tag 0x{tag:02x} in frame {frame}")
            }
            Self::ReservedControlBits { frame, flags } => write!(
                f,
                "control flags reserved bits set at frame {frame}: 0x{flags:02x}"
            ),
            Self::CrcMismatch { stored, computed } => write!(
                f,
                "crc mismatch: stored=0x{stored:08x}, computed=0x{computed:08x}"
            ),
            Self::TooManyEvents { frame, count } => {
                write!(f, "frame {frame} has {count} events, at most 65535 fit a frame")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyError {
    Tape(TapeError),
    Sim { frame: u32, error: SimError },
    RuleViolation { frame: u32, rule: RuleCode },
    DigestMismatch { claimed: u64, computed: u64 },
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tape(err) => write!(f, "{err}"),
            Self::Sim { frame, error } => write!(f, "simulation error at frame {frame}: {error}"),
            Self::RuleViolation { frame, rule } => {
                write!(f, "rule violation at frame {frame}: {rule}")
            }
            Self::DigestMismatch { claimed, computed } => write!(
                f,
                "digest mismatch: claimed=0x{claimed:016x}, computed=0x{computed:016x}"
            ),
        }
    }
}

impl From<TapeError> for VerifyError {
    fn from(err: TapeError) -> Self {
        Self::Tape(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for SimError {}

#[cfg(feature = "std")]
impl std::error::Error for TapeError {}

#[cfg(feature = "std")]
impl std::error::Error for VerifyError {}
