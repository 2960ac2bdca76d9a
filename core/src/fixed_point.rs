//! Fixed-point math for cross-site deterministic simulation.
//!
//! Formats:
//! - Q16.16 scalars (`Fx`): multiply world units by 65536
//! - Q16.16 squared lengths are carried in `i64` so they never overflow
//! - Integer vectors (`IVec2`): targets, spawn points and requested velocities
//!
//! Multiply and divide truncate toward zero. Square roots use a digit-by-digit
//! method with a fixed iteration count, so every site walks the same path.

use serde::{Deserialize, Serialize};

pub type Fx = i32;

pub const FX_SHIFT: u32 = 16;
pub const FX_ONE: Fx = 1 << FX_SHIFT;
pub const FX_HALF: Fx = FX_ONE >> 1;

/// Largest raw error tolerated on the length of a normalized vector.
pub const UNIT_EPSILON: i32 = 8;

#[inline]
pub const fn fx_from_int(value: i32) -> Fx {
    value << FX_SHIFT
}

/// (a * b) / 65536, truncated toward zero.
#[inline]
pub fn fx_mul(a: Fx, b: Fx) -> Fx {
    ((a as i64 * b as i64) / FX_ONE as i64) as Fx
}

/// (a * 65536) / b, truncated toward zero. Callers guard `b != 0`.
#[inline]
pub fn fx_div(a: Fx, b: Fx) -> Fx {
    debug_assert!(b != 0, "fixed-point division by zero");
    (((a as i64) << FX_SHIFT) / b as i64) as Fx
}

/// Square root of a non-negative Q16.16 value. Negative input yields 0.
#[inline]
pub fn fx_sqrt(value: Fx) -> Fx {
    if value <= 0 {
        return 0;
    }
    isqrt_u64((value as u64) << FX_SHIFT) as Fx
}

/// Nearest integer, ties away from zero.
#[inline]
pub fn fx_round_to_int(value: Fx) -> i32 {
    if value >= 0 {
        (value + FX_HALF) >> FX_SHIFT
    } else {
        -((-value + FX_HALF) >> FX_SHIFT)
    }
}

#[inline]
pub fn fx_abs(value: Fx) -> Fx {
    value.wrapping_abs()
}

/// Floor square root, always 32 iterations.
pub fn isqrt_u64(value: u64) -> u64 {
    let mut rem = value;
    let mut root: u64 = 0;
    let mut bit: u64 = 1 << 62;

    for _ in 0..32 {
        let trial = root + bit;
        let take = rem >= trial;
        // Branch-free select keeps the instruction stream identical across inputs.
        let mask = 0u64.wrapping_sub(take as u64);
        rem -= trial & mask;
        root = (root >> 1) + (bit & mask);
        bit >>= 2;
    }

    root
}

/// Floor square root, always 64 iterations.
pub fn isqrt_u128(value: u128) -> u128 {
    let mut rem = value;
    let mut root: u128 = 0;
    let mut bit: u128 = 1 << 126;

    for _ in 0..64 {
        let trial = root + bit;
        let take = rem >= trial;
        let mask = 0u128.wrapping_sub(take as u128);
        rem -= trial & mask;
        root = (root >> 1) + (bit & mask);
        bit >>= 2;
    }

    root
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IVec2 {
    pub x: i32,
    pub y: i32,
}

impl IVec2 {
    pub const ZERO: IVec2 = IVec2 { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn to_fx(self) -> FxVec2 {
        FxVec2::new(fx_from_int(self.x), fx_from_int(self.y))
    }

    #[inline]
    pub fn clamp_abs(self, limit: i32) -> Self {
        Self {
            x: self.x.clamp(-limit, limit),
            y: self.y.clamp(-limit, limit),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FxVec2 {
    pub x: Fx,
    pub y: Fx,
}

impl FxVec2 {
    pub const ZERO: FxVec2 = FxVec2 { x: 0, y: 0 };
    pub const UNIT_X: FxVec2 = FxVec2 { x: FX_ONE, y: 0 };

    #[inline]
    pub const fn new(x: Fx, y: Fx) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn add(self, other: FxVec2) -> FxVec2 {
        FxVec2::new(self.x + other.x, self.y + other.y)
    }

    #[inline]
    pub fn sub(self, other: FxVec2) -> FxVec2 {
        FxVec2::new(self.x - other.x, self.y - other.y)
    }

    #[inline]
    pub fn scale(self, factor: Fx) -> FxVec2 {
        FxVec2::new(fx_mul(self.x, factor), fx_mul(self.y, factor))
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Squared length in Q16.16, widened to `i64`.
    #[inline]
    pub fn length_sq(self) -> i64 {
        (self.raw_length_sq() >> FX_SHIFT) as i64
    }

    #[inline]
    fn raw_length_sq(self) -> i128 {
        let x = self.x as i128;
        let y = self.y as i128;
        x * x + y * y
    }

    /// Length in Q16.16 (floor).
    #[inline]
    pub fn length(self) -> Fx {
        isqrt_u128(self.raw_length_sq() as u128) as Fx
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    ///
    /// The magnitude is taken with 16 extra fractional bits so that short
    /// vectors normalize as precisely as long ones.
    pub fn normalize(self) -> Option<FxVec2> {
        if self.is_zero() {
            return None;
        }
        let length_q32 = isqrt_u128((self.raw_length_sq() as u128) << 32) as i128;
        if length_q32 == 0 {
            return None;
        }
        let x = self.x as i128;
        let y = self.y as i128;
        let nx = (x << 32) / length_q32;
        let ny = (y << 32) / length_q32;
        Some(FxVec2::new(nx as Fx, ny as Fx))
    }

    #[inline]
    pub fn round_to_ivec(self) -> IVec2 {
        IVec2::new(fx_round_to_int(self.x), fx_round_to_int(self.y))
    }

    /// True when the length is within `UNIT_EPSILON` raw units of one.
    #[inline]
    pub fn is_unit(self) -> bool {
        fx_abs(self.length() - FX_ONE) <= UNIT_EPSILON
    }
}

/// Squared distance between two points, Q16.16 in `i64`.
#[inline]
pub fn dist_sq(a: FxVec2, b: FxVec2) -> i64 {
    a.sub(b).length_sq()
}

/// True when two circles touch or overlap. Pure integer comparison.
#[inline]
pub fn circles_overlap(a: FxVec2, ra: Fx, b: FxVec2, rb: Fx) -> bool {
    let reach = ra as i128 + rb as i128;
    let dx = a.x as i128 - b.x as i128;
    let dy = a.y as i128 - b.y as i128;
    dx * dx + dy * dy <= reach * reach
}
