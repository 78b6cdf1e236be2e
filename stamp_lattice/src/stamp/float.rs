//! Floating-point stamps.

use super::Stamp;
use crate::constant::Constant;
use crate::error::{Result, StampError};
use crate::kind::MachineKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A range of floating-point values, optionally including NaN.
///
/// Bounds are inclusive and ordered with `-0.0` below `0.0`, so `[0.0, 0.0]`
/// holds only positive zero. The NaN-only stamp has NaN for both bounds and
/// `non_nan == false`; no other stamp has a NaN bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawFloatStamp")]
pub struct FloatStamp {
    bits: u32,
    lower_bound: f64,
    upper_bound: f64,
    non_nan: bool,
}

impl FloatStamp {
    pub fn new(bits: u32, lower: f64, upper: f64, non_nan: bool) -> Result<Self> {
        if bits != 32 && bits != 64 {
            return Err(StampError::InvalidBitWidth(bits));
        }
        match (lower.is_nan(), upper.is_nan()) {
            (true, true) if !non_nan => Ok(Self::nan_only(bits)),
            (false, false) if lower.total_cmp(&upper).is_le() => Ok(Self {
                bits,
                lower_bound: lower,
                upper_bound: upper,
                non_nan,
            }),
            _ => Err(StampError::InvalidFloatBounds { lower, upper }),
        }
    }

    pub fn unrestricted(bits: u32) -> Self {
        Self {
            bits,
            lower_bound: f64::NEG_INFINITY,
            upper_bound: f64::INFINITY,
            non_nan: false,
        }
    }

    /// Stamp whose only value is NaN.
    pub fn nan_only(bits: u32) -> Self {
        Self {
            bits,
            lower_bound: f64::NAN,
            upper_bound: f64::NAN,
            non_nan: false,
        }
    }

    pub fn constant(bits: u32, value: f64) -> Self {
        if value.is_nan() {
            Self::nan_only(bits)
        } else {
            Self {
                bits,
                lower_bound: value,
                upper_bound: value,
                non_nan: true,
            }
        }
    }

    /// Canonicalizing constructor: inverted or NaN bounds leave only NaN,
    /// which is empty when `non_nan` is set.
    pub fn create(bits: u32, lower: f64, upper: f64, non_nan: bool) -> Stamp {
        if lower.is_nan() || upper.is_nan() || lower.total_cmp(&upper).is_gt() {
            if non_nan {
                return Stamp::Illegal(Self::kind_for_bits(bits));
            }
            return Stamp::Float(Self::nan_only(bits));
        }
        Stamp::Float(Self {
            bits,
            lower_bound: lower,
            upper_bound: upper,
            non_nan,
        })
    }

    fn kind_for_bits(bits: u32) -> MachineKind {
        MachineKind::for_float_bits(bits).unwrap_or(MachineKind::Illegal)
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn kind(&self) -> MachineKind {
        Self::kind_for_bits(self.bits)
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn is_non_nan(&self) -> bool {
        self.non_nan
    }

    pub fn is_nan_only(&self) -> bool {
        self.lower_bound.is_nan()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.lower_bound == f64::NEG_INFINITY && self.upper_bound == f64::INFINITY && !self.non_nan
    }

    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            !self.non_nan
        } else {
            self.lower_bound.total_cmp(&value).is_le() && value.total_cmp(&self.upper_bound).is_le()
        }
    }

    /// The single value of this stamp.
    pub fn as_constant(&self) -> Option<Constant> {
        if !self.non_nan || self.lower_bound.to_bits() != self.upper_bound.to_bits() {
            return None;
        }
        Some(if self.bits == 32 {
            Constant::Float(self.lower_bound as f32)
        } else {
            Constant::Double(self.lower_bound)
        })
    }

    pub fn meet(&self, other: &FloatStamp) -> Stamp {
        if self == other {
            return Stamp::Float(*self);
        }
        if self.bits != other.bits {
            return Stamp::mismatch(self.kind(), other.kind());
        }
        Stamp::Float(Self {
            bits: self.bits,
            lower_bound: meet_bound(self.lower_bound, other.lower_bound, lower_of),
            upper_bound: meet_bound(self.upper_bound, other.upper_bound, upper_of),
            non_nan: self.non_nan && other.non_nan,
        })
    }

    pub fn join(&self, other: &FloatStamp) -> Stamp {
        if self == other {
            return Stamp::Float(*self);
        }
        if self.bits != other.bits {
            return Stamp::mismatch(self.kind(), other.kind());
        }
        let lower = if self.is_nan_only() || other.is_nan_only() {
            f64::NAN
        } else {
            upper_of(self.lower_bound, other.lower_bound)
        };
        let upper = if self.is_nan_only() || other.is_nan_only() {
            f64::NAN
        } else {
            lower_of(self.upper_bound, other.upper_bound)
        };
        Self::create(self.bits, lower, upper, self.non_nan || other.non_nan)
    }
}

/// Combines bounds ignoring a NaN side.
fn meet_bound(a: f64, b: f64, pick: fn(f64, f64) -> f64) -> f64 {
    match (a.is_nan(), b.is_nan()) {
        (true, _) => b,
        (_, true) => a,
        _ => pick(a, b),
    }
}

// Ties between signed zeros resolve the same way regardless of argument
// order so that meet and join commute bit-for-bit.

fn lower_of(a: f64, b: f64) -> f64 {
    if a < b || (a == b && a.is_sign_negative()) {
        a
    } else {
        b
    }
}

fn upper_of(a: f64, b: f64) -> f64 {
    if a > b || (a == b && a.is_sign_positive()) {
        a
    } else {
        b
    }
}

/// Serialized form, validated by [`FloatStamp::new`] on the way in.
#[derive(Deserialize)]
struct RawFloatStamp {
    bits: u32,
    lower_bound: f64,
    upper_bound: f64,
    non_nan: bool,
}

impl TryFrom<RawFloatStamp> for FloatStamp {
    type Error = StampError;

    fn try_from(raw: RawFloatStamp) -> Result<Self> {
        Self::new(raw.bits, raw.lower_bound, raw.upper_bound, raw.non_nan)
    }
}

impl PartialEq for FloatStamp {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
            && self.lower_bound.to_bits() == other.lower_bound.to_bits()
            && self.upper_bound.to_bits() == other.upper_bound.to_bits()
            && self.non_nan == other.non_nan
    }
}

impl Eq for FloatStamp {}

impl Hash for FloatStamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
        self.lower_bound.to_bits().hash(state);
        self.upper_bound.to_bits().hash(state);
        self.non_nan.hash(state);
    }
}

impl fmt::Display for FloatStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.bits)?;
        if self.is_nan_only() {
            return f.write_str(" NaN");
        }
        if self.lower_bound != f64::NEG_INFINITY || self.upper_bound != f64::INFINITY {
            write!(f, " [{} - {}]", self.lower_bound, self.upper_bound)?;
        }
        if !self.non_nan {
            f.write_str(" NaN?")?;
        }
        Ok(())
    }
}
