//! Integer stamps: signed bounds plus known-bit masks.
//!
//! An `IntegerStamp` describes the values `v` of a `bits`-wide integer with
//!
//! ```text
//! lower_bound <= v <= upper_bound
//! v & down_mask == down_mask        (bits known to be 1)
//! v & !up_mask  == 0                (bits known to be 0)
//! ```
//!
//! Every stamp handed out by this module is canonical: the bounds are the
//! smallest and largest values the masks allow, and the masks are the AND and
//! OR of the described values. Canonical form depends only on the described
//! set, so structural equality is set equality.

use super::Stamp;
use crate::bits::{self, mask, max_value, min_value, sign_bit, sign_extend};
use crate::error::{Result, StampError};
use crate::kind::MachineKind;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawIntegerStamp")]
pub struct IntegerStamp {
    bits: u32,
    lower_bound: i64,
    upper_bound: i64,
    down_mask: u64,
    up_mask: u64,
}

impl IntegerStamp {
    /// Validates the arguments and returns the canonical stamp for them.
    ///
    /// Rejects widths other than 1/8/16/32/64, out-of-range or inverted
    /// bounds, masks wider than `bits`, `down & !up != 0`, and bounds that
    /// the masks exclude.
    pub fn new(bits: u32, lower: i64, upper: i64, down: u64, up: u64) -> Result<Self> {
        if !bits::is_valid_integer_bits(bits) {
            return Err(StampError::InvalidBitWidth(bits));
        }
        if lower > upper {
            return Err(StampError::InvertedBounds { lower, upper });
        }
        for value in [lower, upper] {
            if value < min_value(bits) || value > max_value(bits) {
                return Err(StampError::BoundsOutOfRange {
                    bits,
                    value,
                    min: min_value(bits),
                    max: max_value(bits),
                });
            }
        }
        for m in [down, up] {
            if m & !mask(bits) != 0 {
                return Err(StampError::MaskOutOfRange { bits, mask: m });
            }
        }
        if down & !up != 0 {
            return Err(StampError::InconsistentMasks { down, up });
        }
        for bound in [lower, upper] {
            if !fits_masks(bound, bits, down, up) {
                return Err(StampError::BoundNotInMasks { bound, down, up });
            }
        }
        match Self::create(bits, lower, upper, down, up) {
            Stamp::Integer(stamp) => Ok(stamp),
            _ => Err(StampError::BoundNotInMasks {
                bound: lower,
                down,
                up,
            }),
        }
    }

    /// The stamp containing every `bits`-wide value.
    pub fn unrestricted(bits: u32) -> Self {
        Self::from_valid(bits, min_value(bits), max_value(bits), 0, mask(bits))
    }

    /// The stamp containing only `value`, truncated to `bits`.
    pub fn constant(bits: u32, value: i64) -> Self {
        let value = sign_extend(value, bits);
        let raw = value as u64 & mask(bits);
        Self::from_valid(bits, value, value, raw, raw)
    }

    /// Stamp for `[lower, upper]` with masks derived from the bounds.
    pub fn for_range(bits: u32, lower: i64, upper: i64) -> Stamp {
        Self::create(bits, lower, upper, 0, mask(bits))
    }

    /// Stamp for the values matching `down`/`up`, with bounds derived from
    /// the masks. The sign bit decides whether the range is negative,
    /// non-negative or both.
    pub fn stamp_for_mask(bits: u32, down: u64, up: u64) -> Stamp {
        let m = mask(bits);
        let (down, up) = (down & m, up & m);
        if down & !up != 0 {
            return Stamp::empty_integer(bits);
        }
        let sign = sign_bit(bits);
        let (lower, upper) = if up & sign == 0 {
            (down as i64, up as i64)
        } else if down & sign != 0 {
            (sign_extend(down as i64, bits), sign_extend(up as i64, bits))
        } else {
            (sign_extend((down | sign) as i64, bits), (up & !sign) as i64)
        };
        Self::create(bits, lower, upper, down, up)
    }

    /// Canonicalizing constructor used for every derived result.
    ///
    /// Tightens the bounds to the nearest values the masks allow, then
    /// tightens the masks with the bit prefix shared by the new bounds.
    /// Bounds outside the width are clamped. An empty description yields
    /// the Illegal stamp of the integer kind.
    pub fn create(bits: u32, lower: i64, upper: i64, down: u64, up: u64) -> Stamp {
        debug_assert!(bits::is_valid_integer_bits(bits));
        let m = mask(bits);
        let (down, up) = (down & m, up & m);
        let lower = lower.max(min_value(bits));
        let upper = upper.min(max_value(bits));
        if lower > upper || down & !up != 0 {
            return Stamp::empty_integer(bits);
        }

        let (key_down, key_up) = key_masks(bits, down, up);
        let lo_key = next_at_or_above(to_key(lower, bits), key_down, key_up, bits);
        let hi_key = next_at_or_below(to_key(upper, bits), key_down, key_up, bits);
        let (lo_key, hi_key) = match (lo_key, hi_key) {
            (Some(lo), Some(hi)) if lo <= hi => (lo, hi),
            _ => return Stamp::empty_integer(bits),
        };
        let lower = from_key(lo_key, bits);
        let upper = from_key(hi_key, bits);

        let (range_down, range_up) = masks_for_range(bits, lower, upper);
        Stamp::Integer(Self::from_valid(
            bits,
            lower,
            upper,
            down | range_down,
            up & range_up,
        ))
    }

    pub(crate) fn from_valid(bits: u32, lower: i64, upper: i64, down: u64, up: u64) -> Self {
        debug_assert!(lower <= upper, "inverted bounds [{lower}, {upper}]");
        debug_assert!(down & !up == 0);
        debug_assert!(fits_masks(lower, bits, down, up));
        debug_assert!(fits_masks(upper, bits, down, up));
        Self {
            bits,
            lower_bound: lower,
            upper_bound: upper,
            down_mask: down,
            up_mask: up,
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn lower_bound(&self) -> i64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> i64 {
        self.upper_bound
    }

    pub fn down_mask(&self) -> u64 {
        self.down_mask
    }

    pub fn up_mask(&self) -> u64 {
        self.up_mask
    }

    pub fn kind(&self) -> MachineKind {
        MachineKind::for_integer_bits(self.bits).unwrap_or(MachineKind::Illegal)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.lower_bound == min_value(self.bits)
            && self.upper_bound == max_value(self.bits)
            && self.down_mask == 0
            && self.up_mask == mask(self.bits)
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lower_bound <= value
            && value <= self.upper_bound
            && fits_masks(value, self.bits, self.down_mask, self.up_mask)
    }

    pub fn is_constant(&self) -> bool {
        self.lower_bound == self.upper_bound
    }

    pub fn as_constant_value(&self) -> Option<i64> {
        self.is_constant().then_some(self.lower_bound)
    }

    pub fn is_positive(&self) -> bool {
        self.lower_bound >= 0
    }

    pub fn is_negative(&self) -> bool {
        self.upper_bound <= 0
    }

    pub fn is_strictly_positive(&self) -> bool {
        self.lower_bound > 0
    }

    pub fn is_strictly_negative(&self) -> bool {
        self.upper_bound < 0
    }

    pub fn can_be_positive(&self) -> bool {
        self.upper_bound > 0
    }

    pub fn can_be_negative(&self) -> bool {
        self.lower_bound < 0
    }

    /// True if both bounds have the same sign.
    pub fn same_sign_bounds(&self) -> bool {
        (self.lower_bound >= 0) == (self.upper_bound >= 0)
    }

    /// Smallest value when the bits are read as unsigned.
    pub fn unsigned_lower_bound(&self) -> u64 {
        if self.same_sign_bounds() {
            self.lower_bound as u64 & mask(self.bits)
        } else {
            self.down_mask
        }
    }

    /// Largest value when the bits are read as unsigned.
    pub fn unsigned_upper_bound(&self) -> u64 {
        if self.same_sign_bounds() {
            self.upper_bound as u64 & mask(self.bits)
        } else {
            self.up_mask
        }
    }

    /// True if every value of `other` is a value of `self`.
    pub fn contains_stamp(&self, other: &IntegerStamp) -> bool {
        self.bits == other.bits
            && self.lower_bound <= other.lower_bound
            && other.upper_bound <= self.upper_bound
            && self.down_mask & !other.down_mask == 0
            && other.up_mask & !self.up_mask == 0
    }

    /// Least upper bound. Widths must agree.
    pub fn meet(&self, other: &IntegerStamp) -> Stamp {
        if self == other {
            return Stamp::Integer(*self);
        }
        if self.bits != other.bits {
            return Stamp::mismatch(self.kind(), other.kind());
        }
        Self::create(
            self.bits,
            self.lower_bound.min(other.lower_bound),
            self.upper_bound.max(other.upper_bound),
            self.down_mask & other.down_mask,
            self.up_mask | other.up_mask,
        )
    }

    /// Greatest lower bound. Disjoint stamps yield Illegal.
    pub fn join(&self, other: &IntegerStamp) -> Stamp {
        if self == other {
            return Stamp::Integer(*self);
        }
        if self.bits != other.bits {
            return Stamp::mismatch(self.kind(), other.kind());
        }
        Self::create(
            self.bits,
            self.lower_bound.max(other.lower_bound),
            self.upper_bound.min(other.upper_bound),
            self.down_mask | other.down_mask,
            self.up_mask & other.up_mask,
        )
    }
}

/// Serialized form, validated by [`IntegerStamp::new`] on the way in.
#[derive(Deserialize)]
struct RawIntegerStamp {
    bits: u32,
    lower_bound: i64,
    upper_bound: i64,
    down_mask: u64,
    up_mask: u64,
}

impl TryFrom<RawIntegerStamp> for IntegerStamp {
    type Error = StampError;

    fn try_from(raw: RawIntegerStamp) -> Result<Self> {
        Self::new(raw.bits, raw.lower_bound, raw.upper_bound, raw.down_mask, raw.up_mask)
    }
}

impl fmt::Display for IntegerStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.bits)?;
        if self.is_constant() {
            return write!(f, " [{}]", self.lower_bound);
        }
        if self.lower_bound != min_value(self.bits) || self.upper_bound != max_value(self.bits) {
            write!(f, " [{} - {}]", self.lower_bound, self.upper_bound)?;
        }
        let (range_down, range_up) = masks_for_range(self.bits, self.lower_bound, self.upper_bound);
        if self.down_mask != range_down {
            write!(f, " down={:#x}", self.down_mask)?;
        }
        if self.up_mask != range_up {
            write!(f, " up={:#x}", self.up_mask)?;
        }
        Ok(())
    }
}

/// True if the low `bits` bits of `value` agree with the masks.
pub(crate) fn fits_masks(value: i64, bits: u32, down: u64, up: u64) -> bool {
    let raw = value as u64 & mask(bits);
    raw & down == down && raw & !up == 0
}

/// Masks implied by `[lower, upper]`: the bit prefix shared by both bounds
/// is fixed, everything below it is free.
pub(crate) fn masks_for_range(bits: u32, lower: i64, upper: i64) -> (u64, u64) {
    let m = mask(bits);
    if lower == upper {
        let raw = lower as u64 & m;
        return (raw, raw);
    }
    let free = u64::MAX >> ((lower ^ upper) as u64).leading_zeros();
    ((lower as u64 & !free) & m, (lower as u64 | free) & m)
}

// Bound search runs on "keys": the raw bits with the sign bit flipped. Key
// order is unsigned order and matches signed order of the values.

fn to_key(value: i64, bits: u32) -> u64 {
    (value as u64 & mask(bits)) ^ sign_bit(bits)
}

fn from_key(key: u64, bits: u32) -> i64 {
    sign_extend((key ^ sign_bit(bits)) as i64, bits)
}

fn key_masks(bits: u32, down: u64, up: u64) -> (u64, u64) {
    let sign = sign_bit(bits);
    let (mut key_down, mut key_up) = (down & !sign, up & !sign);
    if down & sign != 0 {
        // sign known 1: key sign known 0
    } else if up & sign != 0 {
        key_up |= sign;
    } else {
        key_down |= sign;
        key_up |= sign;
    }
    (key_down, key_up)
}

/// Smallest `k >= start` with `k & down == down` and `k & !up == 0`.
fn next_at_or_above(start: u64, down: u64, up: u64, bits: u32) -> Option<u64> {
    let m = mask(bits);
    let conflicts = ((down & !start) | (start & !up)) & m;
    if conflicts == 0 {
        return Some(start);
    }
    // Any answer must differ from `start` at or above the highest conflict,
    // by turning on a 0 bit that may be set.
    let highest = 63 - conflicts.leading_zeros();
    let candidates = !start & up & m & !bits::low_bits(highest);
    if candidates == 0 {
        return None;
    }
    let pos = candidates.trailing_zeros();
    Some((start & !bits::low_bits(pos + 1)) | (1u64 << pos) | (down & bits::low_bits(pos)))
}

/// Largest `k <= start` with `k & down == down` and `k & !up == 0`.
fn next_at_or_below(start: u64, down: u64, up: u64, bits: u32) -> Option<u64> {
    let m = mask(bits);
    next_at_or_above(!start & m, !up & m, !down & m, bits).map(|k| !k & m)
}
