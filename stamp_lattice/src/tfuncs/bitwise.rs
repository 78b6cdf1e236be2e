//! Transfer functions for bitwise logic and bit counting.
//!
//! These work on the known-bit masks first; bounds follow from the masks
//! through [`IntegerStamp::stamp_for_mask`].

use super::{integer_binary, integer_unary};
use crate::bits::mask;
use crate::stamp::{IntegerStamp, Stamp};

/// Bitwise complement: `!x == -x - 1`, so bounds swap and flip.
pub fn bitwise_not(s: &Stamp) -> Stamp {
    integer_unary(s, |x| {
        let m = mask(x.bits());
        IntegerStamp::create(
            x.bits(),
            !x.upper_bound(),
            !x.lower_bound(),
            !x.up_mask() & m,
            !x.down_mask() & m,
        )
    })
}

/// Bitwise and.
///
/// ```text
/// down = a.down & b.down
/// up   = a.up & b.up
/// a >= 0  =>  0 <= a & b <= a
/// ```
pub fn and(a: &Stamp, b: &Stamp) -> Stamp {
    integer_binary(a, b, |x, y| {
        let bits = x.bits();
        let by_mask = IntegerStamp::stamp_for_mask(
            bits,
            x.down_mask() & y.down_mask(),
            x.up_mask() & y.up_mask(),
        );
        let limit = match (x.is_positive(), y.is_positive()) {
            (true, true) => Some(x.upper_bound().min(y.upper_bound())),
            (true, false) => Some(x.upper_bound()),
            (false, true) => Some(y.upper_bound()),
            (false, false) => None,
        };
        match limit {
            Some(hi) => by_mask.join(&IntegerStamp::for_range(bits, 0, hi)),
            None => by_mask,
        }
    })
}

/// Bitwise or.
pub fn or(a: &Stamp, b: &Stamp) -> Stamp {
    integer_binary(a, b, |x, y| {
        IntegerStamp::stamp_for_mask(
            x.bits(),
            x.down_mask() | y.down_mask(),
            x.up_mask() | y.up_mask(),
        )
    })
}

/// Bitwise exclusive or. A result bit is known when both operand bits are.
pub fn xor(a: &Stamp, b: &Stamp) -> Stamp {
    integer_binary(a, b, |x, y| {
        let variable = (x.down_mask() ^ x.up_mask()) | (y.down_mask() ^ y.up_mask());
        let known = x.down_mask() ^ y.down_mask();
        IntegerStamp::stamp_for_mask(x.bits(), known & !variable, known | variable)
    })
}

fn leading_zeros_in(value: u64, bits: u32) -> i64 {
    i64::from(value.leading_zeros() - (64 - bits))
}

fn trailing_zeros_in(value: u64, bits: u32) -> i64 {
    i64::from(value.trailing_zeros().min(bits))
}

/// Number of leading zero bits, as a 32-bit stamp in `[0, bits]`.
pub fn leading_zeros(s: &Stamp) -> Stamp {
    integer_unary(s, |x| {
        let bits = x.bits();
        IntegerStamp::for_range(
            32,
            leading_zeros_in(x.up_mask(), bits),
            leading_zeros_in(x.down_mask(), bits),
        )
    })
}

/// Number of trailing zero bits, as a 32-bit stamp in `[0, bits]`.
pub fn trailing_zeros(s: &Stamp) -> Stamp {
    integer_unary(s, |x| {
        let bits = x.bits();
        IntegerStamp::for_range(
            32,
            trailing_zeros_in(x.up_mask(), bits),
            trailing_zeros_in(x.down_mask(), bits),
        )
    })
}

/// Population count, as a 32-bit stamp.
pub fn bit_count(s: &Stamp) -> Stamp {
    integer_unary(s, |x| {
        IntegerStamp::for_range(
            32,
            i64::from(x.down_mask().count_ones()),
            i64::from(x.up_mask().count_ones()),
        )
    })
}
