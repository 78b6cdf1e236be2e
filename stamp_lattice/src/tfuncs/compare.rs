//! Refinement from comparisons known to hold.

use crate::stamp::{IntegerStamp, Stamp};

/// Refines a stamp from a comparison `x <u y` (unsigned less-than) known
/// to be true.
///
/// Two shapes give information:
///
/// ```text
/// c <u n   with c constant, n >= 0     =>  n in [max(c + 1, n.lo), n.hi]
/// n <u c   with c constant, c > 0      =>  n in [0, c - 1]
/// ```
///
/// Returns the refined stamp of the non-constant side, or `None` when the
/// comparison teaches nothing.
pub fn unsigned_compare(x: &Stamp, y: &Stamp) -> Option<Stamp> {
    let (Stamp::Integer(x), Stamp::Integer(y)) = (x, y) else {
        return None;
    };
    if x.bits() != y.bits() || (x.is_unrestricted() && y.is_unrestricted()) {
        return None;
    }
    let bits = x.bits();

    if let Some(c) = x.as_constant_value() {
        // a negative constant is huge when read unsigned
        if c < 0 || !y.is_positive() {
            return None;
        }
        let lower = c.checked_add(1)?.max(y.lower_bound());
        if lower > y.upper_bound() {
            return None;
        }
        return Some(IntegerStamp::for_range(bits, lower, y.upper_bound()).join(&Stamp::Integer(*y)));
    }

    match y.as_constant_value() {
        Some(c) if c > 0 => {
            Some(Stamp::Integer(*x).join(&IntegerStamp::for_range(bits, 0, c - 1)))
        }
        _ => None,
    }
}
