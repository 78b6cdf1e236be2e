//! Transfer functions for shifts.
//!
//! Shift amounts are taken modulo the value width. A small range of amounts
//! is enumerated and the per-amount results are merged; anything wider falls
//! back to a coarse stamp.

use crate::bits::{self, mask};
use crate::config::DEFAULT_MAX_SHIFT_ITERATIONS;
use crate::diagnostics::emit_shift_range_too_wide;
use crate::stamp::{IntegerStamp, Stamp};

/// `value << amount`.
pub fn left_shift(value: &Stamp, amount: &Stamp) -> Stamp {
    left_shift_bounded(value, amount, DEFAULT_MAX_SHIFT_ITERATIONS)
}

/// `value >> amount` (arithmetic).
pub fn right_shift(value: &Stamp, amount: &Stamp) -> Stamp {
    right_shift_bounded(value, amount, DEFAULT_MAX_SHIFT_ITERATIONS)
}

/// `value >>> amount` (logical).
pub fn unsigned_right_shift(value: &Stamp, amount: &Stamp) -> Stamp {
    unsigned_right_shift_bounded(value, amount, DEFAULT_MAX_SHIFT_ITERATIONS)
}

pub fn left_shift_bounded(value: &Stamp, amount: &Stamp, max_iterations: u32) -> Stamp {
    shift(value, amount, max_iterations, shl_by, |v| {
        Stamp::Integer(IntegerStamp::unrestricted(v.bits()))
    })
}

pub fn right_shift_bounded(value: &Stamp, amount: &Stamp, max_iterations: u32) -> Stamp {
    shift(value, amount, max_iterations, shr_by, |v| {
        // x >> n lies between x and its sign
        let lower = v.lower_bound().min(0);
        let upper = if v.upper_bound() >= 0 { v.upper_bound() } else { -1 };
        IntegerStamp::for_range(v.bits(), lower, upper)
    })
}

pub fn unsigned_right_shift_bounded(value: &Stamp, amount: &Stamp, max_iterations: u32) -> Stamp {
    shift(value, amount, max_iterations, ushr_by, |v| {
        IntegerStamp::stamp_for_mask(v.bits(), 0, up_mask_for(v))
    })
}

/// Every bit at or below the highest bit any value of `s` may set.
fn up_mask_for(s: &IntegerStamp) -> u64 {
    let m = mask(s.bits());
    let highest = (s.lower_bound() | s.upper_bound()) as u64 & m;
    if highest == 0 {
        0
    } else {
        bits::low_bits(64 - highest.leading_zeros()) & m
    }
}

fn shift(
    value: &Stamp,
    amount: &Stamp,
    max_iterations: u32,
    by_constant: fn(&IntegerStamp, u32) -> Stamp,
    fallback: impl FnOnce(&IntegerStamp) -> Stamp,
) -> Stamp {
    let (v, a) = match (value, amount) {
        (Stamp::Illegal(_), _) => return value.clone(),
        (_, Stamp::Illegal(_)) => return value.empty(),
        (Stamp::Integer(v), Stamp::Integer(a)) => (v, a),
        _ => return value.unrestricted(),
    };
    let shift_mask = i64::from(v.bits() - 1);
    if let Some(n) = a.as_constant_value() {
        return by_constant(v, (n & shift_mask) as u32);
    }

    let period_bits = shift_mask.count_ones();
    let (lo, hi) = (a.lower_bound(), a.upper_bound());
    let count = (hi as i128 - lo as i128 + 1) as u64;
    if lo >> period_bits == hi >> period_bits && count <= u64::from(max_iterations) {
        let mut result: Option<Stamp> = None;
        for i in (lo..=hi).filter(|i| a.contains(*i)) {
            let s = by_constant(v, (i & shift_mask) as u32);
            result = Some(match result {
                None => s,
                Some(r) => r.meet(&s),
            });
        }
        if let Some(result) = result {
            return result;
        }
    }
    emit_shift_range_too_wide(count);
    fallback(v)
}

fn shl_by(v: &IntegerStamp, n: u32) -> Stamp {
    if n == 0 {
        return Stamp::Integer(*v);
    }
    let bits = v.bits();
    let m = mask(bits);
    let down = (v.down_mask() << n) & m;
    let up = (v.up_mask() << n) & m;
    // bits shifted out of the value, including the sign position
    let removed = -1i64 << (bits - n - 1);
    if v.lower_bound() & removed == 0 && v.upper_bound() & removed == 0 {
        return IntegerStamp::create(
            bits,
            v.lower_bound() << n,
            v.upper_bound() << n,
            down,
            up,
        );
    }
    IntegerStamp::stamp_for_mask(bits, down, up)
}

fn shr_by(v: &IntegerStamp, n: u32) -> Stamp {
    if n == 0 {
        return Stamp::Integer(*v);
    }
    let bits = v.bits();
    let m = mask(bits);
    let down = (bits::sign_extend(v.down_mask() as i64, bits) >> n) as u64 & m;
    let up = (bits::sign_extend(v.up_mask() as i64, bits) >> n) as u64 & m;
    IntegerStamp::create(bits, v.lower_bound() >> n, v.upper_bound() >> n, down, up)
}

fn ushr_by(v: &IntegerStamp, n: u32) -> Stamp {
    if n == 0 {
        return Stamp::Integer(*v);
    }
    let bits = v.bits();
    let m = mask(bits);
    let down = v.down_mask() >> n;
    let up = v.up_mask() >> n;
    if v.same_sign_bounds() {
        let lower = ((v.lower_bound() as u64 & m) >> n) as i64;
        let upper = ((v.upper_bound() as u64 & m) >> n) as i64;
        return IntegerStamp::create(bits, lower, upper, down, up);
    }
    IntegerStamp::stamp_for_mask(bits, down, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticReason, DiagnosticsCollector};

    fn int(lo: i64, hi: i64) -> Stamp {
        IntegerStamp::for_range(32, lo, hi)
    }

    fn bounds(s: &Stamp) -> (i64, i64) {
        let i = s.as_integer().expect("integer stamp");
        (i.lower_bound(), i.upper_bound())
    }

    #[test]
    fn test_shl_constant_amount() {
        assert_eq!(bounds(&left_shift(&int(1, 3), &int(2, 2))), (4, 12));
        let s = left_shift(&int(1, 3), &int(2, 2));
        assert_eq!(s.as_integer().unwrap().up_mask() & 0b11, 0);
    }

    #[test]
    fn test_shl_amount_wraps_modulo_width() {
        assert_eq!(left_shift(&int(1, 1), &int(33, 33)), int(2, 2));
        assert_eq!(left_shift(&int(1, 1), &int(-1, -1)), int(i32::MIN as i64, i32::MIN as i64));
    }

    #[test]
    fn test_shl_losing_bits() {
        let s = left_shift(&int(0, i32::MAX as i64), &int(1, 1));
        let i = s.as_integer().unwrap();
        assert_eq!(i.up_mask() & 1, 0);
        assert!(i.contains(-2));
    }

    #[test]
    fn test_shl_range_of_amounts() {
        assert_eq!(bounds(&left_shift(&int(1, 1), &int(0, 3))), (1, 8));
    }

    #[test]
    fn test_shr() {
        assert_eq!(right_shift(&int(-16, 16), &int(2, 2)), int(-4, 4));
        assert_eq!(bounds(&right_shift(&int(-16, 16), &int(0, 31))), (-16, 16));
        assert_eq!(right_shift(&int(-1, -1), &int(5, 5)), int(-1, -1));
    }

    #[test]
    fn test_ushr() {
        assert_eq!(unsigned_right_shift(&int(16, 32), &int(4, 4)), int(1, 2));
        let s = unsigned_right_shift(&int(-1, -1), &int(28, 28));
        assert_eq!(s, int(15, 15));
        let mixed = unsigned_right_shift(&int(-1, 1), &int(31, 31));
        assert_eq!(bounds(&mixed), (0, 1));
    }

    #[test]
    fn test_wide_amount_range_falls_back() {
        DiagnosticsCollector::enable();
        DiagnosticsCollector::clear();
        assert!(left_shift(&int(1, 1), &int(0, 100)).is_unrestricted());
        assert_eq!(bounds(&right_shift(&int(-8, 4), &int(0, 100))), (-8, 4));
        assert_eq!(bounds(&unsigned_right_shift(&int(0, 100), &int(0, 100))), (0, 127));
        let diags = DiagnosticsCollector::take();
        DiagnosticsCollector::disable();
        assert_eq!(diags.len(), 3);
        assert!(matches!(diags[0].reason, DiagnosticReason::ShiftRangeTooWide(101)));
    }

    #[test]
    fn test_iteration_limit() {
        let s = left_shift_bounded(&int(1, 1), &int(0, 3), 2);
        assert!(s.is_unrestricted());
    }

    #[test]
    fn test_illegal_operands() {
        let empty = Stamp::Illegal(crate::kind::MachineKind::Int);
        assert_eq!(left_shift(&empty, &int(1, 1)), empty);
        assert_eq!(left_shift(&int(1, 1), &empty), empty);
    }

    #[test]
    fn test_long_value_int_amount() {
        let long = IntegerStamp::for_range(64, 1, 1);
        let s = left_shift(&long, &int(40, 40));
        assert_eq!(s, IntegerStamp::for_range(64, 1 << 40, 1 << 40));
    }
}
