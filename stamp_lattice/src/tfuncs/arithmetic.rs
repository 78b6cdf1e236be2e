//! Transfer functions for arithmetic operations.
//!
//! Integer results are sound for two's-complement wrapping semantics. When a
//! bound computation may overflow the result falls back to a wider stamp
//! instead of a wrapped range.

use super::{float_ops, integer_binary, integer_unary};
use crate::bits::{mask, max_value, min_value};
use crate::diagnostics::emit_overflow_collapse;
use crate::stamp::{IntegerStamp, Stamp};

/// Negation.
///
/// ```text
/// -[lo, hi] = [-hi, -lo]         (lo > MIN)
/// -[MIN, hi] = unrestricted      (-MIN overflows)
/// ```
pub fn negate(s: &Stamp) -> Stamp {
    match s {
        Stamp::Float(f) => float_ops::negate(f),
        _ => integer_unary(s, negate_integer),
    }
}

pub(crate) fn negate_integer(s: &IntegerStamp) -> Stamp {
    let bits = s.bits();
    if s.lower_bound() == min_value(bits) {
        return Stamp::Integer(IntegerStamp::unrestricted(bits));
    }
    IntegerStamp::for_range(bits, -s.upper_bound(), -s.lower_bound())
}

/// Addition with carry-aware mask propagation.
///
/// A result bit is known when both operand bits are known and the carry
/// into it is the same for the smallest and largest mask values.
pub fn add(a: &Stamp, b: &Stamp) -> Stamp {
    match (a, b) {
        (Stamp::Float(x), Stamp::Float(y)) => float_ops::add(x, y),
        _ => integer_binary(a, b, add_integer),
    }
}

fn carry_bits(x: u64, y: u64) -> u64 {
    x.wrapping_add(y) ^ x ^ y
}

pub(crate) fn add_overflows_positively(x: i64, y: i64, bits: u32) -> bool {
    let result = x.wrapping_add(y);
    if bits == 64 {
        (!x & !y & result) < 0
    } else {
        result > max_value(bits)
    }
}

pub(crate) fn add_overflows_negatively(x: i64, y: i64, bits: u32) -> bool {
    let result = x.wrapping_add(y);
    if bits == 64 {
        (x & y & !result) < 0
    } else {
        result < min_value(bits)
    }
}

pub(crate) fn add_integer(a: &IntegerStamp, b: &IntegerStamp) -> Stamp {
    if a.is_unrestricted() {
        return Stamp::Integer(*a);
    }
    if b.is_unrestricted() {
        return Stamp::Integer(*b);
    }
    let bits = a.bits();
    let m = mask(bits);

    let variable = (a.down_mask() ^ a.up_mask()) | (b.down_mask() ^ b.up_mask());
    let variable_with_carry = variable
        | (carry_bits(a.down_mask(), b.down_mask()) ^ carry_bits(a.up_mask(), b.up_mask()));
    let sum = a.down_mask().wrapping_add(b.down_mask());
    let new_down = sum & !variable_with_carry & m;
    let new_up = (sum | variable_with_carry) & m;

    let (lo_a, lo_b) = (a.lower_bound(), b.lower_bound());
    let (hi_a, hi_b) = (a.upper_bound(), b.upper_bound());
    if add_overflows_positively(lo_a, lo_b, bits)
        || add_overflows_negatively(lo_a, lo_b, bits)
        || add_overflows_positively(hi_a, hi_b, bits)
        || add_overflows_negatively(hi_a, hi_b, bits)
    {
        emit_overflow_collapse("add", || format!("{} + {}", a, b));
        return Stamp::Integer(IntegerStamp::unrestricted(bits));
    }

    IntegerStamp::create(
        bits,
        lo_a.wrapping_add(lo_b),
        hi_a.wrapping_add(hi_b),
        new_down,
        new_up,
    )
}

/// `a - b`, computed as `a + (-b)`.
pub fn sub(a: &Stamp, b: &Stamp) -> Stamp {
    match (a, b) {
        (Stamp::Float(x), Stamp::Float(y)) => float_ops::sub(x, y),
        _ => integer_binary(a, b, |x, y| match negate_integer(y) {
            Stamp::Integer(neg) => add_integer(x, &neg),
            other => other,
        }),
    }
}

fn multiplication_overflows(x: i64, y: i64, bits: u32) -> bool {
    match x.checked_mul(y) {
        None => true,
        Some(r) => bits < 64 && (r < min_value(bits) || r > max_value(bits)),
    }
}

/// Multiplication.
///
/// Bounds are the extreme corner products; the result keeps the trailing
/// zeros both operands are known to have.
pub fn mul(a: &Stamp, b: &Stamp) -> Stamp {
    match (a, b) {
        (Stamp::Float(x), Stamp::Float(y)) => float_ops::mul(x, y),
        _ => integer_binary(a, b, mul_integer),
    }
}

fn mul_integer(a: &IntegerStamp, b: &IntegerStamp) -> Stamp {
    if a.up_mask() == 0 {
        return Stamp::Integer(*a);
    }
    if b.up_mask() == 0 {
        return Stamp::Integer(*b);
    }
    let bits = a.bits();
    let zeros = a.up_mask().trailing_zeros() + b.up_mask().trailing_zeros();
    let up = !crate::bits::low_bits(zeros) & mask(bits);

    let corners = [
        (a.lower_bound(), b.lower_bound()),
        (a.lower_bound(), b.upper_bound()),
        (a.upper_bound(), b.lower_bound()),
        (a.upper_bound(), b.upper_bound()),
    ];
    if corners
        .iter()
        .any(|(x, y)| multiplication_overflows(*x, *y, bits))
    {
        emit_overflow_collapse("mul", || format!("{} * {}", a, b));
        return IntegerStamp::stamp_for_mask(bits, 0, up);
    }
    let products = corners.map(|(x, y)| x * y);
    let lower = products.iter().copied().min().unwrap_or(min_value(bits));
    let upper = products.iter().copied().max().unwrap_or(max_value(bits));
    IntegerStamp::create(bits, lower, upper, 0, up)
}

/// Signed division (truncating).
///
/// Only refined when the divisor is strictly positive.
pub fn div(a: &Stamp, b: &Stamp) -> Stamp {
    match (a, b) {
        (Stamp::Float(x), Stamp::Float(y)) => float_ops::div(x, y),
        _ => integer_binary(a, b, div_integer),
    }
}

fn div_integer(a: &IntegerStamp, b: &IntegerStamp) -> Stamp {
    let bits = a.bits();
    if !b.is_strictly_positive() {
        return Stamp::Integer(IntegerStamp::unrestricted(bits));
    }
    let lower = if a.lower_bound() < 0 {
        a.lower_bound() / b.lower_bound()
    } else {
        a.lower_bound() / b.upper_bound()
    };
    let upper = if a.upper_bound() < 0 {
        a.upper_bound() / b.upper_bound()
    } else {
        a.upper_bound() / b.lower_bound()
    };
    IntegerStamp::for_range(bits, lower, upper)
}

/// Signed remainder. The result has the sign of the dividend and is
/// smaller in magnitude than the divisor.
pub fn rem(a: &Stamp, b: &Stamp) -> Stamp {
    integer_binary(a, b, rem_integer)
}

fn rem_integer(a: &IntegerStamp, b: &IntegerStamp) -> Stamp {
    let bits = a.bits();
    let mut lower = a.lower_bound().min(0);
    let mut upper = a.upper_bound().max(0);
    let magnitude = if b.lower_bound() == min_value(bits) {
        max_value(bits)
    } else {
        b.lower_bound().abs().max(b.upper_bound().abs()) - 1
    };
    lower = lower.max(-magnitude);
    upper = upper.min(magnitude);
    IntegerStamp::for_range(bits, lower, upper)
}

/// Absolute value. `abs(MIN)` wraps to `MIN`, so a range including it
/// stays unrestricted.
pub fn abs(s: &Stamp) -> Stamp {
    match s {
        Stamp::Float(f) => float_ops::abs(f),
        _ => integer_unary(s, |x| {
            let bits = x.bits();
            if x.lower_bound() == min_value(bits) {
                Stamp::Integer(IntegerStamp::unrestricted(bits))
            } else if x.is_positive() {
                Stamp::Integer(*x)
            } else if x.is_negative() {
                negate_integer(x)
            } else {
                IntegerStamp::for_range(bits, 0, (-x.lower_bound()).max(x.upper_bound()))
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::MachineKind;
    use crate::stamp::FloatStamp;

    fn int(lo: i64, hi: i64) -> Stamp {
        IntegerStamp::for_range(32, lo, hi)
    }

    fn bounds(s: &Stamp) -> (i64, i64) {
        let i = s.as_integer().expect("integer stamp");
        (i.lower_bound(), i.upper_bound())
    }

    #[test]
    fn test_negate() {
        assert_eq!(negate(&int(1, 10)), int(-10, -1));
        assert!(negate(&int(i32::MIN as i64, 0)).is_unrestricted());
        assert_eq!(negate(&int(7, 7)), int(-7, -7));
    }

    #[test]
    fn test_add_ranges() {
        assert_eq!(bounds(&add(&int(1, 10), &int(100, 200))), (101, 210));
        assert_eq!(add(&int(3, 3), &int(4, 4)), int(7, 7));
    }

    #[test]
    fn test_add_masks_known_low_bits() {
        // both even => sum even
        let even = IntegerStamp::create(32, 0, 100, 0, 0xffff_fffe);
        let sum = add(&even, &even);
        let s = sum.as_integer().unwrap();
        assert_eq!(s.up_mask() & 1, 0);
        assert_eq!((s.lower_bound(), s.upper_bound()), (0, 200));
    }

    #[test]
    fn test_add_overflow_collapses() {
        let big = int(2_000_000_000, 2_000_000_000);
        let sum = add(&big, &big);
        assert!(sum.is_unrestricted());
        assert_eq!(bounds(&sum), (i32::MIN as i64, i32::MAX as i64));
    }

    #[test]
    fn test_add_overflow_in_one_direction_collapses() {
        // both bounds wrap the same way, still no narrow range
        let sum = add(&int(i32::MAX as i64, i32::MAX as i64), &int(1, 1));
        assert!(sum.is_unrestricted());
        let sum = add(&int(i32::MIN as i64, i32::MIN as i64 + 1), &int(-2, -2));
        assert!(sum.is_unrestricted());
    }

    #[test]
    fn test_add_64_bit_overflow() {
        let big = IntegerStamp::for_range(64, i64::MAX - 1, i64::MAX);
        assert!(add(&big, &IntegerStamp::for_range(64, 1, 1)).is_unrestricted());
        assert!(add_overflows_negatively(i64::MIN, -1, 64));
        assert!(!add_overflows_negatively(i64::MIN, 1, 64));
    }

    #[test]
    fn test_add_unrestricted_operand() {
        let top = Stamp::Integer(IntegerStamp::unrestricted(32));
        assert_eq!(add(&top, &int(1, 1)), top);
    }

    #[test]
    fn test_sub() {
        assert_eq!(bounds(&sub(&int(10, 20), &int(1, 5))), (5, 19));
        assert_eq!(sub(&int(5, 5), &int(5, 5)), int(0, 0));
    }

    #[test]
    fn test_mul() {
        assert_eq!(bounds(&mul(&int(-3, 4), &int(2, 5))), (-15, 20));
        assert_eq!(mul(&int(0, 0), &int(-9, 9)), int(0, 0));
        let product = mul(&int(i32::MAX as i64, i32::MAX as i64), &int(2, 2));
        let s = product.as_integer().unwrap();
        assert_eq!(s.up_mask() & 1, 0);
        assert!(s.contains(-2));
    }

    #[test]
    fn test_mul_trailing_zeros() {
        let by_four = IntegerStamp::create(32, 0, 64, 0, 0xffff_fffc);
        let by_two = IntegerStamp::create(32, 0, 64, 0, 0xffff_fffe);
        let s = mul(&by_four, &by_two);
        assert_eq!(s.as_integer().unwrap().up_mask() & 0b111, 0);
    }

    #[test]
    fn test_div() {
        assert_eq!(bounds(&div(&int(-10, 20), &int(2, 5))), (-5, 10));
        assert_eq!(bounds(&div(&int(-10, -4), &int(2, 5))), (-5, 0));
        assert_eq!(bounds(&div(&int(4, 10), &int(2, 5))), (0, 5));
        assert!(div(&int(4, 10), &int(-1, 5)).is_unrestricted());
    }

    #[test]
    fn test_rem() {
        assert_eq!(bounds(&rem(&int(-100, 100), &int(1, 10))), (-9, 9));
        assert_eq!(bounds(&rem(&int(0, 100), &int(-7, 3))), (0, 6));
        assert_eq!(bounds(&rem(&int(0, 3), &int(10, 10))), (0, 3));
        assert!(rem(&int(0, 3), &int(0, 0)).is_illegal());
    }

    #[test]
    fn test_abs() {
        assert_eq!(abs(&int(-5, 3)), int(0, 5));
        assert_eq!(abs(&int(-9, -2)), int(2, 9));
        assert_eq!(abs(&int(2, 9)), int(2, 9));
        assert!(abs(&int(i32::MIN as i64, 0)).is_unrestricted());
    }

    #[test]
    fn test_illegal_and_mismatch() {
        let empty = Stamp::Illegal(MachineKind::Int);
        assert_eq!(add(&empty, &int(1, 1)), empty);
        assert_eq!(add(&int(1, 1), &empty), empty);
        let long = IntegerStamp::for_range(64, 1, 1);
        assert_eq!(add(&int(1, 1), &long), Stamp::illegal());
    }

    #[test]
    fn test_float_dispatch() {
        let a = Stamp::Float(FloatStamp::constant(64, 1.5));
        let b = Stamp::Float(FloatStamp::constant(64, 2.0));
        assert_eq!(add(&a, &b), Stamp::Float(FloatStamp::constant(64, 3.5)));
        assert_eq!(
            negate(&Stamp::Float(FloatStamp::new(64, 1.0, 2.0, true).unwrap())),
            Stamp::Float(FloatStamp::new(64, -2.0, -1.0, true).unwrap())
        );
    }
}
