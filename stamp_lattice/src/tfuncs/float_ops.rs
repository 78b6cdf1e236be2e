//! Transfer functions on floating-point stamps.
//!
//! Binary operations only fold constants; any other input gives the
//! unrestricted stamp of the operand width.

use crate::stamp::{FloatStamp, Stamp};

pub fn negate(s: &FloatStamp) -> Stamp {
    if s.is_nan_only() {
        return Stamp::Float(*s);
    }
    FloatStamp::create(s.bits(), -s.upper_bound(), -s.lower_bound(), s.is_non_nan())
}

pub fn abs(s: &FloatStamp) -> Stamp {
    let (lo, hi) = (s.lower_bound(), s.upper_bound());
    if s.is_nan_only() || (lo >= 0.0 && lo.is_sign_positive()) {
        return Stamp::Float(*s);
    }
    if hi <= 0.0 {
        return FloatStamp::create(s.bits(), hi.abs(), lo.abs(), s.is_non_nan());
    }
    FloatStamp::create(s.bits(), 0.0, (-lo).max(hi), s.is_non_nan())
}

fn fold(a: &FloatStamp, b: &FloatStamp, op: fn(f64, f64) -> f64, op32: fn(f32, f32) -> f32) -> Stamp {
    if a.bits() != b.bits() {
        return Stamp::mismatch(a.kind(), b.kind());
    }
    match (a.as_constant(), b.as_constant()) {
        (Some(_), Some(_)) => {
            let value = if a.bits() == 32 {
                f64::from(op32(a.lower_bound() as f32, b.lower_bound() as f32))
            } else {
                op(a.lower_bound(), b.lower_bound())
            };
            Stamp::Float(FloatStamp::constant(a.bits(), value))
        }
        _ => Stamp::Float(FloatStamp::unrestricted(a.bits())),
    }
}

pub fn add(a: &FloatStamp, b: &FloatStamp) -> Stamp {
    fold(a, b, |x, y| x + y, |x, y| x + y)
}

pub fn sub(a: &FloatStamp, b: &FloatStamp) -> Stamp {
    fold(a, b, |x, y| x - y, |x, y| x - y)
}

pub fn mul(a: &FloatStamp, b: &FloatStamp) -> Stamp {
    fold(a, b, |x, y| x * y, |x, y| x * y)
}

pub fn div(a: &FloatStamp, b: &FloatStamp) -> Stamp {
    fold(a, b, |x, y| x / y, |x, y| x / y)
}
