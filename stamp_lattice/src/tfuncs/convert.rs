//! Transfer functions for width and representation changes.

use super::integer_unary;
use crate::bits::{self, mask, max_value, min_value};
use crate::kind::MachineKind;
use crate::stamp::{FloatStamp, IntegerStamp, Stamp};

fn width_mismatch(from: u32, to: u32) -> Stamp {
    let kind = |b| MachineKind::for_integer_bits(b).unwrap_or(MachineKind::Illegal);
    Stamp::mismatch(kind(from), kind(to))
}

/// Sign extension to `result_bits`. Bounds are preserved; the masks copy
/// the sign bit into the new high bits.
pub fn sign_extend(s: &Stamp, result_bits: u32) -> Stamp {
    integer_unary(s, |x| {
        let bits = x.bits();
        if result_bits == bits {
            return Stamp::Integer(*x);
        }
        if result_bits < bits || !bits::is_valid_integer_bits(result_bits) {
            return width_mismatch(bits, result_bits);
        }
        let m = mask(result_bits);
        let down = bits::sign_extend(x.down_mask() as i64, bits) as u64 & m;
        let up = bits::sign_extend(x.up_mask() as i64, bits) as u64 & m;
        IntegerStamp::create(result_bits, x.lower_bound(), x.upper_bound(), down, up)
    })
}

/// Zero extension to `result_bits`.
///
/// ```text
/// zext i8 [-1 - 1]  => i32 [0 - 255]   (bounds straddle zero: from masks)
/// zext i8 [-4 - -1] => i32 [252 - 255]
/// ```
pub fn zero_extend(s: &Stamp, result_bits: u32) -> Stamp {
    integer_unary(s, |x| {
        let bits = x.bits();
        if result_bits == bits {
            return Stamp::Integer(*x);
        }
        if result_bits < bits || !bits::is_valid_integer_bits(result_bits) {
            return width_mismatch(bits, result_bits);
        }
        let (down, up) = (x.down_mask(), x.up_mask());
        if x.same_sign_bounds() {
            IntegerStamp::create(
                result_bits,
                bits::zero_extend(x.lower_bound(), bits),
                bits::zero_extend(x.upper_bound(), bits),
                down,
                up,
            )
        } else {
            IntegerStamp::stamp_for_mask(result_bits, down, up)
        }
    })
}

/// Truncation to `result_bits`. When both bounds fit the narrower range
/// they survive; otherwise only the low mask bits carry over.
pub fn narrowing_conversion(s: &Stamp, result_bits: u32) -> Stamp {
    integer_unary(s, |x| {
        let bits = x.bits();
        if result_bits == bits {
            return Stamp::Integer(*x);
        }
        if result_bits > bits || !bits::is_valid_integer_bits(result_bits) {
            return width_mismatch(bits, result_bits);
        }
        let m = mask(result_bits);
        let (down, up) = (x.down_mask() & m, x.up_mask() & m);
        let (lo, hi) = (x.lower_bound(), x.upper_bound());
        if lo >= min_value(result_bits) && hi <= max_value(result_bits) {
            IntegerStamp::create(result_bits, lo, hi, down, up)
        } else {
            IntegerStamp::stamp_for_mask(result_bits, down, up)
        }
    })
}

/// Signed integer to floating-point conversion. `target` must be
/// [`MachineKind::Float`] or [`MachineKind::Double`].
pub fn int_to_float(s: &Stamp, target: MachineKind) -> Stamp {
    let Some(result_bits) = target.bits().filter(|_| target.is_numeric_float()) else {
        return Stamp::mismatch(s.kind(), target);
    };
    match s {
        Stamp::Illegal(_) => Stamp::Illegal(target),
        Stamp::Integer(x) => {
            let convert = |v: i64| {
                if result_bits == 32 {
                    f64::from(v as f32)
                } else {
                    v as f64
                }
            };
            FloatStamp::create(
                result_bits,
                convert(x.lower_bound()),
                convert(x.upper_bound()),
                true,
            )
        }
        _ => Stamp::Float(FloatStamp::unrestricted(result_bits)),
    }
}
