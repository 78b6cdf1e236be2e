//! Two's-complement helpers for integers of width 1, 8, 16, 32 or 64.
//!
//! Values are carried sign-extended in an `i64`; masks are carried in the
//! low `bits` bits of a `u64`.

/// Widths an integer stamp may have.
pub const INTEGER_WIDTHS: [u32; 5] = [1, 8, 16, 32, 64];

/// Returns true if `bits` is a supported integer width.
#[inline]
pub fn is_valid_integer_bits(bits: u32) -> bool {
    INTEGER_WIDTHS.contains(&bits)
}

/// All-ones mask of width `bits` (0 for width 0).
#[inline]
pub fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Bit at the sign position of a `bits`-wide value.
#[inline]
pub fn sign_bit(bits: u32) -> u64 {
    debug_assert!((1..=64).contains(&bits));
    1u64 << (bits - 1)
}

/// Smallest signed value of width `bits`.
#[inline]
pub fn min_value(bits: u32) -> i64 {
    if bits >= 64 {
        i64::MIN
    } else {
        -(1i64 << (bits - 1))
    }
}

/// Largest signed value of width `bits`.
#[inline]
pub fn max_value(bits: u32) -> i64 {
    if bits >= 64 {
        i64::MAX
    } else {
        (1i64 << (bits - 1)) - 1
    }
}

/// Largest unsigned value of width `bits`, as raw bits.
#[inline]
pub fn max_unsigned(bits: u32) -> u64 {
    mask(bits)
}

/// Sign-extends the low `bits` bits of `value` (0 for width 0).
#[inline]
pub fn sign_extend(value: i64, bits: u32) -> i64 {
    if bits == 0 {
        0
    } else if bits >= 64 {
        value
    } else {
        let shift = 64 - bits;
        (value << shift) >> shift
    }
}

/// Zero-extends the low `bits` bits of `value`.
#[inline]
pub fn zero_extend(value: i64, bits: u32) -> i64 {
    (value as u64 & mask(bits)) as i64
}

/// Truncates `value` to `bits` bits and re-sign-extends the result.
#[inline]
pub fn narrow(value: i64, bits: u32) -> i64 {
    sign_extend(value, bits)
}

/// Clamps `value` into the signed range of width `bits`.
#[inline]
pub fn saturate(value: i64, bits: u32) -> i64 {
    value.clamp(min_value(bits), max_value(bits))
}

/// Mask with the low `n` bits set, saturating at 64.
#[inline]
pub(crate) fn low_bits(n: u32) -> u64 {
    mask(n.min(64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask(0), 0);
        assert_eq!(mask(1), 1);
        assert_eq!(mask(8), 0xff);
        assert_eq!(mask(32), 0xffff_ffff);
        assert_eq!(mask(64), u64::MAX);
    }

    #[test]
    fn test_min_max() {
        assert_eq!((min_value(1), max_value(1)), (-1, 0));
        assert_eq!((min_value(8), max_value(8)), (-128, 127));
        assert_eq!((min_value(32), max_value(32)), (i32::MIN as i64, i32::MAX as i64));
        assert_eq!((min_value(64), max_value(64)), (i64::MIN, i64::MAX));
    }

    #[test]
    fn test_extend() {
        assert_eq!(sign_extend(0xff, 8), -1);
        assert_eq!(sign_extend(0x7f, 8), 127);
        assert_eq!(sign_extend(1, 1), -1);
        assert_eq!(sign_extend(5, 0), 0);
        assert_eq!(zero_extend(-1, 8), 255);
        assert_eq!(zero_extend(-1, 64), -1);
        assert_eq!(narrow(300, 8), 44);
        assert_eq!(saturate(300, 8), 127);
    }
}
