//! Transfer functions over stamps.
//!
//! Each function computes a sound result stamp for an operation from the
//! stamps of its inputs. The functions can be called directly or through
//! the [`TransferFunctions`] registry keyed by [`OpCode`].
//!
//! # Architecture
//!
//! - `registry`: operation codes and the registry
//! - `arithmetic`: negation, addition, multiplication, division, remainder
//! - `bitwise`: logic operations and bit counting
//! - `shift`: left, arithmetic right and logical right shifts
//! - `convert`: extension, narrowing and integer-to-float conversion
//! - `compare`: refinement from known comparisons
//! - `float_ops`: floating-point operations
//! - `pointer`: object and word queries
//!
//! Integer operands of different widths give the general Illegal stamp.
//! An operand of a kind an operation does not handle gives the
//! unrestricted stamp of that kind.
//!
//! # Usage
//!
//! ```
//! use stamp_lattice::stamp::IntegerStamp;
//! use stamp_lattice::tfuncs::{self, register_all, OpCode, TFuncContext, TransferFunctions};
//!
//! let x = IntegerStamp::for_range(32, 0, 10);
//! let y = IntegerStamp::for_range(32, 1, 1);
//! assert_eq!(tfuncs::add(&x, &y), IntegerStamp::for_range(32, 1, 11));
//!
//! let mut registry = TransferFunctions::new();
//! register_all(&mut registry);
//! let narrowed = registry.infer(OpCode::Narrow, &[x], &TFuncContext::new().result_bits(8));
//! assert_eq!(narrowed, IntegerStamp::for_range(8, 0, 10));
//! ```

pub mod arithmetic;
pub mod bitwise;
pub mod compare;
pub mod convert;
pub mod float_ops;
pub mod pointer;
pub mod registry;
pub mod shift;

pub use arithmetic::{abs, add, div, mul, negate, rem, sub};
pub use bitwise::{and, bit_count, bitwise_not, leading_zeros, or, trailing_zeros, xor};
pub use compare::unsigned_compare;
pub use convert::{int_to_float, narrowing_conversion, sign_extend, zero_extend};
pub use pointer::{is_exact_type, is_pointer_always_null, is_pointer_non_null, type_or_none};
pub use registry::{OpCode, TFuncContext, TransferFn, TransferFunctions};
pub use shift::{left_shift, right_shift, unsigned_right_shift};

use crate::kind::MachineKind;
use crate::stamp::{IntegerStamp, Stamp};

/// Merges every stamp in `stamps`. An empty input gives the general
/// Illegal stamp.
pub fn meet_all<'a>(stamps: impl IntoIterator<Item = &'a Stamp>) -> Stamp {
    stamps
        .into_iter()
        .fold(Stamp::illegal(), |acc, s| acc.meet(s))
}

pub(crate) fn integer_unary(s: &Stamp, op: impl FnOnce(&IntegerStamp) -> Stamp) -> Stamp {
    match s {
        Stamp::Illegal(_) => s.clone(),
        Stamp::Integer(x) => op(x),
        _ => s.unrestricted(),
    }
}

pub(crate) fn integer_binary(
    a: &Stamp,
    b: &Stamp,
    op: impl FnOnce(&IntegerStamp, &IntegerStamp) -> Stamp,
) -> Stamp {
    match (a, b) {
        (Stamp::Illegal(_), _) => a.clone(),
        (_, Stamp::Illegal(_)) => a.empty(),
        (Stamp::Integer(x), Stamp::Integer(y)) if x.bits() == y.bits() => op(x, y),
        (Stamp::Integer(x), Stamp::Integer(y)) => Stamp::mismatch(x.kind(), y.kind()),
        _ if a.kind() != b.kind() => Stamp::mismatch(a.kind(), b.kind()),
        _ => a.unrestricted(),
    }
}

/// Registers all standard transfer functions.
pub fn register_all(registry: &mut TransferFunctions) {
    register_arithmetic(registry);
    register_bitwise(registry);
    register_shifts(registry);
    register_conversions(registry);
    register_lattice_ops(registry);
}

/// Registers arithmetic transfer functions.
pub fn register_arithmetic(registry: &mut TransferFunctions) {
    registry.register(OpCode::Neg, |args, _| negate(&args[0]));
    registry.register(OpCode::Abs, |args, _| abs(&args[0]));
    registry.register(OpCode::Add, |args, _| add(&args[0], &args[1]));
    registry.register(OpCode::Sub, |args, _| sub(&args[0], &args[1]));
    registry.register(OpCode::Mul, |args, _| mul(&args[0], &args[1]));
    registry.register(OpCode::Div, |args, _| div(&args[0], &args[1]));
    registry.register(OpCode::Rem, |args, _| rem(&args[0], &args[1]));
}

/// Registers logic and bit-counting transfer functions.
pub fn register_bitwise(registry: &mut TransferFunctions) {
    registry.register(OpCode::Not, |args, _| bitwise_not(&args[0]));
    registry.register(OpCode::And, |args, _| and(&args[0], &args[1]));
    registry.register(OpCode::Or, |args, _| or(&args[0], &args[1]));
    registry.register(OpCode::Xor, |args, _| xor(&args[0], &args[1]));
    registry.register(OpCode::LeadingZeros, |args, _| leading_zeros(&args[0]));
    registry.register(OpCode::TrailingZeros, |args, _| trailing_zeros(&args[0]));
    registry.register(OpCode::BitCount, |args, _| bit_count(&args[0]));
}

/// Registers shift transfer functions. The iteration bound comes from the
/// context configuration.
pub fn register_shifts(registry: &mut TransferFunctions) {
    registry.register(OpCode::Shl, |args, ctx| {
        shift::left_shift_bounded(&args[0], &args[1], ctx.max_shift_iterations())
    });
    registry.register(OpCode::Shr, |args, ctx| {
        shift::right_shift_bounded(&args[0], &args[1], ctx.max_shift_iterations())
    });
    registry.register(OpCode::UShr, |args, ctx| {
        shift::unsigned_right_shift_bounded(&args[0], &args[1], ctx.max_shift_iterations())
    });
}

/// Registers conversion transfer functions.
///
/// Without `result_bits` in the context the width conversions are the
/// identity; `itof` defaults to a double result.
pub fn register_conversions(registry: &mut TransferFunctions) {
    fn target_bits(args: &[Stamp], ctx: &TFuncContext) -> Option<u32> {
        ctx.result_bits
            .or_else(|| args[0].as_integer().map(IntegerStamp::bits))
    }
    registry.register(OpCode::SignExtend, |args, ctx| match target_bits(args, ctx) {
        Some(bits) => sign_extend(&args[0], bits),
        None => args[0].unrestricted(),
    });
    registry.register(OpCode::ZeroExtend, |args, ctx| match target_bits(args, ctx) {
        Some(bits) => zero_extend(&args[0], bits),
        None => args[0].unrestricted(),
    });
    registry.register(OpCode::Narrow, |args, ctx| match target_bits(args, ctx) {
        Some(bits) => narrowing_conversion(&args[0], bits),
        None => args[0].unrestricted(),
    });
    registry.register(OpCode::IntToFloat, |args, ctx| {
        int_to_float(&args[0], ctx.result_kind.unwrap_or(MachineKind::Double))
    });
}

/// Registers `meet` and `join` as binary operations.
pub fn register_lattice_ops(registry: &mut TransferFunctions) {
    registry.register(OpCode::Meet, |args, _| args[0].meet(&args[1]));
    registry.register(OpCode::Join, |args, _| args[0].join(&args[1]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LatticeConfig;
    use crate::stamp::FloatStamp;

    fn int(lo: i64, hi: i64) -> Stamp {
        IntegerStamp::for_range(32, lo, hi)
    }

    #[test]
    fn test_register_all_covers_every_opcode() {
        let mut registry = TransferFunctions::new();
        register_all(&mut registry);
        assert_eq!(registry.len(), OpCode::ALL.len());
        for op in OpCode::ALL {
            assert!(registry.has_function(op), "missing {op}");
        }
    }

    #[test]
    fn test_meet_all() {
        assert_eq!(meet_all([&int(1, 2), &int(5, 6), &int(-1, 0)]), int(-1, 6));
        assert_eq!(meet_all(std::iter::empty::<&Stamp>()), Stamp::illegal());
        let stamps = vec![int(3, 3)];
        assert_eq!(meet_all(&stamps), int(3, 3));
    }

    #[test]
    fn test_registry_dispatch() {
        let mut registry = TransferFunctions::new();
        register_all(&mut registry);
        let ctx = TFuncContext::new();

        assert_eq!(registry.infer(OpCode::Sub, &[int(10, 20), int(1, 5)], &ctx), int(5, 19));
        assert_eq!(registry.infer(OpCode::Meet, &[int(1, 1), Stamp::illegal()], &ctx), int(1, 1));
        assert!(registry
            .infer(OpCode::Join, &[int(1, 2), int(5, 6)], &ctx)
            .is_illegal());
        let wide = registry.infer(
            OpCode::SignExtend,
            &[int(-1, 1)],
            &TFuncContext::new().result_bits(64),
        );
        assert_eq!(wide, IntegerStamp::for_range(64, -1, 1));
        let float = registry.infer(
            OpCode::IntToFloat,
            &[int(0, 1)],
            &TFuncContext::new().result_kind(MachineKind::Float),
        );
        assert_eq!(float, Stamp::Float(FloatStamp::new(32, 0.0, 1.0, true).unwrap()));
    }

    #[test]
    fn test_registry_shift_limit_from_config() {
        let mut registry = TransferFunctions::new();
        register_all(&mut registry);
        let config = LatticeConfig {
            max_shift_iterations: 2,
            ..LatticeConfig::default()
        };
        let narrow_limit = TFuncContext::with_config(&config);
        let args = [int(1, 1), int(0, 3)];
        assert!(registry.infer(OpCode::Shl, &args, &narrow_limit).is_unrestricted());
        assert_eq!(
            registry.infer(OpCode::Shl, &args, &TFuncContext::new()),
            int(1, 8)
        );
    }

    #[test]
    fn test_kind_mismatch_between_families() {
        let f = Stamp::Float(FloatStamp::unrestricted(64));
        assert_eq!(add(&int(0, 1), &f), Stamp::illegal());
    }
}
