//! Transfer function registry.
//!
//! Maps IR operations to the functions that compute their result stamps.
//! A compiler phase holds one registry and calls [`TransferFunctions::infer`]
//! for each node whose inputs changed.

use crate::config::{LatticeConfig, DEFAULT_MAX_SHIFT_ITERATIONS};
use crate::diagnostics::{emit_arity_mismatch, emit_unknown_operation};
use crate::kind::MachineKind;
use crate::stamp::Stamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Operations with a registered transfer function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OpCode {
    Neg,
    Abs,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Not,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    UShr,
    LeadingZeros,
    TrailingZeros,
    BitCount,
    SignExtend,
    ZeroExtend,
    Narrow,
    IntToFloat,
    Meet,
    Join,
}

impl OpCode {
    pub const ALL: [OpCode; 23] = [
        OpCode::Neg,
        OpCode::Abs,
        OpCode::Add,
        OpCode::Sub,
        OpCode::Mul,
        OpCode::Div,
        OpCode::Rem,
        OpCode::Not,
        OpCode::And,
        OpCode::Or,
        OpCode::Xor,
        OpCode::Shl,
        OpCode::Shr,
        OpCode::UShr,
        OpCode::LeadingZeros,
        OpCode::TrailingZeros,
        OpCode::BitCount,
        OpCode::SignExtend,
        OpCode::ZeroExtend,
        OpCode::Narrow,
        OpCode::IntToFloat,
        OpCode::Meet,
        OpCode::Join,
    ];

    /// Number of input stamps the operation takes.
    pub fn arity(self) -> usize {
        match self {
            OpCode::Neg
            | OpCode::Abs
            | OpCode::Not
            | OpCode::LeadingZeros
            | OpCode::TrailingZeros
            | OpCode::BitCount
            | OpCode::SignExtend
            | OpCode::ZeroExtend
            | OpCode::Narrow
            | OpCode::IntToFloat => 1,
            _ => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OpCode::Neg => "neg",
            OpCode::Abs => "abs",
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mul => "mul",
            OpCode::Div => "div",
            OpCode::Rem => "rem",
            OpCode::Not => "not",
            OpCode::And => "and",
            OpCode::Or => "or",
            OpCode::Xor => "xor",
            OpCode::Shl => "shl",
            OpCode::Shr => "shr",
            OpCode::UShr => "ushr",
            OpCode::LeadingZeros => "clz",
            OpCode::TrailingZeros => "ctz",
            OpCode::BitCount => "popcnt",
            OpCode::SignExtend => "sext",
            OpCode::ZeroExtend => "zext",
            OpCode::Narrow => "narrow",
            OpCode::IntToFloat => "itof",
            OpCode::Meet => "meet",
            OpCode::Join => "join",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-node information a transfer function may need beyond its inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TFuncContext<'a> {
    /// Target width of `sext`, `zext` and `narrow`.
    pub result_bits: Option<u32>,
    /// Target kind of `itof`.
    pub result_kind: Option<MachineKind>,
    pub config: Option<&'a LatticeConfig>,
}

impl<'a> TFuncContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &'a LatticeConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    pub fn result_bits(mut self, bits: u32) -> Self {
        self.result_bits = Some(bits);
        self
    }

    pub fn result_kind(mut self, kind: MachineKind) -> Self {
        self.result_kind = Some(kind);
        self
    }

    pub fn max_shift_iterations(&self) -> u32 {
        self.config
            .map(|c| c.max_shift_iterations)
            .unwrap_or(DEFAULT_MAX_SHIFT_ITERATIONS)
    }
}

/// Type signature for a transfer function.
///
/// Receives exactly [`OpCode::arity`] input stamps, none of them Illegal
/// (except for `meet` and `join`, which handle Illegal themselves).
pub type TransferFn = fn(&[Stamp], &TFuncContext) -> Stamp;

/// Registry of transfer functions.
///
/// # Example
/// ```
/// use stamp_lattice::stamp::IntegerStamp;
/// use stamp_lattice::tfuncs::{register_all, OpCode, TFuncContext, TransferFunctions};
///
/// let mut registry = TransferFunctions::new();
/// register_all(&mut registry);
///
/// let args = [
///     IntegerStamp::for_range(32, 1, 10),
///     IntegerStamp::for_range(32, 100, 200),
/// ];
/// let result = registry.infer(OpCode::Add, &args, &TFuncContext::new());
/// assert_eq!(result, IntegerStamp::for_range(32, 101, 210));
/// ```
#[derive(Debug)]
pub struct TransferFunctions {
    functions: HashMap<OpCode, TransferFn>,
}

impl TransferFunctions {
    /// Creates a new, empty transfer function registry.
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registers `tfunc` for `op`, replacing any earlier registration.
    pub fn register(&mut self, op: OpCode, tfunc: TransferFn) {
        self.functions.insert(op, tfunc);
    }

    /// Computes the result stamp of `op` applied to `args`.
    ///
    /// An Illegal input makes the result Illegal. Unregistered operations
    /// and wrong argument counts give the unrestricted stamp of the first
    /// input's kind.
    pub fn infer(&self, op: OpCode, args: &[Stamp], ctx: &TFuncContext) -> Stamp {
        let fallback = || {
            args.first()
                .map(Stamp::unrestricted)
                .unwrap_or_else(Stamp::illegal)
        };
        let Some(tfunc) = self.functions.get(&op) else {
            emit_unknown_operation(op.name());
            return fallback();
        };
        if args.len() != op.arity() {
            emit_arity_mismatch(op.name(), op.arity(), args.len());
            return fallback();
        }
        if !matches!(op, OpCode::Meet | OpCode::Join) {
            if let Some(empty) = args.iter().find(|s| s.is_illegal()) {
                return match (op, &args[0]) {
                    (OpCode::IntToFloat, _) => {
                        Stamp::Illegal(ctx.result_kind.unwrap_or(MachineKind::Double))
                    }
                    (_, first) if first.is_illegal() => empty.clone(),
                    (_, first) => first.empty(),
                };
            }
        }
        tfunc(args, ctx)
    }

    pub fn has_function(&self, op: OpCode) -> bool {
        self.functions.contains_key(&op)
    }

    /// Returns the number of registered transfer functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for TransferFunctions {
    fn default() -> Self {
        Self::new()
    }
}
