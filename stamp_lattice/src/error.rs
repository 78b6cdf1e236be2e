//! Error types for stamp construction.
//!
//! Lattice operations never fail: a contradiction is represented by the
//! Illegal stamp. These errors only come from public constructors that are
//! handed malformed arguments, and from configuration loading.

use crate::kind::MachineKind;
use thiserror::Error;

/// Construction or configuration error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StampError {
    /// Integer width outside {1, 8, 16, 32, 64}
    #[error("invalid integer bit width {0}")]
    InvalidBitWidth(u32),

    /// A bound does not fit the representable range of the width
    #[error("bound {value} is out of range for i{bits} [{min}, {max}]")]
    BoundsOutOfRange {
        /// Width of the stamp
        bits: u32,
        /// The offending bound
        value: i64,
        /// Smallest representable value
        min: i64,
        /// Largest representable value
        max: i64,
    },

    /// `lower > upper` passed directly to a constructor
    #[error("inverted bounds [{lower}, {upper}]")]
    InvertedBounds {
        /// Lower bound
        lower: i64,
        /// Upper bound
        upper: i64,
    },

    /// A mask has bits set above the stamp width
    #[error("mask {mask:#x} has bits outside i{bits}")]
    MaskOutOfRange {
        /// Width of the stamp
        bits: u32,
        /// The offending mask
        mask: u64,
    },

    /// `down & !up != 0`
    #[error("down mask {down:#x} is not a subset of up mask {up:#x}")]
    InconsistentMasks {
        /// Bits known to be set
        down: u64,
        /// Bits that may be set
        up: u64,
    },

    /// A bound is not a value the masks allow
    #[error("bound {bound} is not consistent with masks down={down:#x} up={up:#x}")]
    BoundNotInMasks {
        /// The offending bound
        bound: i64,
        /// Bits known to be set
        down: u64,
        /// Bits that may be set
        up: u64,
    },

    /// Float bounds are inverted, or only one of them is NaN
    #[error("invalid float bounds [{lower}, {upper}]")]
    InvalidFloatBounds {
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },

    /// A float stamp was requested for a non-float kind
    #[error("{0} is not a floating-point kind")]
    NotAFloatKind(MachineKind),

    /// Exact object stamp over an abstract class or interface
    #[error("exact type {0} cannot be instantiated")]
    ExactTypeNotConcrete(String),

    /// Exact object stamp without a type
    #[error("exact object stamp requires a type")]
    ExactWithoutType,

    /// Both `non_null` and `always_null`
    #[error("object stamp cannot be both non-null and always-null")]
    NullabilityConflict,

    /// Operands of different kinds handed to a kind-preserving operation
    #[error("kind mismatch: {left} vs {right}")]
    KindMismatch {
        /// Kind of the left operand
        left: MachineKind,
        /// Kind of the right operand
        right: MachineKind,
    },

    /// Configuration could not be parsed or is out of range
    #[error("invalid lattice configuration: {0}")]
    Config(String),
}

/// Result alias for stamp construction.
pub type Result<T> = std::result::Result<T, StampError>;
