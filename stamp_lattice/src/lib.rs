//! Abstract value stamps for an optimizing compiler.
//!
//! A [`Stamp`] over-approximates the set of runtime values an IR value may
//! take: integer ranges with known-bit masks, float ranges with a NaN flag,
//! object references with type and nullness facts, machine words and a few
//! sentinel categories. Stamps form a lattice:
//!
//! - [`Stamp::meet`] merges two stamps at a control-flow join (least upper bound)
//! - [`Stamp::join`] refines a stamp with facts from a check (greatest lower bound)
//! - the Illegal stamp is the empty set, i.e. unreachable code
//!
//! The [`tfuncs`] module computes result stamps of IR operations and
//! [`factory`] hands out canonical, memoized stamps.
//!
//! # Example
//!
//! ```
//! use stamp_lattice::stamp::IntegerStamp;
//! use stamp_lattice::tfuncs;
//!
//! let a = IntegerStamp::for_range(32, 0, 10);
//! let b = IntegerStamp::for_range(32, 20, 30);
//! let merged = a.meet(&b);
//! assert_eq!(merged, IntegerStamp::for_range(32, 0, 30));
//! assert!(a.join(&b).is_illegal());
//! assert_eq!(tfuncs::add(&a, &b), IntegerStamp::for_range(32, 20, 40));
//! ```

// Diagnostics go through the collector or the gated debug log.
#![deny(clippy::print_stderr)]

pub mod bits;
pub mod config;
pub mod constant;
pub mod diagnostics;
pub mod error;
pub mod factory;
pub mod kind;
pub mod meta;
pub mod stamp;
pub mod tfuncs;

pub use config::LatticeConfig;
pub use constant::Constant;
pub use error::{Result, StampError};
pub use factory::{StampCache, StampFactory};
pub use kind::MachineKind;
pub use stamp::{FloatStamp, GenericCategory, GenericStamp, IntegerStamp, ObjectStamp, Stamp, WordStamp};
