//! The stamp lattice.
//!
//! A stamp is the abstract value attached to every value-producing IR node.
//! Each variant forms its own lattice; stamps of different kinds never mix.
//!
//! ```text
//!            unrestricted (top, per kind)
//!                  ↑
//!   Integer | Float | Object | Word | Generic
//!                  ↑
//!            Illegal(kind) (bottom, per kind)
//!                  ↑
//!            Illegal(Illegal) (general bottom)
//! ```
//!
//! `meet` is the least upper bound, used where control flow merges. `join`
//! is the greatest lower bound, used to refine a value after a check.

pub mod float;
pub mod generic;
pub mod integer;
pub mod object;
pub mod word;

pub use float::FloatStamp;
pub use generic::{GenericCategory, GenericStamp};
pub use integer::IntegerStamp;
pub use object::ObjectStamp;
pub use word::WordStamp;

use crate::constant::Constant;
use crate::diagnostics::{emit_contradiction, emit_kind_mismatch};
use crate::kind::MachineKind;
use crate::meta::{MetaAccessProvider, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default word width for stamps rebuilt without a configuration.
const DEFAULT_WORD_BITS: u32 = 64;

/// An abstract value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stamp {
    Integer(IntegerStamp),
    Float(FloatStamp),
    Object(ObjectStamp),
    Word(WordStamp),
    Generic(GenericStamp),
    /// No value can satisfy this stamp. `Illegal(MachineKind::Illegal)` is
    /// the general bottom; other kinds mark an empty stamp of that kind.
    Illegal(MachineKind),
}

impl Stamp {
    /// The general bottom element.
    pub fn illegal() -> Stamp {
        Stamp::Illegal(MachineKind::Illegal)
    }

    pub(crate) fn empty_integer(bits: u32) -> Stamp {
        Stamp::Illegal(MachineKind::for_integer_bits(bits).unwrap_or(MachineKind::Illegal))
    }

    /// Result of combining stamps of different kinds.
    pub(crate) fn mismatch(left: MachineKind, right: MachineKind) -> Stamp {
        emit_kind_mismatch(left, right);
        Stamp::illegal()
    }

    /// Top element for `kind`. Words get the default 64-bit width.
    pub fn unrestricted_for(kind: MachineKind) -> Stamp {
        match kind {
            MachineKind::Boolean
            | MachineKind::Byte
            | MachineKind::Short
            | MachineKind::Int
            | MachineKind::Long => match kind.bits() {
                Some(bits) => Stamp::Integer(IntegerStamp::unrestricted(bits)),
                None => Stamp::illegal(),
            },
            MachineKind::Float => Stamp::Float(FloatStamp::unrestricted(32)),
            MachineKind::Double => Stamp::Float(FloatStamp::unrestricted(64)),
            MachineKind::Object => Stamp::Object(ObjectStamp::unrestricted()),
            MachineKind::Word => Stamp::Word(WordStamp::new(DEFAULT_WORD_BITS, false)),
            MachineKind::Void => Stamp::Generic(GenericStamp::new(GenericCategory::Void)),
            MachineKind::Illegal => Stamp::illegal(),
        }
    }

    /// Stamp containing exactly `constant`.
    pub fn for_constant(constant: &Constant) -> Stamp {
        match constant {
            Constant::Integer { bits, value } => {
                if crate::bits::is_valid_integer_bits(*bits) {
                    Stamp::Integer(IntegerStamp::constant(*bits, *value))
                } else {
                    Stamp::illegal()
                }
            }
            Constant::Float(v) => Stamp::Float(FloatStamp::constant(32, f64::from(*v))),
            Constant::Double(v) => Stamp::Float(FloatStamp::constant(64, *v)),
            Constant::Null => Stamp::Object(ObjectStamp::always_null()),
            Constant::Object(ty) => Stamp::Object(
                ObjectStamp::exact(ty, true).unwrap_or_else(|_| ObjectStamp::declared(ty, true)),
            ),
        }
    }

    /// Machine kind of the described values.
    pub fn kind(&self) -> MachineKind {
        match self {
            Stamp::Integer(s) => s.kind(),
            Stamp::Float(s) => s.kind(),
            Stamp::Object(s) => s.kind(),
            Stamp::Word(s) => s.kind(),
            Stamp::Generic(s) => s.kind(),
            Stamp::Illegal(kind) => *kind,
        }
    }

    pub fn is_illegal(&self) -> bool {
        matches!(self, Stamp::Illegal(_))
    }

    pub fn has_values(&self) -> bool {
        !self.is_illegal()
    }

    pub fn is_unrestricted(&self) -> bool {
        match self {
            Stamp::Integer(s) => s.is_unrestricted(),
            Stamp::Float(s) => s.is_unrestricted(),
            Stamp::Object(s) => s.is_unrestricted(),
            Stamp::Word(s) => !s.non_null(),
            Stamp::Generic(_) => true,
            Stamp::Illegal(_) => false,
        }
    }

    /// Top element of this stamp's kind and width.
    pub fn unrestricted(&self) -> Stamp {
        match self {
            Stamp::Integer(s) => Stamp::Integer(IntegerStamp::unrestricted(s.bits())),
            Stamp::Float(s) => Stamp::Float(FloatStamp::unrestricted(s.bits())),
            Stamp::Object(_) => Stamp::Object(ObjectStamp::unrestricted()),
            Stamp::Word(s) => Stamp::Word(WordStamp::new(s.bits(), false)),
            Stamp::Generic(_) => self.clone(),
            Stamp::Illegal(kind) => Stamp::unrestricted_for(*kind),
        }
    }

    /// Bottom element of this stamp's kind.
    pub fn empty(&self) -> Stamp {
        Stamp::Illegal(self.kind())
    }

    /// True if both stamps belong to the same lattice.
    pub fn is_compatible(&self, other: &Stamp) -> bool {
        match (self, other) {
            (Stamp::Integer(a), Stamp::Integer(b)) => a.bits() == b.bits(),
            (Stamp::Float(a), Stamp::Float(b)) => a.bits() == b.bits(),
            (Stamp::Word(a), Stamp::Word(b)) => a.bits() == b.bits(),
            (Stamp::Object(_), Stamp::Object(_)) => true,
            (Stamp::Generic(a), Stamp::Generic(b)) => a.category() == b.category(),
            _ => self.kind() == other.kind(),
        }
    }

    /// Least upper bound: values in `self` or in `other`.
    ///
    /// An Illegal operand contributes no values, so the other operand comes
    /// back unchanged when the kinds agree.
    pub fn meet(&self, other: &Stamp) -> Stamp {
        match (self, other) {
            (Stamp::Illegal(a), Stamp::Illegal(b)) => {
                if a == b {
                    self.clone()
                } else {
                    Stamp::illegal()
                }
            }
            (Stamp::Illegal(kind), s) | (s, Stamp::Illegal(kind)) => {
                if *kind == MachineKind::Illegal || *kind == s.kind() {
                    s.clone()
                } else {
                    Stamp::mismatch(*kind, s.kind())
                }
            }
            (Stamp::Integer(a), Stamp::Integer(b)) => a.meet(b),
            (Stamp::Float(a), Stamp::Float(b)) => a.meet(b),
            (Stamp::Object(a), Stamp::Object(b)) => Stamp::Object(a.meet(b)),
            (Stamp::Word(a), Stamp::Word(b)) => a.meet(b),
            (Stamp::Generic(a), Stamp::Generic(b)) => a.meet(b),
            _ => Stamp::mismatch(self.kind(), other.kind()),
        }
    }

    /// Greatest lower bound: values in both `self` and `other`.
    pub fn join(&self, other: &Stamp) -> Stamp {
        let result = match (self, other) {
            (Stamp::Illegal(a), Stamp::Illegal(b)) => {
                return if a == b {
                    self.clone()
                } else {
                    Stamp::illegal()
                };
            }
            (Stamp::Illegal(kind), s) | (s, Stamp::Illegal(kind)) => {
                return if *kind == s.kind() {
                    Stamp::Illegal(*kind)
                } else {
                    Stamp::illegal()
                };
            }
            (Stamp::Integer(a), Stamp::Integer(b)) => a.join(b),
            (Stamp::Float(a), Stamp::Float(b)) => a.join(b),
            (Stamp::Object(a), Stamp::Object(b)) => a.join(b),
            (Stamp::Word(a), Stamp::Word(b)) => a.join(b),
            (Stamp::Generic(a), Stamp::Generic(b)) => a.join(b),
            _ => return Stamp::mismatch(self.kind(), other.kind()),
        };
        if result.is_illegal() {
            emit_contradiction(&result.kind().to_string(), || {
                format!("{} vs {}", self, other)
            });
        }
        result
    }

    /// Refines `self` with facts from `other`.
    pub fn improve_with(&self, other: &Stamp) -> Stamp {
        self.join(other)
    }

    /// True if no value can satisfy both stamps.
    pub fn always_distinct(&self, other: &Stamp) -> bool {
        match (self, other) {
            (Stamp::Object(a), Stamp::Object(b)) => a.always_distinct(b),
            _ => self.join(other).is_illegal(),
        }
    }

    /// The single value of this stamp, if it has exactly one.
    pub fn as_constant(&self) -> Option<Constant> {
        match self {
            Stamp::Integer(s) => s
                .as_constant_value()
                .map(|value| Constant::integer(s.bits(), value)),
            Stamp::Float(s) => s.as_constant(),
            Stamp::Object(s) => s.as_constant(),
            Stamp::Word(_) | Stamp::Generic(_) | Stamp::Illegal(_) => None,
        }
    }

    /// True if `constant` is one of the described values.
    pub fn contains(&self, constant: &Constant) -> bool {
        match (self, constant) {
            (Stamp::Integer(s), Constant::Integer { bits, value }) => {
                s.bits() == *bits && s.contains(*value)
            }
            (Stamp::Float(s), Constant::Float(v)) => s.bits() == 32 && s.contains(f64::from(*v)),
            (Stamp::Float(s), Constant::Double(v)) => s.bits() == 64 && s.contains(*v),
            (Stamp::Object(s), c) => s.contains_constant(c),
            _ => false,
        }
    }

    /// True if every value of `other` is a value of `self`.
    pub fn contains_stamp(&self, other: &Stamp) -> bool {
        (other.is_illegal()
            && (other.kind() == MachineKind::Illegal || other.kind() == self.kind()))
            || self.meet(other) == *self
    }

    /// Resolves the stamp to a type through the metadata provider.
    pub fn java_type(&self, meta: &dyn MetaAccessProvider) -> Option<TypeRef> {
        match self {
            Stamp::Integer(s) => meta.lookup_primitive(s.kind()),
            Stamp::Float(s) => meta.lookup_primitive(s.kind()),
            Stamp::Object(s) => Some(
                s.type_ref()
                    .cloned()
                    .unwrap_or_else(|| meta.lookup_object_root()),
            ),
            Stamp::Word(_) => meta.lookup_word_type(),
            Stamp::Generic(_) => meta.lookup_primitive(MachineKind::Void),
            Stamp::Illegal(kind) => meta.lookup_primitive(*kind),
        }
    }

    pub fn as_integer(&self) -> Option<&IntegerStamp> {
        match self {
            Stamp::Integer(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&FloatStamp> {
        match self {
            Stamp::Float(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectStamp> {
        match self {
            Stamp::Object(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stamp::Integer(s) => fmt::Display::fmt(s, f),
            Stamp::Float(s) => fmt::Display::fmt(s, f),
            Stamp::Object(s) => fmt::Display::fmt(s, f),
            Stamp::Word(s) => fmt::Display::fmt(s, f),
            Stamp::Generic(s) => fmt::Display::fmt(s, f),
            Stamp::Illegal(MachineKind::Illegal) => f.write_str("<illegal>"),
            Stamp::Illegal(kind) => write!(f, "{} <empty>", kind),
        }
    }
}

impl From<IntegerStamp> for Stamp {
    fn from(s: IntegerStamp) -> Self {
        Stamp::Integer(s)
    }
}

impl From<FloatStamp> for Stamp {
    fn from(s: FloatStamp) -> Self {
        Stamp::Float(s)
    }
}

impl From<ObjectStamp> for Stamp {
    fn from(s: ObjectStamp) -> Self {
        Stamp::Object(s)
    }
}
