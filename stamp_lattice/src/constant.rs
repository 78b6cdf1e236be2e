//! Boxed literal values.

use crate::bits;
use crate::error::{Result, StampError};
use crate::kind::MachineKind;
use crate::meta::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A literal value as seen by the IR.
///
/// Integer values are stored sign-extended from their declared width, so a
/// 1-bit `true` reads back as `-1` through [`Constant::as_i64`]. Floats compare
/// and hash by bit pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Constant {
    Integer { bits: u32, value: i64 },
    Float(f32),
    Double(f64),
    Null,
    /// Non-null reference of exactly this type
    Object(TypeRef),
}

impl Constant {
    /// Integer literal of width `bits`; `value` is truncated to that width.
    ///
    /// An unsupported width keeps `value` as given; such a constant has the
    /// Illegal kind and its stamp is Illegal.
    pub fn integer(bits: u32, value: i64) -> Self {
        let value = if bits::is_valid_integer_bits(bits) {
            bits::sign_extend(value, bits)
        } else {
            value
        };
        Constant::Integer { bits, value }
    }

    /// Like [`Constant::integer`] but rejects unsupported widths.
    pub fn try_integer(bits: u32, value: i64) -> Result<Self> {
        if !bits::is_valid_integer_bits(bits) {
            return Err(StampError::InvalidBitWidth(bits));
        }
        Ok(Self::integer(bits, value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::integer(1, i64::from(value))
    }

    pub fn byte(value: i8) -> Self {
        Self::integer(8, value.into())
    }

    pub fn short(value: i16) -> Self {
        Self::integer(16, value.into())
    }

    pub fn int(value: i32) -> Self {
        Self::integer(32, value.into())
    }

    pub fn long(value: i64) -> Self {
        Self::integer(64, value)
    }

    pub fn kind(&self) -> MachineKind {
        match self {
            Constant::Integer { bits, .. } => {
                MachineKind::for_integer_bits(*bits).unwrap_or(MachineKind::Illegal)
            }
            Constant::Float(_) => MachineKind::Float,
            Constant::Double(_) => MachineKind::Double,
            Constant::Null | Constant::Object(_) => MachineKind::Object,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Constant::Integer { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Constant::Float(v) => Some(f64::from(*v)),
            Constant::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Constant::Null)
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Constant::Integer { bits: b1, value: v1 },
                Constant::Integer { bits: b2, value: v2 },
            ) => b1 == b2 && v1 == v2,
            (Constant::Float(a), Constant::Float(b)) => a.to_bits() == b.to_bits(),
            (Constant::Double(a), Constant::Double(b)) => a.to_bits() == b.to_bits(),
            (Constant::Null, Constant::Null) => true,
            (Constant::Object(a), Constant::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Constant {}

impl Hash for Constant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Constant::Integer { bits, value } => {
                bits.hash(state);
                value.hash(state);
            }
            Constant::Float(v) => v.to_bits().hash(state),
            Constant::Double(v) => v.to_bits().hash(state),
            Constant::Null => {}
            Constant::Object(ty) => ty.hash(state),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Integer { bits, value } => write!(f, "{}i{}", value, bits),
            Constant::Float(v) => write!(f, "{}f", v),
            Constant::Double(v) => write!(f, "{}d", v),
            Constant::Null => f.write_str("null"),
            Constant::Object(ty) => write!(f, "<{}>", ty.name()),
        }
    }
}
