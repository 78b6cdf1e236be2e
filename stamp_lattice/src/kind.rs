//! Machine kinds: the storage class a stamp describes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-level kind tag carried by every stamp.
///
/// Integer kinds are identified by their declared width; there is no separate
/// stack kind. `Illegal` is the kind of the general bottom stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MachineKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Object,
    Word,
    Void,
    Illegal,
}

impl MachineKind {
    /// Every kind, in declaration order.
    pub const ALL: [MachineKind; 11] = [
        MachineKind::Boolean,
        MachineKind::Byte,
        MachineKind::Short,
        MachineKind::Int,
        MachineKind::Long,
        MachineKind::Float,
        MachineKind::Double,
        MachineKind::Object,
        MachineKind::Word,
        MachineKind::Void,
        MachineKind::Illegal,
    ];

    /// Integer kind with the given declared width.
    pub fn for_integer_bits(bits: u32) -> Option<MachineKind> {
        match bits {
            1 => Some(MachineKind::Boolean),
            8 => Some(MachineKind::Byte),
            16 => Some(MachineKind::Short),
            32 => Some(MachineKind::Int),
            64 => Some(MachineKind::Long),
            _ => None,
        }
    }

    /// Float kind with the given width.
    pub fn for_float_bits(bits: u32) -> Option<MachineKind> {
        match bits {
            32 => Some(MachineKind::Float),
            64 => Some(MachineKind::Double),
            _ => None,
        }
    }

    /// Width in bits for primitive kinds.
    pub fn bits(self) -> Option<u32> {
        match self {
            MachineKind::Boolean => Some(1),
            MachineKind::Byte => Some(8),
            MachineKind::Short => Some(16),
            MachineKind::Int | MachineKind::Float => Some(32),
            MachineKind::Long | MachineKind::Double => Some(64),
            _ => None,
        }
    }

    pub fn is_numeric_integer(self) -> bool {
        matches!(
            self,
            MachineKind::Boolean
                | MachineKind::Byte
                | MachineKind::Short
                | MachineKind::Int
                | MachineKind::Long
        )
    }

    pub fn is_numeric_float(self) -> bool {
        matches!(self, MachineKind::Float | MachineKind::Double)
    }

    pub fn is_primitive(self) -> bool {
        self.is_numeric_integer() || self.is_numeric_float()
    }

    /// Position in [`MachineKind::ALL`].
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MachineKind::Boolean => "i1",
            MachineKind::Byte => "i8",
            MachineKind::Short => "i16",
            MachineKind::Int => "i32",
            MachineKind::Long => "i64",
            MachineKind::Float => "f32",
            MachineKind::Double => "f64",
            MachineKind::Object => "a",
            MachineKind::Word => "w",
            MachineKind::Void => "void",
            MachineKind::Illegal => "illegal",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_kinds_roundtrip_bits() {
        for bits in crate::bits::INTEGER_WIDTHS {
            let kind = MachineKind::for_integer_bits(bits).unwrap();
            assert!(kind.is_numeric_integer());
            assert_eq!(kind.bits(), Some(bits));
        }
        assert_eq!(MachineKind::for_integer_bits(12), None);
    }

    #[test]
    fn test_index_matches_all() {
        for (i, kind) in MachineKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(MachineKind::Int.to_string(), "i32");
        assert_eq!(MachineKind::Double.to_string(), "f64");
        assert_eq!(MachineKind::Object.to_string(), "a");
    }
}
