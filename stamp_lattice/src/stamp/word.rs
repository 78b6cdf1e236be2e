//! Machine-word stamps for untracked pointers and handles.

use super::Stamp;
use crate::kind::MachineKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A machine word that the garbage collector does not track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordStamp {
    bits: u32,
    non_null: bool,
}

impl WordStamp {
    pub fn new(bits: u32, non_null: bool) -> Self {
        Self { bits, non_null }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn non_null(&self) -> bool {
        self.non_null
    }

    pub fn kind(&self) -> MachineKind {
        MachineKind::Word
    }

    pub fn meet(&self, other: &WordStamp) -> Stamp {
        if self.bits != other.bits {
            return Stamp::mismatch(self.kind(), other.kind());
        }
        Stamp::Word(Self::new(self.bits, self.non_null && other.non_null))
    }

    pub fn join(&self, other: &WordStamp) -> Stamp {
        if self.bits != other.bits {
            return Stamp::mismatch(self.kind(), other.kind());
        }
        Stamp::Word(Self::new(self.bits, self.non_null || other.non_null))
    }
}

impl fmt::Display for WordStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}{}", self.bits, if self.non_null { "!" } else { "" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meet_join_flags() {
        let nullable = WordStamp::new(64, false);
        let non_null = WordStamp::new(64, true);
        assert_eq!(nullable.meet(&non_null), Stamp::Word(nullable));
        assert_eq!(nullable.join(&non_null), Stamp::Word(non_null));
        assert_eq!(non_null.to_string(), "w64!");
    }

    #[test]
    fn test_width_mismatch() {
        assert!(WordStamp::new(32, false)
            .meet(&WordStamp::new(64, false))
            .is_illegal());
    }
}
