//! Sentinel stamps that carry no value information.

use super::Stamp;
use crate::kind::MachineKind;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenericCategory {
    /// Ordering/guard dependency between nodes
    Dependency,
    /// Extension point for front-end specific values
    Extension,
    /// Boolean condition that is not materialized
    Condition,
    /// No value
    Void,
}

/// A stamp that refines only by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenericStamp {
    category: GenericCategory,
}

impl GenericStamp {
    pub fn new(category: GenericCategory) -> Self {
        Self { category }
    }

    pub fn category(&self) -> GenericCategory {
        self.category
    }

    pub fn kind(&self) -> MachineKind {
        MachineKind::Void
    }

    pub fn meet(&self, other: &GenericStamp) -> Stamp {
        self.same_category(other)
    }

    pub fn join(&self, other: &GenericStamp) -> Stamp {
        self.same_category(other)
    }

    fn same_category(&self, other: &GenericStamp) -> Stamp {
        if self.category == other.category {
            Stamp::Generic(*self)
        } else {
            Stamp::illegal()
        }
    }
}

impl fmt::Display for GenericStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.category {
            GenericCategory::Dependency => "dependency",
            GenericCategory::Extension => "extension",
            GenericCategory::Condition => "condition",
            GenericCategory::Void => "void",
        };
        f.write_str(name)
    }
}
