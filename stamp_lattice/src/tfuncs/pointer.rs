//! Queries on reference and word stamps.

use crate::meta::TypeRef;
use crate::stamp::Stamp;

/// True if the stamp excludes the null reference (or the zero word).
pub fn is_pointer_non_null(s: &Stamp) -> bool {
    match s {
        Stamp::Object(o) => o.non_null(),
        Stamp::Word(w) => w.non_null(),
        _ => false,
    }
}

/// True if null is the only possible value.
pub fn is_pointer_always_null(s: &Stamp) -> bool {
    matches!(s, Stamp::Object(o) if o.is_always_null())
}

/// The declared or exact type of an object stamp.
pub fn type_or_none(s: &Stamp) -> Option<TypeRef> {
    match s {
        Stamp::Object(o) => o.type_ref().cloned(),
        _ => None,
    }
}

pub fn is_exact_type(s: &Stamp) -> bool {
    matches!(s, Stamp::Object(o) if o.is_exact_type())
}
