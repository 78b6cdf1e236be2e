//! Object reference stamps.

use super::Stamp;
use crate::constant::Constant;
use crate::error::{Result, StampError};
use crate::kind::MachineKind;
use crate::meta::{ObjectType, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Type and nullness facts about a reference.
///
/// `ty == None` means any object. An always-null stamp carries no type.
/// A non-exact stamp never carries the hierarchy root; it is normalized to
/// `None` so that equal value sets have equal stamps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawObjectStamp")]
pub struct ObjectStamp {
    ty: Option<TypeRef>,
    exact_type: bool,
    non_null: bool,
    always_null: bool,
}

impl ObjectStamp {
    pub fn new(ty: Option<TypeRef>, exact_type: bool, non_null: bool, always_null: bool) -> Result<Self> {
        if non_null && always_null {
            return Err(StampError::NullabilityConflict);
        }
        if always_null {
            return Ok(Self::always_null());
        }
        if exact_type {
            match &ty {
                None => return Err(StampError::ExactWithoutType),
                Some(t) if !t.is_concrete() => {
                    return Err(StampError::ExactTypeNotConcrete(t.name().to_string()))
                }
                Some(_) => {}
            }
        }
        Ok(Self::from_parts(ty, exact_type, non_null, false))
    }

    fn from_parts(ty: Option<TypeRef>, exact_type: bool, non_null: bool, always_null: bool) -> Self {
        let ty = ty.filter(|t| exact_type || !t.is_root());
        Self {
            ty,
            exact_type,
            non_null,
            always_null,
        }
    }

    /// Any reference, possibly null.
    pub fn unrestricted() -> Self {
        Self::from_parts(None, false, false, false)
    }

    /// Only the null reference.
    pub fn always_null() -> Self {
        Self::from_parts(None, false, false, true)
    }

    /// Instances of `ty` or its subtypes.
    pub fn declared(ty: &TypeRef, non_null: bool) -> Self {
        Self::from_parts(Some(Arc::clone(ty)), false, non_null, false)
    }

    /// Instances of exactly `ty`, which must be instantiable.
    pub fn exact(ty: &TypeRef, non_null: bool) -> Result<Self> {
        Self::new(Some(Arc::clone(ty)), true, non_null, false)
    }

    pub fn type_ref(&self) -> Option<&TypeRef> {
        self.ty.as_ref()
    }

    pub fn is_exact_type(&self) -> bool {
        self.exact_type
    }

    pub fn non_null(&self) -> bool {
        self.non_null
    }

    pub fn is_always_null(&self) -> bool {
        self.always_null
    }

    pub fn kind(&self) -> MachineKind {
        MachineKind::Object
    }

    pub fn is_unrestricted(&self) -> bool {
        self.ty.is_none() && !self.exact_type && !self.non_null && !self.always_null
    }

    pub fn as_constant(&self) -> Option<Constant> {
        self.always_null.then_some(Constant::Null)
    }

    /// True if the reference described by `constant` fits this stamp.
    pub fn contains_constant(&self, constant: &Constant) -> bool {
        match constant {
            Constant::Null => !self.non_null,
            Constant::Object(actual) => {
                !self.always_null
                    && match &self.ty {
                        None => true,
                        Some(t) if self.exact_type => t == actual,
                        Some(t) => t.is_assignable_from(actual),
                    }
            }
            _ => false,
        }
    }

    pub fn meet(&self, other: &ObjectStamp) -> ObjectStamp {
        if self == other {
            return self.clone();
        }
        if other.always_null {
            return Self::from_parts(self.ty.clone(), self.exact_type, false, self.always_null);
        }
        if self.always_null {
            return Self::from_parts(other.ty.clone(), other.exact_type, false, false);
        }
        let ty = match (&self.ty, &other.ty) {
            (Some(a), Some(b)) => ObjectType::least_common_ancestor(a, b),
            _ => None,
        };
        let exact = self.exact_type && other.exact_type && self.ty == other.ty;
        Self::from_parts(ty, exact, self.non_null && other.non_null, false)
    }

    /// Greatest lower bound.
    ///
    /// Type facts that only the null reference can satisfy turn the result
    /// into the always-null stamp; combined with `non_null` that is Illegal.
    pub fn join(&self, other: &ObjectStamp) -> Stamp {
        if self == other {
            return Stamp::Object(self.clone());
        }
        let non_null = self.non_null || other.non_null;
        let mut always_null = self.always_null || other.always_null;
        if non_null && always_null {
            return Stamp::Illegal(MachineKind::Object);
        }
        let exact = self.exact_type || other.exact_type;
        let ty = match (&self.ty, &other.ty) {
            (None, t) | (t, None) => t.clone(),
            (Some(a), Some(b)) if a == b => Some(Arc::clone(a)),
            (Some(a), Some(b)) => {
                if a.is_assignable_from(b) {
                    always_null |= self.exact_type;
                    Some(Arc::clone(b))
                } else if b.is_assignable_from(a) {
                    always_null |= other.exact_type;
                    Some(Arc::clone(a))
                } else if is_interface_like(a) || is_interface_like(b) {
                    // an exact side is unrelated to the other type
                    always_null |= exact;
                    match (is_interface_like(a), is_interface_like(b)) {
                        (true, false) => Some(Arc::clone(b)),
                        (false, true) => Some(Arc::clone(a)),
                        _ => None,
                    }
                } else {
                    always_null = true;
                    None
                }
            }
        };
        if always_null {
            return if non_null {
                Stamp::Illegal(MachineKind::Object)
            } else {
                Stamp::Object(Self::always_null())
            };
        }
        Stamp::Object(Self::from_parts(ty, exact, non_null, false))
    }

    pub fn always_distinct(&self, other: &ObjectStamp) -> bool {
        if (self.non_null && other.always_null) || (self.always_null && other.non_null) {
            return true;
        }
        if let (Some(a), Some(b)) = (&self.ty, &other.ty) {
            if is_interface_like(a) && is_interface_like(b) {
                return false;
            }
        }
        self.join(other).is_illegal()
    }
}

/// Serialized form, validated by [`ObjectStamp::new`] on the way in.
#[derive(Deserialize)]
struct RawObjectStamp {
    ty: Option<TypeRef>,
    exact_type: bool,
    non_null: bool,
    always_null: bool,
}

impl TryFrom<RawObjectStamp> for ObjectStamp {
    type Error = StampError;

    fn try_from(raw: RawObjectStamp) -> Result<Self> {
        Self::new(raw.ty, raw.exact_type, raw.non_null, raw.always_null)
    }
}

/// Interfaces, and arrays of them, can share instances with types they are
/// not related to by assignability.
fn is_interface_like(ty: &ObjectType) -> bool {
    ty.is_interface() || ty.component_type().is_some_and(|c| is_interface_like(c))
}

impl fmt::Display for ObjectStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a")?;
        if self.always_null {
            return f.write_str(" NULL");
        }
        if self.non_null {
            f.write_str("!")?;
        }
        if self.exact_type {
            f.write_str("#")?;
        }
        match &self.ty {
            Some(t) => write!(f, " {}", t.name()),
            None => f.write_str(" -"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::TypeUniverse;

    struct Types {
        universe: TypeUniverse,
        list: TypeRef,
        base: TypeRef,
        array_list: TypeRef,
        linked: TypeRef,
        string: TypeRef,
    }

    fn types() -> Types {
        let mut universe = TypeUniverse::new();
        let list = universe.define_interface("List", &[]);
        let base = universe.define_abstract_class("AbstractList", None, &[Arc::clone(&list)]);
        let array_list = universe.define_class("ArrayList", Some(&base), &[]);
        let linked = universe.define_class("LinkedList", Some(&base), &[]);
        let string = universe.define_class("String", None, &[]);
        Types {
            universe,
            list,
            base,
            array_list,
            linked,
            string,
        }
    }

    #[test]
    fn test_new_validation() {
        let t = types();
        assert_eq!(
            ObjectStamp::new(None, false, true, true),
            Err(StampError::NullabilityConflict)
        );
        assert_eq!(
            ObjectStamp::new(None, true, false, false),
            Err(StampError::ExactWithoutType)
        );
        assert_eq!(
            ObjectStamp::exact(&t.base, false),
            Err(StampError::ExactTypeNotConcrete("AbstractList".to_string()))
        );
        assert!(ObjectStamp::exact(&t.array_list, true).is_ok());
    }

    #[test]
    fn test_root_type_normalized() {
        let t = types();
        assert!(ObjectStamp::declared(&t.universe.root(), false).is_unrestricted());
        assert!(ObjectStamp::exact(&t.universe.root(), false)
            .unwrap()
            .type_ref()
            .is_some());
    }

    #[test]
    fn test_meet_with_null() {
        let t = types();
        let a = ObjectStamp::declared(&t.string, true);
        let m = a.meet(&ObjectStamp::always_null());
        assert_eq!(m.type_ref(), Some(&t.string));
        assert!(!m.non_null());
        assert!(!m.is_always_null());
        assert_eq!(ObjectStamp::always_null().meet(&a), m);
    }

    #[test]
    fn test_meet_types() {
        let t = types();
        let a = ObjectStamp::exact(&t.array_list, true).unwrap();
        let b = ObjectStamp::exact(&t.linked, false).unwrap();
        let m = a.meet(&b);
        assert_eq!(m.type_ref(), Some(&t.base));
        assert!(!m.is_exact_type());
        assert!(!m.non_null());
        assert!(a.meet(&a.clone()).is_exact_type());
        let unrelated = a.meet(&ObjectStamp::declared(&t.string, true));
        assert_eq!(unrelated.type_ref(), None);
        assert!(unrelated.non_null());
    }

    #[test]
    fn test_meet_with_interface_is_associative() {
        let t = types();
        let array_list = ObjectStamp::declared(&t.array_list, true);
        let linked = ObjectStamp::declared(&t.linked, true);
        let list = ObjectStamp::declared(&t.list, true);

        let left = array_list.meet(&linked).meet(&list);
        let right = array_list.meet(&linked.meet(&list));
        assert_eq!(left, right);
        assert_eq!(left.type_ref(), None);
        assert!(left.non_null());
        assert_eq!(list.meet(&list), list);
    }

    #[test]
    fn test_join_subtype_wins() {
        let t = types();
        let list = ObjectStamp::declared(&t.list, false);
        let array_list = ObjectStamp::declared(&t.array_list, true);
        let j = list.join(&array_list);
        assert_eq!(j, Stamp::Object(array_list.clone()));
        assert_eq!(array_list.join(&list), j);
    }

    #[test]
    fn test_join_exact_supertype_is_null_only() {
        let t = types();
        let exact_list = ObjectStamp::exact(&t.array_list, false).unwrap();
        let sub = t.universe.clone().define_class("MyList", Some(&t.array_list), &[]);
        let j = exact_list.join(&ObjectStamp::declared(&sub, false));
        assert_eq!(j, Stamp::Object(ObjectStamp::always_null()));
        let j = exact_list.join(&ObjectStamp::declared(&sub, true));
        assert!(j.is_illegal());
    }

    #[test]
    fn test_join_unrelated_classes() {
        let t = types();
        let a = ObjectStamp::declared(&t.array_list, true);
        let b = ObjectStamp::declared(&t.string, false);
        assert!(a.join(&b).is_illegal());
        assert!(a.always_distinct(&b));
        let nullable = ObjectStamp::declared(&t.array_list, false);
        assert_eq!(nullable.join(&b), Stamp::Object(ObjectStamp::always_null()));
    }

    #[test]
    fn test_join_interface_with_class() {
        let t = types();
        let list = ObjectStamp::declared(&t.list, true);
        let string = ObjectStamp::declared(&t.string, false);
        let j = list.join(&string);
        let j = j.as_object().unwrap();
        assert_eq!(j.type_ref(), Some(&t.string));
        assert!(j.non_null());
        let exact_string = ObjectStamp::exact(&t.string, true).unwrap();
        assert!(list.join(&exact_string).is_illegal());
    }

    #[test]
    fn test_join_interface_arrays_keep_shared_instances() {
        let t = types();
        let mut universe = t.universe.clone();
        let runnable = universe.define_interface("Runnable", &[]);
        let runnables = universe.array_of(&runnable);
        let lists = universe.array_of(&t.base);

        let j = ObjectStamp::declared(&runnables, true).join(&ObjectStamp::declared(&lists, true));
        let j = j.as_object().unwrap();
        assert_eq!(j.type_ref(), Some(&lists));
        assert!(j.non_null() && !j.is_always_null());

        let exact = ObjectStamp::exact(&runnables, true).unwrap();
        assert!(exact.join(&ObjectStamp::declared(&lists, true)).is_illegal());
        assert!(!ObjectStamp::declared(&runnables, true)
            .always_distinct(&ObjectStamp::declared(&universe.array_of(&t.list), true)));
    }

    #[test]
    fn test_always_distinct() {
        let t = types();
        let non_null = ObjectStamp::declared(&t.base, true);
        assert!(non_null.always_distinct(&ObjectStamp::always_null()));
        let mut universe = t.universe.clone();
        let other_iface = universe.define_interface("Runnable", &[]);
        let a = ObjectStamp::declared(&t.list, true);
        let b = ObjectStamp::declared(&other_iface, true);
        assert!(!a.always_distinct(&b));
        assert!(!ObjectStamp::declared(&t.base, false)
            .always_distinct(&ObjectStamp::declared(&t.linked, false)));
    }

    #[test]
    fn test_contains_constant() {
        let t = types();
        let s = ObjectStamp::declared(&t.base, true);
        assert!(s.contains_constant(&Constant::Object(Arc::clone(&t.linked))));
        assert!(!s.contains_constant(&Constant::Null));
        assert!(!s.contains_constant(&Constant::Object(Arc::clone(&t.string))));
        let exact = ObjectStamp::exact(&t.array_list, false).unwrap();
        assert!(exact.contains_constant(&Constant::Null));
        assert!(!exact.contains_constant(&Constant::Object(Arc::clone(&t.linked))));
        assert_eq!(ObjectStamp::always_null().as_constant(), Some(Constant::Null));
    }

    #[test]
    fn test_deserialize_validates() {
        let conflict = r#"{"ty":null,"exact_type":false,"non_null":true,"always_null":true}"#;
        assert!(serde_json::from_str::<ObjectStamp>(conflict).is_err());
        let exact_any = r#"{"ty":null,"exact_type":true,"non_null":false,"always_null":false}"#;
        assert!(serde_json::from_str::<ObjectStamp>(exact_any).is_err());

        let t = types();
        let s = ObjectStamp::exact(&t.array_list, true).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(serde_json::from_str::<ObjectStamp>(&json).unwrap(), s);
    }

    #[test]
    fn test_display() {
        let t = types();
        assert_eq!(ObjectStamp::exact(&t.array_list, true).unwrap().to_string(), "a!# ArrayList");
        assert_eq!(ObjectStamp::always_null().to_string(), "a NULL");
        assert_eq!(ObjectStamp::unrestricted().to_string(), "a -");
    }
}
