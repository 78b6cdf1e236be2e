//! Type metadata consumed by object stamps.
//!
//! `ObjectType` is a small, immutable class-hierarchy node. Stamps hold it
//! through [`TypeRef`] so that stamps stay cheap to clone and can be shared
//! across compiler threads.

use crate::kind::MachineKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shared handle to a resolved type.
pub type TypeRef = Arc<ObjectType>;

/// Shape of a type in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    /// Instantiable class
    Class,
    /// Class that cannot be instantiated directly
    AbstractClass,
    Interface,
    /// Array with the given component type
    Array(TypeRef),
    /// Primitive value type (used only for metadata lookups)
    Primitive(MachineKind),
    /// Untracked machine word
    Word,
}

/// A node of the type hierarchy.
///
/// Equality and hashing use the type name only; two handles with the same
/// name denote the same type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectType {
    name: String,
    kind: TypeKind,
    superclass: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ObjectType {}

impl Hash for ObjectType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl ObjectType {
    /// Creates a type node. Prefer [`TypeUniverse`] for building hierarchies.
    pub fn new(
        name: impl Into<String>,
        kind: TypeKind,
        superclass: Option<TypeRef>,
        interfaces: Vec<TypeRef>,
    ) -> TypeRef {
        Arc::new(Self {
            name: name.into(),
            kind,
            superclass,
            interfaces,
        })
    }

    /// Array type whose components are `component`.
    pub fn array_of(component: &TypeRef) -> TypeRef {
        Self::new(
            format!("{}[]", component.name),
            TypeKind::Array(Arc::clone(component)),
            None,
            Vec::new(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn superclass(&self) -> Option<&TypeRef> {
        self.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_) | TypeKind::Word)
    }

    pub fn component_type(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Array(component) => Some(component),
            _ => None,
        }
    }

    /// True if instances of exactly this type can exist.
    pub fn is_concrete(&self) -> bool {
        matches!(self.kind, TypeKind::Class | TypeKind::Array(_))
    }

    /// True for the root of the class hierarchy.
    pub fn is_root(&self) -> bool {
        self.kind == TypeKind::Class && self.superclass.is_none()
    }

    /// True if every instance of `other` is also an instance of `self`.
    pub fn is_assignable_from(&self, other: &ObjectType) -> bool {
        if self == other {
            return true;
        }
        if self.is_primitive() || other.is_primitive() {
            return false;
        }
        if self.is_root() {
            return true;
        }
        match &self.kind {
            TypeKind::Interface => implements(other, self),
            TypeKind::Class | TypeKind::AbstractClass => {
                let mut current = other.superclass.as_ref();
                while let Some(sup) = current {
                    if **sup == *self {
                        return true;
                    }
                    current = sup.superclass.as_ref();
                }
                false
            }
            TypeKind::Array(component) => match &other.kind {
                TypeKind::Array(other_component) => {
                    if component.is_primitive() || other_component.is_primitive() {
                        component == other_component
                    } else {
                        component.is_assignable_from(other_component)
                    }
                }
                _ => false,
            },
            TypeKind::Primitive(_) | TypeKind::Word => false,
        }
    }

    /// Upper bound of `a` and `b` used by object stamp meets.
    ///
    /// Classes meet at their closest common superclass and arrays meet
    /// component-wise. Any other pair of distinct types meets at the root,
    /// including a class and an interface it implements; the result must not
    /// depend on how a chain of meets is grouped. `None` stands for the
    /// hierarchy root (any object).
    pub fn least_common_ancestor(a: &TypeRef, b: &TypeRef) -> Option<TypeRef> {
        if a == b {
            return Some(Arc::clone(a));
        }
        match (&a.kind, &b.kind) {
            (TypeKind::Array(ca), TypeKind::Array(cb)) => {
                if ca.is_primitive() || cb.is_primitive() {
                    return None;
                }
                Self::least_common_ancestor(ca, cb).map(|c| Self::array_of(&c))
            }
            (
                TypeKind::Class | TypeKind::AbstractClass,
                TypeKind::Class | TypeKind::AbstractClass,
            ) => {
                let mut current = Some(a);
                while let Some(t) = current {
                    if t.is_root() {
                        return None;
                    }
                    if t.is_assignable_from(b) {
                        return Some(Arc::clone(t));
                    }
                    current = t.superclass.as_ref();
                }
                None
            }
            _ => None,
        }
    }
}

fn implements(ty: &ObjectType, interface: &ObjectType) -> bool {
    ty.interfaces
        .iter()
        .any(|i| **i == *interface || implements(i, interface))
        || ty
            .superclass
            .as_ref()
            .is_some_and(|sup| implements(sup, interface))
}

/// Lookups the lattice makes when resolving a stamp to a type.
pub trait MetaAccessProvider {
    /// Type describing values of a primitive kind (including `Void`).
    fn lookup_primitive(&self, kind: MachineKind) -> Option<TypeRef>;

    /// Root of the object hierarchy.
    fn lookup_object_root(&self) -> TypeRef;

    /// Type used for untracked machine words.
    fn lookup_word_type(&self) -> Option<TypeRef>;
}

/// Name of the hierarchy root registered by [`TypeUniverse::new`].
pub const ROOT_TYPE_NAME: &str = "java.lang.Object";

/// In-memory type table implementing [`MetaAccessProvider`].
#[derive(Debug, Clone)]
pub struct TypeUniverse {
    types: HashMap<String, TypeRef>,
    root: TypeRef,
}

impl TypeUniverse {
    /// Creates a universe holding the root class and the primitive types.
    pub fn new() -> Self {
        let root = ObjectType::new(ROOT_TYPE_NAME, TypeKind::Class, None, Vec::new());
        let mut types = HashMap::new();
        types.insert(ROOT_TYPE_NAME.to_string(), Arc::clone(&root));
        for (name, kind) in [
            ("boolean", MachineKind::Boolean),
            ("byte", MachineKind::Byte),
            ("short", MachineKind::Short),
            ("int", MachineKind::Int),
            ("long", MachineKind::Long),
            ("float", MachineKind::Float),
            ("double", MachineKind::Double),
            ("void", MachineKind::Void),
        ] {
            types.insert(
                name.to_string(),
                ObjectType::new(name, TypeKind::Primitive(kind), None, Vec::new()),
            );
        }
        types.insert(
            "word".to_string(),
            ObjectType::new("word", TypeKind::Word, None, Vec::new()),
        );
        Self { types, root }
    }

    pub fn root(&self) -> TypeRef {
        Arc::clone(&self.root)
    }

    /// Defines an instantiable class. A missing superclass means the root.
    pub fn define_class(
        &mut self,
        name: &str,
        superclass: Option<&TypeRef>,
        interfaces: &[TypeRef],
    ) -> TypeRef {
        self.define(name, TypeKind::Class, superclass, interfaces)
    }

    pub fn define_abstract_class(
        &mut self,
        name: &str,
        superclass: Option<&TypeRef>,
        interfaces: &[TypeRef],
    ) -> TypeRef {
        self.define(name, TypeKind::AbstractClass, superclass, interfaces)
    }

    pub fn define_interface(&mut self, name: &str, superinterfaces: &[TypeRef]) -> TypeRef {
        let ty = ObjectType::new(name, TypeKind::Interface, None, superinterfaces.to_vec());
        self.types.insert(name.to_string(), Arc::clone(&ty));
        ty
    }

    /// Array type over `component`, registered on first use.
    pub fn array_of(&mut self, component: &TypeRef) -> TypeRef {
        let ty = ObjectType::array_of(component);
        Arc::clone(
            self.types
                .entry(ty.name().to_string())
                .or_insert_with(|| Arc::clone(&ty)),
        )
    }

    pub fn lookup(&self, name: &str) -> Option<TypeRef> {
        self.types.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn define(
        &mut self,
        name: &str,
        kind: TypeKind,
        superclass: Option<&TypeRef>,
        interfaces: &[TypeRef],
    ) -> TypeRef {
        let sup = superclass.cloned().unwrap_or_else(|| Arc::clone(&self.root));
        let ty = ObjectType::new(name, kind, Some(sup), interfaces.to_vec());
        self.types.insert(name.to_string(), Arc::clone(&ty));
        ty
    }
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaAccessProvider for TypeUniverse {
    fn lookup_primitive(&self, kind: MachineKind) -> Option<TypeRef> {
        let name = match kind {
            MachineKind::Boolean => "boolean",
            MachineKind::Byte => "byte",
            MachineKind::Short => "short",
            MachineKind::Int => "int",
            MachineKind::Long => "long",
            MachineKind::Float => "float",
            MachineKind::Double => "double",
            MachineKind::Void => "void",
            MachineKind::Object | MachineKind::Word | MachineKind::Illegal => return None,
        };
        self.lookup(name)
    }

    fn lookup_object_root(&self) -> TypeRef {
        self.root()
    }

    fn lookup_word_type(&self) -> Option<TypeRef> {
        self.lookup("word")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> (TypeUniverse, TypeRef, TypeRef, TypeRef, TypeRef) {
        let mut u = TypeUniverse::new();
        let list = u.define_interface("List", &[]);
        let base = u.define_abstract_class("AbstractList", None, &[Arc::clone(&list)]);
        let array_list = u.define_class("ArrayList", Some(&base), &[]);
        let linked = u.define_class("LinkedList", Some(&base), &[]);
        (u, list, base, array_list, linked)
    }

    #[test]
    fn test_assignability() {
        let (u, list, base, array_list, _) = hierarchy();
        assert!(base.is_assignable_from(&array_list));
        assert!(list.is_assignable_from(&array_list));
        assert!(!array_list.is_assignable_from(&base));
        assert!(u.root().is_assignable_from(&list));
        assert!(!list.is_assignable_from(&u.root()));
    }

    #[test]
    fn test_least_common_ancestor_classes() {
        let (_, _, base, array_list, linked) = hierarchy();
        let lca = ObjectType::least_common_ancestor(&array_list, &linked).unwrap();
        assert_eq!(lca, base);
        let lca_rev = ObjectType::least_common_ancestor(&linked, &array_list).unwrap();
        assert_eq!(lca_rev, base);
    }

    #[test]
    fn test_least_common_ancestor_unrelated_is_root() {
        let mut u = TypeUniverse::new();
        let a = u.define_class("A", None, &[]);
        let b = u.define_class("B", None, &[]);
        assert_eq!(ObjectType::least_common_ancestor(&a, &b), None);
    }

    #[test]
    fn test_least_common_ancestor_interfaces_widen_to_root() {
        let (mut u, list, base, array_list, linked) = hierarchy();
        let queue = u.define_interface("Queue", &[]);
        let deque = u.define_class("ArrayDeque", None, &[Arc::clone(&queue)]);
        assert_eq!(ObjectType::least_common_ancestor(&list, &list), Some(Arc::clone(&list)));
        assert_eq!(ObjectType::least_common_ancestor(&array_list, &list), None);
        assert_eq!(ObjectType::least_common_ancestor(&list, &queue), None);
        assert_eq!(ObjectType::least_common_ancestor(&deque, &base), None);

        // grouping must not matter
        let left = ObjectType::least_common_ancestor(&array_list, &linked)
            .and_then(|t| ObjectType::least_common_ancestor(&t, &list));
        let right = ObjectType::least_common_ancestor(&linked, &list)
            .and_then(|t| ObjectType::least_common_ancestor(&array_list, &t));
        assert_eq!(left, right);
    }

    #[test]
    fn test_arrays() {
        let (mut u, _, base, array_list, linked) = hierarchy();
        let a1 = u.array_of(&array_list);
        let a2 = u.array_of(&linked);
        let base_array = u.array_of(&base);
        assert!(base_array.is_assignable_from(&a1));
        assert_eq!(ObjectType::least_common_ancestor(&a1, &a2), Some(base_array.clone()));
        assert!(a1.is_concrete());
        let int_array = u.array_of(&u.lookup("int").unwrap());
        assert!(!base_array.is_assignable_from(&int_array));
    }

    #[test]
    fn test_meta_access_lookups() {
        let u = TypeUniverse::new();
        assert_eq!(u.lookup_primitive(MachineKind::Int).unwrap().name(), "int");
        assert!(u.lookup_primitive(MachineKind::Object).is_none());
        assert!(u.lookup_object_root().is_root());
        assert_eq!(u.lookup_word_type().unwrap().name(), "word");
    }
}
