// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors: what shape a structured value is expected to have.
//!
//! Descriptors are pure data. They compare and hash structurally so they can
//! key the hook registry; class descriptors compare by declaration and are
//! resolved lazily through [`ClassRef`], which lets a class refer to itself.
//!
//! # Example
//!
//! ```rust
//! use restruct::descriptor::{ClassBuilder, ScalarKind, TypeDescriptor};
//!
//! let point = ClassBuilder::new("Point")
//!     .field("x", ScalarKind::Int)
//!     .field("y", ScalarKind::Int)
//!     .build();
//!
//! let path = TypeDescriptor::sequence(TypeDescriptor::class(point));
//! assert_eq!(path.to_string(), "List[Point]");
//! ```

mod builder;
mod class;
mod enumeration;

pub use builder::{ClassBuilder, EnumBuilder};
pub use class::{AttributeSpec, ClassRef, ClassSpec, Constructor};
pub use enumeration::{EnumDescriptor, EnumVariant};

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Primitive kinds understood by every interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 5] = [
        ScalarKind::Bool,
        ScalarKind::Int,
        ScalarKind::Float,
        ScalarKind::Text,
        ScalarKind::Bytes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "str",
            Self::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Descriptor variant without its parameters; selects a shape-family rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Optional,
    Sequence,
    Set,
    FrozenSet,
    Mapping,
    FixedTuple,
    VariableTuple,
    Union,
    Enum,
    Class,
    Opaque,
}

/// Member list of a union.
///
/// Keeps declaration order for diagnostics, but equality and hashing ignore
/// order and duplicates: `Union[A, B]` and `Union[B, A]` are the same key.
#[derive(Debug, Clone)]
pub struct UnionMembers(Arc<[TypeDescriptor]>);

impl UnionMembers {
    pub fn new(members: Vec<TypeDescriptor>) -> Self {
        let mut unique: Vec<TypeDescriptor> = Vec::with_capacity(members.len());
        for member in members {
            if !unique.contains(&member) {
                unique.push(member);
            }
        }
        Self(unique.into())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeDescriptor> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[TypeDescriptor] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, descriptor: &TypeDescriptor) -> bool {
        self.0.contains(descriptor)
    }
}

impl PartialEq for UnionMembers {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|m| other.0.contains(m))
    }
}

impl Eq for UnionMembers {}

impl Hash for UnionMembers {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent: combine per-member digests commutatively.
        let mut combined: u64 = 0;
        for member in self.0.iter() {
            let mut h = DefaultHasher::new();
            member.hash(&mut h);
            combined = combined.wrapping_add(h.finish());
        }
        self.0.len().hash(state);
        combined.hash(state);
    }
}

impl<'a> IntoIterator for &'a UnionMembers {
    type Item = &'a TypeDescriptor;
    type IntoIter = std::slice::Iter<'a, TypeDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Expected shape of a structured value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Primitive.
    Scalar(ScalarKind),
    /// Null or the inner shape.
    Optional(Arc<TypeDescriptor>),
    /// Ordered, homogeneous, mutable list.
    Sequence(Arc<TypeDescriptor>),
    /// Mutable set.
    Set(Arc<TypeDescriptor>),
    /// Immutable set.
    FrozenSet(Arc<TypeDescriptor>),
    /// Key/value mapping.
    Mapping(Arc<TypeDescriptor>, Arc<TypeDescriptor>),
    /// Heterogeneous tuple of fixed arity.
    FixedTuple(Arc<[TypeDescriptor]>),
    /// Homogeneous tuple of any arity.
    VariableTuple(Arc<TypeDescriptor>),
    /// One of several members.
    Union(UnionMembers),
    /// Enumeration with scalar member values.
    Enum(Arc<EnumDescriptor>),
    /// Composite record.
    Class(ClassRef),
    /// No shape known; passthrough.
    Opaque,
}

impl TypeDescriptor {
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }

    pub fn bool() -> Self {
        Self::Scalar(ScalarKind::Bool)
    }

    pub fn int() -> Self {
        Self::Scalar(ScalarKind::Int)
    }

    pub fn float() -> Self {
        Self::Scalar(ScalarKind::Float)
    }

    pub fn text() -> Self {
        Self::Scalar(ScalarKind::Text)
    }

    pub fn bytes() -> Self {
        Self::Scalar(ScalarKind::Bytes)
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional(Arc::new(inner))
    }

    pub fn sequence(inner: TypeDescriptor) -> Self {
        Self::Sequence(Arc::new(inner))
    }

    pub fn set(inner: TypeDescriptor) -> Self {
        Self::Set(Arc::new(inner))
    }

    pub fn frozen_set(inner: TypeDescriptor) -> Self {
        Self::FrozenSet(Arc::new(inner))
    }

    pub fn mapping(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Mapping(Arc::new(key), Arc::new(value))
    }

    pub fn fixed_tuple(members: Vec<TypeDescriptor>) -> Self {
        Self::FixedTuple(members.into())
    }

    pub fn variable_tuple(inner: TypeDescriptor) -> Self {
        Self::VariableTuple(Arc::new(inner))
    }

    pub fn union(members: Vec<TypeDescriptor>) -> Self {
        Self::Union(UnionMembers::new(members))
    }

    pub fn enumeration(descriptor: EnumDescriptor) -> Self {
        Self::Enum(Arc::new(descriptor))
    }

    pub fn class(class: ClassRef) -> Self {
        Self::Class(class)
    }

    /// Variant tag, used to pick a shape-family rule.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Scalar(_) => Shape::Scalar,
            Self::Optional(_) => Shape::Optional,
            Self::Sequence(_) => Shape::Sequence,
            Self::Set(_) => Shape::Set,
            Self::FrozenSet(_) => Shape::FrozenSet,
            Self::Mapping(_, _) => Shape::Mapping,
            Self::FixedTuple(_) => Shape::FixedTuple,
            Self::VariableTuple(_) => Shape::VariableTuple,
            Self::Union(_) => Shape::Union,
            Self::Enum(_) => Shape::Enum,
            Self::Class(_) => Shape::Class,
            Self::Opaque => Shape::Opaque,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque)
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }

    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Self::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDescriptor> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn union_members(&self) -> Option<&UnionMembers> {
        match self {
            Self::Union(members) => Some(members),
            _ => None,
        }
    }
}

impl From<ScalarKind> for TypeDescriptor {
    fn from(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }
}

impl From<ClassRef> for TypeDescriptor {
    fn from(class: ClassRef) -> Self {
        Self::Class(class)
    }
}

impl From<EnumDescriptor> for TypeDescriptor {
    fn from(descriptor: EnumDescriptor) -> Self {
        Self::enumeration(descriptor)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeDescriptor]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{}", kind),
            Self::Optional(inner) => write!(f, "Optional[{}]", inner),
            Self::Sequence(inner) => write!(f, "List[{}]", inner),
            Self::Set(inner) => write!(f, "Set[{}]", inner),
            Self::FrozenSet(inner) => write!(f, "FrozenSet[{}]", inner),
            Self::Mapping(k, v) => write!(f, "Dict[{}, {}]", k, v),
            Self::FixedTuple(members) => {
                f.write_str("Tuple[")?;
                write_list(f, members)?;
                f.write_str("]")
            }
            Self::VariableTuple(inner) => write!(f, "Tuple[{}, ...]", inner),
            Self::Union(members) => {
                f.write_str("Union[")?;
                write_list(f, members.as_slice())?;
                f.write_str("]")
            }
            Self::Enum(e) => f.write_str(e.name()),
            Self::Class(class) => f.write_str(class.name()),
            Self::Opaque => f.write_str("Any"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_structural_equality() {
        let a = TypeDescriptor::mapping(TypeDescriptor::text(), TypeDescriptor::sequence(TypeDescriptor::int()));
        let b = TypeDescriptor::mapping(TypeDescriptor::text(), TypeDescriptor::sequence(TypeDescriptor::int()));
        assert_eq!(a, b);

        let mut table = HashMap::new();
        table.insert(a, 1);
        assert_eq!(table.get(&b), Some(&1));
        assert_ne!(
            TypeDescriptor::set(TypeDescriptor::int()),
            TypeDescriptor::frozen_set(TypeDescriptor::int())
        );
    }

    #[test]
    fn test_union_order_insensitive() {
        let u1 = TypeDescriptor::union(vec![TypeDescriptor::int(), TypeDescriptor::text()]);
        let u2 = TypeDescriptor::union(vec![
            TypeDescriptor::text(),
            TypeDescriptor::int(),
            TypeDescriptor::text(),
        ]);
        assert_eq!(u1, u2);
        assert_eq!(u2.union_members().map(UnionMembers::len), Some(2));

        let mut table = HashMap::new();
        table.insert(u1, "hook");
        assert_eq!(table.get(&u2), Some(&"hook"));
    }

    #[test]
    fn test_display() {
        let point = ClassRef::declare("Point");
        let d = TypeDescriptor::fixed_tuple(vec![
            TypeDescriptor::int(),
            TypeDescriptor::optional(TypeDescriptor::class(point)),
            TypeDescriptor::variable_tuple(TypeDescriptor::float()),
        ]);
        assert_eq!(d.to_string(), "Tuple[int, Optional[Point], Tuple[float, ...]]");
        assert_eq!(TypeDescriptor::Opaque.to_string(), "Any");
    }

    #[test]
    fn test_shape() {
        assert_eq!(TypeDescriptor::int().shape(), Shape::Scalar);
        assert_eq!(
            TypeDescriptor::variable_tuple(TypeDescriptor::int()).shape(),
            Shape::VariableTuple
        );
        assert_eq!(TypeDescriptor::Opaque.shape(), Shape::Opaque);
    }
}
