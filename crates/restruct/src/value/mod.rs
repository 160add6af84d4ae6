// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Domain and unstructured value trees.
//!
//! [`Value`] is what structuring produces: it keeps container kinds apart
//! (list vs tuple, set vs frozen set) and carries class instances and enum
//! members. [`Unstructured`] is what formats exchange with the engine.

mod foreign;
mod unstructured;

pub use foreign::Foreign;
pub use unstructured::Unstructured;

use crate::descriptor::{ClassRef, EnumDescriptor, EnumVariant, ScalarKind, TypeDescriptor};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Total order on floats (NaN sorts last, -0.0 before 0.0).
pub(crate) fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

// 2^63: the first float above every i64.
const I64_UPPER_EXCLUSIVE: f64 = 9_223_372_036_854_775_808.0;

/// Numeric order on floats: `-0.0 == 0.0`, every NaN equal and last.
fn cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison of an integer with a float.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f >= I64_UPPER_EXCLUSIVE {
        return Ordering::Less;
    }
    if f < -I64_UPPER_EXCLUSIVE {
        return Ordering::Greater;
    }
    // In range: the truncation converts exactly.
    let whole = f.trunc();
    i.cmp(&(whole as i64)).then_with(|| {
        if f > whole {
            Ordering::Less
        } else if f < whole {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

/// Hash a float so that it matches an equal integer.
fn hash_float<H: Hasher>(f: f64, state: &mut H) {
    if f.is_nan() {
        u64::MAX.hash(state);
    } else if f.fract() == 0.0 && (-I64_UPPER_EXCLUSIVE..I64_UPPER_EXCLUSIVE).contains(&f) {
        (f as i64).hash(state);
    } else {
        f.to_bits().hash(state);
    }
}

/// A structured domain value.
///
/// Integers and floats compare numerically, so `Int(1) == Float(1.0)` and a
/// set holding both keeps one. Booleans stay distinct from numbers.
#[derive(Debug, Clone)]
pub enum Value {
    // Primitives
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),

    // Containers
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(BTreeSet<Value>),
    FrozenSet(BTreeSet<Value>),
    Map(BTreeMap<Value, Value>),

    // Annotated types
    Enum(EnumMember),
    Instance(Instance),

    // Special
    Foreign(Foreign),
}

impl Value {
    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Elements of a list or tuple.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) | Self::Tuple(v) => Some(v),
            _ => None,
        }
    }

    /// Elements of a set or frozen set.
    pub fn as_set(&self) -> Option<&BTreeSet<Value>> {
        match self {
            Self::Set(v) | Self::FrozenSet(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Value, Value>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumMember> {
        match self {
            Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get an instance attribute.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.as_instance()?.get(name)
    }

    /// Shape name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::FrozenSet(_) => "frozenset",
            Self::Map(_) => "dict",
            Self::Enum(_) => "enum",
            Self::Instance(_) => "instance",
            Self::Foreign(_) => "foreign",
        }
    }

    /// Descriptor of the value's own runtime type; keys unstructure hooks.
    ///
    /// Containers do not know their element types, so their parameters are
    /// `Opaque` (a list is `List[Any]`).
    pub fn runtime_descriptor(&self) -> TypeDescriptor {
        match self {
            Self::Null | Self::Foreign(_) => TypeDescriptor::Opaque,
            Self::Bool(_) => TypeDescriptor::Scalar(ScalarKind::Bool),
            Self::Int(_) => TypeDescriptor::Scalar(ScalarKind::Int),
            Self::Float(_) => TypeDescriptor::Scalar(ScalarKind::Float),
            Self::Text(_) => TypeDescriptor::Scalar(ScalarKind::Text),
            Self::Bytes(_) => TypeDescriptor::Scalar(ScalarKind::Bytes),
            Self::List(_) => TypeDescriptor::sequence(TypeDescriptor::Opaque),
            Self::Tuple(_) => TypeDescriptor::variable_tuple(TypeDescriptor::Opaque),
            Self::Set(_) => TypeDescriptor::set(TypeDescriptor::Opaque),
            Self::FrozenSet(_) => TypeDescriptor::frozen_set(TypeDescriptor::Opaque),
            Self::Map(_) => TypeDescriptor::mapping(TypeDescriptor::Opaque, TypeDescriptor::Opaque),
            Self::Enum(member) => TypeDescriptor::Enum(member.descriptor.clone()),
            Self::Instance(instance) => TypeDescriptor::Class(instance.class.clone()),
        }
    }

    /// Lift an unstructured value without any descriptor guidance.
    pub fn from_unstructured(raw: &Unstructured) -> Self {
        match raw {
            Unstructured::Null => Self::Null,
            Unstructured::Bool(v) => Self::Bool(*v),
            Unstructured::Int(v) => Self::Int(*v),
            Unstructured::Float(v) => Self::Float(*v),
            Unstructured::Text(v) => Self::Text(v.clone()),
            Unstructured::Bytes(v) => Self::Bytes(v.clone()),
            Unstructured::Seq(items) => Self::List(items.iter().map(Self::from_unstructured).collect()),
            Unstructured::Map(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(k, v)| (Self::from_unstructured(k), Self::from_unstructured(v)))
                    .collect(),
            ),
            Unstructured::Set(items) => Self::Set(items.iter().map(Self::from_unstructured).collect()),
            Unstructured::Foreign(v) => Self::Foreign(v.clone()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            // Shared: numbers order among themselves by value.
            Self::Int(_) | Self::Float(_) => 2,
            Self::Text(_) => 4,
            Self::Bytes(_) => 5,
            Self::List(_) => 6,
            Self::Tuple(_) => 7,
            Self::Set(_) => 8,
            Self::FrozenSet(_) => 9,
            Self::Map(_) => 10,
            Self::Enum(_) => 11,
            Self::Instance(_) => 12,
            Self::Foreign(_) => 13,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => cmp_float(*a, *b),
            (Self::Int(a), Self::Float(b)) => cmp_int_float(*a, *b),
            (Self::Float(a), Self::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) | (Self::FrozenSet(a), Self::FrozenSet(b)) => a.cmp(b),
            (Self::Map(a), Self::Map(b)) => a.cmp(b),
            (Self::Enum(a), Self::Enum(b)) => a.cmp(b),
            (Self::Instance(a), Self::Instance(b)) => a.cmp(b),
            (Self::Foreign(a), Self::Foreign(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) => hash_float(*v, state),
            Self::Text(v) => v.hash(state),
            Self::Bytes(v) => v.hash(state),
            Self::List(v) | Self::Tuple(v) => v.hash(state),
            Self::Set(v) | Self::FrozenSet(v) => v.hash(state),
            Self::Map(v) => v.hash(state),
            Self::Enum(v) => v.hash(state),
            Self::Instance(v) => v.hash(state),
            Self::Foreign(v) => v.hash(state),
        }
    }
}

/// A member of an enumeration.
///
/// Compares by enum name and member name.
#[derive(Debug, Clone)]
pub struct EnumMember {
    descriptor: Arc<EnumDescriptor>,
    index: usize,
}

impl EnumMember {
    /// Member by name, if the enum declares it.
    pub fn by_name(descriptor: &Arc<EnumDescriptor>, name: &str) -> Option<Self> {
        let index = descriptor.variants().iter().position(|v| v.name == name)?;
        Some(Self {
            descriptor: descriptor.clone(),
            index,
        })
    }

    /// Member by underlying value, if the enum declares one.
    pub fn by_value(descriptor: &Arc<EnumDescriptor>, value: &Unstructured) -> Option<Self> {
        let found = descriptor.variant_by_value(value)?;
        let index = descriptor
            .variants()
            .iter()
            .position(|v| std::ptr::eq(v, found))?;
        Some(Self {
            descriptor: descriptor.clone(),
            index,
        })
    }

    pub fn descriptor(&self) -> &Arc<EnumDescriptor> {
        &self.descriptor
    }

    fn variant(&self) -> &EnumVariant {
        // Index was validated against this descriptor at construction.
        &self.descriptor.variants()[self.index]
    }

    pub fn name(&self) -> &str {
        &self.variant().name
    }

    /// Underlying scalar value.
    pub fn value(&self) -> &Unstructured {
        &self.variant().value
    }
}

impl PartialEq for EnumMember {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EnumMember {}

impl PartialOrd for EnumMember {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EnumMember {
    fn cmp(&self, other: &Self) -> Ordering {
        self.descriptor
            .name()
            .cmp(other.descriptor.name())
            .then_with(|| self.name().cmp(other.name()))
    }
}

impl Hash for EnumMember {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.descriptor.name().hash(state);
        self.name().hash(state);
    }
}

/// A class instance: its class and attribute values in declaration order.
#[derive(Debug, Clone)]
pub struct Instance {
    class: ClassRef,
    fields: Vec<(String, Value)>,
}

impl Instance {
    pub fn new(class: &ClassRef) -> Self {
        Self {
            class: class.clone(),
            fields: Vec::new(),
        }
    }

    /// Builder-style `set`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Attribute value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove and return an attribute value.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    /// Set an attribute; replaces in place if already present.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Instance {}

impl PartialOrd for Instance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Instance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.class
            .name()
            .cmp(other.class.name())
            .then_with(|| self.class.identity().cmp(&other.class.identity()))
            .then_with(|| self.fields.cmp(&other.fields))
    }
}

impl Hash for Instance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class.name().hash(state);
        self.fields.hash(state);
    }
}

// Conversion traits
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Self::Instance(v)
    }
}

impl From<EnumMember> for Value {
    fn from(v: EnumMember) -> Self {
        Self::Enum(v)
    }
}

impl From<Foreign> for Value {
    fn from(v: Foreign) -> Self {
        Self::Foreign(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}
