// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class descriptors.
//!
//! A [`ClassRef`] is a named handle that may be declared before its
//! [`ClassSpec`] is known, so attributes can refer back to their own class
//! (`Node { next: Optional[Node] }`) without eager expansion. Recursive
//! class descriptors form a reference cycle and live for the rest of the
//! process, like any other type definition.

use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::value::{Instance, Value};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Builds a domain value from a complete attribute set.
pub type Constructor = Arc<dyn Fn(Instance) -> Result<Value> + Send + Sync>;

/// One declared attribute of a class.
#[derive(Clone)]
pub struct AttributeSpec {
    /// Attribute name (unique within its class).
    pub name: String,
    /// Declared descriptor; `Opaque` when undeclared.
    pub descriptor: TypeDescriptor,
    /// Value used when the raw mapping lacks this attribute.
    pub default: Option<Value>,
    /// Must be present in the raw mapping unless a default exists.
    pub required: bool,
}

impl AttributeSpec {
    /// Create a required attribute without a default.
    pub fn new(name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
            default: None,
            required: true,
        }
    }

    /// Attribute with no declared descriptor.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, TypeDescriptor::Opaque)
    }

    /// Set default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark as not required.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Absent from a raw mapping is an error.
    pub fn is_mandatory(&self) -> bool {
        self.required && self.default.is_none()
    }
}

impl fmt::Debug for AttributeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSpec")
            .field("name", &self.name)
            .field("descriptor", &format_args!("{}", self.descriptor))
            .field("default", &self.default)
            .field("required", &self.required)
            .finish()
    }
}

/// Ordered attribute list plus constructor contract.
#[derive(Clone, Default)]
pub struct ClassSpec {
    attributes: Vec<AttributeSpec>,
    constructor: Option<Constructor>,
}

impl ClassSpec {
    /// Build from attributes. A repeated name replaces the earlier
    /// declaration in place, so names stay unique.
    pub fn from_attributes(attributes: impl IntoIterator<Item = AttributeSpec>) -> Self {
        let mut spec = Self::default();
        for attribute in attributes {
            spec.push(attribute);
        }
        spec
    }

    pub(crate) fn push(&mut self, attribute: AttributeSpec) {
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Replace the default constructor (which yields a `Value::Instance`).
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Run the constructor over a complete attribute set.
    pub fn construct(&self, instance: Instance) -> Result<Value> {
        match &self.constructor {
            Some(constructor) => constructor(instance),
            None => Ok(Value::Instance(instance)),
        }
    }
}

impl fmt::Debug for ClassSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassSpec")
            .field("attributes", &self.attributes)
            .field("custom_constructor", &self.constructor.is_some())
            .finish()
    }
}

struct ClassCell {
    name: String,
    spec: OnceLock<ClassSpec>,
}

/// Named, lazily-defined class descriptor.
///
/// Equality and hashing follow the handle: clones of one `ClassRef` are the
/// same class, while two declarations sharing a name stay distinct.
#[derive(Clone)]
pub struct ClassRef {
    inner: Arc<ClassCell>,
}

impl ClassRef {
    /// Declare a class whose spec will be supplied later.
    pub fn declare(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ClassCell {
                name: name.into(),
                spec: OnceLock::new(),
            }),
        }
    }

    /// Declare and define in one step.
    pub fn new(name: impl Into<String>, spec: ClassSpec) -> Self {
        let class = Self::declare(name);
        class.define(spec);
        class
    }

    /// Supply the spec. Returns `false` if the class was already defined;
    /// the first definition wins.
    pub fn define(&self, spec: ClassSpec) -> bool {
        let defined = self.inner.spec.set(spec).is_ok();
        if !defined {
            log::debug!(
                "[ClassRef::define] class {} already defined, keeping first spec",
                self.inner.name
            );
        }
        defined
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn spec(&self) -> Option<&ClassSpec> {
        self.inner.spec.get()
    }

    pub fn is_defined(&self) -> bool {
        self.inner.spec.get().is_some()
    }

    /// Address of the shared cell; stable for the life of the class.
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Spec, or a coercion failure naming the undefined class.
    pub(crate) fn require_spec(&self) -> Result<&ClassSpec> {
        self.spec().ok_or_else(|| {
            Error::coercion_failed(self.name(), "class declared but never defined")
        })
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Name only: a recursive spec would print forever.
        write!(f, "ClassRef({})", self.inner.name)
    }
}
