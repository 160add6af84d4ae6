// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builders for class and enum descriptors.

use crate::descriptor::{
    AttributeSpec, ClassRef, ClassSpec, Constructor, EnumDescriptor, EnumVariant, ScalarKind,
    TypeDescriptor,
};
use crate::error::Result;
use crate::value::{Instance, Unstructured, Value};
use std::sync::Arc;

/// Builder for class descriptors.
pub struct ClassBuilder {
    class: ClassRef,
    spec: ClassSpec,
}

impl ClassBuilder {
    /// Start a new class.
    pub fn new(name: impl Into<String>) -> Self {
        Self::for_ref(&ClassRef::declare(name))
    }

    /// Define a previously declared class (for self-referential types).
    pub fn for_ref(class: &ClassRef) -> Self {
        Self {
            class: class.clone(),
            spec: ClassSpec::default(),
        }
    }

    /// Add a required scalar attribute.
    pub fn field(self, name: impl Into<String>, kind: ScalarKind) -> Self {
        self.attribute(AttributeSpec::new(name, TypeDescriptor::Scalar(kind)))
    }

    /// Add a required attribute with any descriptor.
    pub fn field_with_type(self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.attribute(AttributeSpec::new(name, descriptor))
    }

    /// Add an attribute with a default value.
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        descriptor: TypeDescriptor,
        default: impl Into<Value>,
    ) -> Self {
        self.attribute(AttributeSpec::new(name, descriptor).with_default(default))
    }

    /// Add an `Optional[descriptor]` attribute defaulting to null.
    pub fn optional_field(self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.attribute(
            AttributeSpec::new(name, TypeDescriptor::optional(descriptor)).with_default(Value::Null),
        )
    }

    /// Add an attribute with no declared descriptor.
    pub fn untyped_field(self, name: impl Into<String>) -> Self {
        self.attribute(AttributeSpec::untyped(name))
    }

    /// Add a list attribute.
    pub fn sequence_field(self, name: impl Into<String>, element: TypeDescriptor) -> Self {
        self.field_with_type(name, TypeDescriptor::sequence(element))
    }

    /// Add a nested class attribute.
    pub fn nested_field(self, name: impl Into<String>, nested: &ClassRef) -> Self {
        self.field_with_type(name, TypeDescriptor::Class(nested.clone()))
    }

    /// Add a fully specified attribute.
    pub fn attribute(mut self, attribute: AttributeSpec) -> Self {
        self.spec.push(attribute);
        self
    }

    /// Custom constructor, invoked with the complete attribute set.
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(Instance) -> Result<Value> + Send + Sync + 'static,
    {
        let constructor: Constructor = Arc::new(constructor);
        self.spec = self.spec.with_constructor(constructor);
        self
    }

    /// Define the class and return its handle.
    pub fn build(self) -> ClassRef {
        self.class.define(self.spec);
        self.class
    }

    /// Build and wrap as a descriptor.
    pub fn build_descriptor(self) -> TypeDescriptor {
        TypeDescriptor::Class(self.build())
    }
}

/// Builder for enum descriptors.
#[derive(Debug)]
pub struct EnumBuilder {
    name: String,
    variants: Vec<EnumVariant>,
    next_value: i64,
}

impl EnumBuilder {
    /// Create a new enum builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
            next_value: 0,
        }
    }

    /// Add a variant with auto-incrementing integer value.
    ///
    /// Auto values wrap from `i64::MAX` to `i64::MIN`.
    pub fn variant(mut self, name: impl Into<String>) -> Self {
        self.variants.push(EnumVariant::new(name, self.next_value));
        self.next_value = self.next_value.wrapping_add(1);
        self
    }

    /// Add a variant with explicit integer value.
    pub fn variant_value(mut self, name: impl Into<String>, value: i64) -> Self {
        self.variants.push(EnumVariant::new(name, value));
        self.next_value = value.wrapping_add(1);
        self
    }

    /// Add a variant with any scalar value.
    pub fn variant_scalar(mut self, name: impl Into<String>, value: impl Into<Unstructured>) -> Self {
        self.variants.push(EnumVariant::new(name, value));
        self
    }

    pub fn build(self) -> EnumDescriptor {
        EnumDescriptor::new(self.name, self.variants)
    }

    /// Build and wrap as a descriptor.
    pub fn build_descriptor(self) -> TypeDescriptor {
        TypeDescriptor::enumeration(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_builder() {
        let pet = ClassBuilder::new("Pet")
            .field("name", ScalarKind::Text)
            .field_with_default("age", TypeDescriptor::int(), 0i64)
            .optional_field("owner", TypeDescriptor::text())
            .untyped_field("extra")
            .build();

        let spec = pet.spec().expect("defined");
        assert_eq!(spec.len(), 4);
        assert!(spec.attribute("name").map(|a| a.is_mandatory()).unwrap_or(false));
        assert_eq!(
            spec.attribute("owner").map(|a| a.descriptor.to_string()),
            Some("Optional[str]".to_string())
        );
        assert!(spec.attribute("extra").map(|a| a.descriptor.is_opaque()).unwrap_or(false));
    }

    #[test]
    fn test_recursive_builder() {
        let tree = ClassRef::declare("Tree");
        let built = ClassBuilder::for_ref(&tree)
            .field("label", ScalarKind::Text)
            .sequence_field("children", TypeDescriptor::Class(tree.clone()))
            .build();

        assert_eq!(built, tree);
        assert!(tree.is_defined());
    }

    #[test]
    fn test_enum_builder() {
        let status = EnumBuilder::new("Status")
            .variant("UNKNOWN")
            .variant("ACTIVE")
            .variant_value("ERROR", 10)
            .variant("FATAL")
            .variant_scalar("LEGACY", "legacy")
            .build();

        assert_eq!(status.variant("ACTIVE").map(|v| v.value.clone()), Some(Unstructured::Int(1)));
        assert_eq!(status.variant("FATAL").map(|v| v.value.clone()), Some(Unstructured::Int(11)));
        assert_eq!(status.variants().len(), 5);
    }

    #[test]
    fn test_enum_builder_at_integer_limit() {
        let limits = EnumBuilder::new("Limits")
            .variant_value("TOP", i64::MAX)
            .variant("NEXT")
            .build();

        assert_eq!(limits.variant("TOP").map(|v| v.value.clone()), Some(Unstructured::Int(i64::MAX)));
        assert_eq!(limits.variant("NEXT").map(|v| v.value.clone()), Some(Unstructured::Int(i64::MIN)));
    }
}
