// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enumeration descriptors.

use crate::value::Unstructured;

/// Ordered member table of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumDescriptor {
    name: String,
    variants: Vec<EnumVariant>,
}

impl EnumDescriptor {
    /// Create enum descriptor. Member names are expected to be unique;
    /// lookups return the first match.
    pub fn new(name: impl Into<String>, variants: Vec<EnumVariant>) -> Self {
        Self {
            name: name.into(),
            variants,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variants(&self) -> &[EnumVariant] {
        &self.variants
    }

    /// Get variant by name.
    pub fn variant(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Get variant by value. Integers and floats of equal magnitude match.
    pub fn variant_by_value(&self, value: &Unstructured) -> Option<&EnumVariant> {
        self.variants
            .iter()
            .find(|v| &v.value == value)
            .or_else(|| self.variants.iter().find(|v| v.value.numeric_eq(value)))
    }
}

/// Enum member: name and underlying scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumVariant {
    pub name: String,
    pub value: Unstructured,
}

impl EnumVariant {
    pub fn new(name: impl Into<String>, value: impl Into<Unstructured>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
