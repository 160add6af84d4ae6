// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Converter facade: one hook registry plus the two engines.
//!
//! # Example
//!
//! ```
//! use restruct::{ClassBuilder, Converter, ScalarKind, Unstructured};
//!
//! let pair = ClassBuilder::new("Pair")
//!     .field("a", ScalarKind::Int)
//!     .field("b", ScalarKind::Text)
//!     .build_descriptor();
//!
//! let converter = Converter::new();
//! let raw = Unstructured::map([("a", Unstructured::Int(1)), ("b", Unstructured::from("a"))]);
//! let value = converter.structure(&raw, &pair)?;
//! assert_eq!(converter.unstructure(&value), raw);
//! # Ok::<(), restruct::Error>(())
//! ```

use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::registry::{DisambiguationHook, HookRegistry, StructureHook, UnstructureHook};
use crate::typed::Structured;
use crate::unstructure::passthrough;
use crate::value::{Unstructured, Value};
use std::sync::OnceLock;

/// Default capacity of each direction's resolved-hook cache.
pub const DEFAULT_HOOK_CACHE_CAPACITY: usize = 256;

/// How class instances are unstructured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnstructureStrategy {
    /// Mapping of attribute name to value.
    #[default]
    AsDict,
    /// Sequence of attribute values in declaration order. Structuring a class
    /// then also accepts a sequence, positionally.
    AsTuple,
}

/// Converter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConverterConfig {
    pub unstructure_strategy: UnstructureStrategy,
    /// Per-direction LRU capacity for resolved hooks; 0 disables caching.
    pub hook_cache_capacity: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            unstructure_strategy: UnstructureStrategy::AsDict,
            hook_cache_capacity: DEFAULT_HOOK_CACHE_CAPACITY,
        }
    }
}

/// Fluent builder for [`Converter`].
#[derive(Debug, Clone, Default)]
pub struct ConverterBuilder {
    config: ConverterConfig,
}

impl ConverterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: UnstructureStrategy) -> Self {
        self.config.unstructure_strategy = strategy;
        self
    }

    pub fn hook_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.hook_cache_capacity = capacity;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ConverterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Converter {
        Converter::with_config(self.config)
    }
}

/// Bidirectional converter between domain values and unstructured values.
///
/// Converters are independent: hooks registered on one are never visible to
/// another. A converter is `Send + Sync`; registration may race with
/// conversions on other threads.
#[derive(Debug)]
pub struct Converter {
    registry: HookRegistry,
    config: ConverterConfig,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    /// Converter with default configuration and built-in rules.
    pub fn new() -> Self {
        Self::with_config(ConverterConfig::default())
    }

    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::new()
    }

    pub fn with_config(config: ConverterConfig) -> Self {
        log::debug!(
            "[Converter::new] strategy={:?} hook_cache_capacity={}",
            config.unstructure_strategy,
            config.hook_cache_capacity
        );
        Self {
            registry: HookRegistry::with_defaults(config.hook_cache_capacity),
            config,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// Build a domain value of shape `target` from `raw`.
    ///
    /// # Errors
    ///
    /// Any [`ErrorKind`](crate::ErrorKind); the error path locates the
    /// offending element within `raw`.
    pub fn structure(&self, raw: &Unstructured, target: &TypeDescriptor) -> Result<Value> {
        let hook = self.registry.resolve_structure(target)?;
        hook.call(raw, target, self)
    }

    /// Unstructure by the value's runtime shape. Never fails; values no
    /// hook covers pass through unchanged.
    pub fn unstructure(&self, value: &Value) -> Unstructured {
        let descriptor = value.runtime_descriptor();
        self.unstructure_with(value, &descriptor)
    }

    /// Unstructure using a declared descriptor as the hook key.
    ///
    /// `Opaque` and `Union` declarations carry no usable shape, so the
    /// value's runtime descriptor is used for them.
    pub fn unstructure_as(&self, value: &Value, declared: &TypeDescriptor) -> Unstructured {
        match declared {
            TypeDescriptor::Opaque | TypeDescriptor::Union(_) => self.unstructure(value),
            _ => self.unstructure_with(value, declared),
        }
    }

    fn unstructure_with(&self, value: &Value, descriptor: &TypeDescriptor) -> Unstructured {
        match self.registry.resolve_unstructure(descriptor) {
            Ok(hook) => hook.call(value, descriptor, self),
            Err(_) => passthrough(value),
        }
    }

    pub fn register_structure_hook(&self, descriptor: TypeDescriptor, hook: StructureHook) {
        self.registry.register_structure_hook(descriptor, hook);
    }

    pub fn register_unstructure_hook(&self, descriptor: TypeDescriptor, hook: UnstructureHook) {
        self.registry.register_unstructure_hook(descriptor, hook);
    }

    pub fn register_structure_hook_fn<P>(&self, predicate: P, hook: StructureHook)
    where
        P: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        self.registry.register_structure_hook_fn(predicate, hook);
    }

    pub fn register_unstructure_hook_fn<P>(&self, predicate: P, hook: UnstructureHook)
    where
        P: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        self.registry.register_unstructure_hook_fn(predicate, hook);
    }

    /// Register how raw values pick a member of `union`.
    pub fn register_union_disambiguator<F>(&self, union: TypeDescriptor, hook: F)
    where
        F: Fn(&Unstructured) -> Result<TypeDescriptor> + Send + Sync + 'static,
    {
        self.registry
            .register_disambiguator(union, DisambiguationHook::new(hook));
    }

    /// Structure straight into a statically typed value.
    pub fn structure_into<T: Structured>(&self, raw: &Unstructured) -> Result<T> {
        T::from_value(self.structure(raw, &T::descriptor())?)
    }

    pub fn unstructure_from<T: Structured>(&self, value: &T) -> Unstructured {
        self.unstructure_as(&value.to_value(), &T::descriptor())
    }

    /// Independent converter with the same config and a snapshot of the
    /// current hooks.
    pub fn copy(&self) -> Self {
        Self {
            registry: self.registry.snapshot(),
            config: self.config.clone(),
        }
    }
}

static GLOBAL: OnceLock<Converter> = OnceLock::new();

/// Process-wide default converter, created on first use.
pub fn global() -> &'static Converter {
    GLOBAL.get_or_init(Converter::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ScalarKind;
    use crate::error::Error;

    #[test]
    fn test_builder() {
        let converter = Converter::builder()
            .strategy(UnstructureStrategy::AsTuple)
            .hook_cache_capacity(0)
            .build();
        assert_eq!(converter.config().unstructure_strategy, UnstructureStrategy::AsTuple);
        assert_eq!(converter.config().hook_cache_capacity, 0);

        let config = ConverterConfig {
            unstructure_strategy: UnstructureStrategy::AsDict,
            hook_cache_capacity: 8,
        };
        let converter = Converter::builder().config(config.clone()).build();
        assert_eq!(converter.config(), &config);
    }

    #[test]
    fn test_converters_are_independent() {
        let a = Converter::new();
        let b = Converter::new();
        a.register_structure_hook(
            TypeDescriptor::int(),
            StructureHook::new(|_, _, _| Ok(Value::Int(0))),
        );

        let raw = Unstructured::Int(5);
        assert_eq!(a.structure(&raw, &TypeDescriptor::int()).expect("a"), Value::Int(0));
        assert_eq!(b.structure(&raw, &TypeDescriptor::int()).expect("b"), Value::Int(5));
    }

    #[test]
    fn test_copy_snapshots_hooks() {
        let original = Converter::new();
        original.register_unstructure_hook(
            TypeDescriptor::scalar(ScalarKind::Bool),
            UnstructureHook::new(|v, _| Unstructured::from(if v.as_bool() == Some(true) { "yes" } else { "no" })),
        );
        let copy = original.copy();
        copy.register_unstructure_hook(
            TypeDescriptor::bool(),
            UnstructureHook::new(|_, _| Unstructured::Null),
        );

        assert_eq!(original.unstructure(&Value::Bool(true)), Unstructured::from("yes"));
        assert_eq!(copy.unstructure(&Value::Bool(true)), Unstructured::Null);
    }

    #[test]
    fn test_disambiguator_hook() {
        let converter = Converter::new();
        let union = TypeDescriptor::union(vec![TypeDescriptor::int(), TypeDescriptor::text()]);
        converter.register_union_disambiguator(union.clone(), |raw| match raw {
            Unstructured::Text(_) => Ok(TypeDescriptor::text()),
            Unstructured::Int(_) => Ok(TypeDescriptor::int()),
            other => Err(Error::shape_mismatch("int or str", other.kind_name())),
        });

        assert_eq!(
            converter.structure(&Unstructured::from("x"), &union).expect("text"),
            Value::from("x")
        );
        assert!(converter
            .structure(&Unstructured::Null, &union)
            .unwrap_err()
            .is_shape_mismatch());
    }

    #[test]
    fn test_union_without_disambiguation_fails() {
        let union = TypeDescriptor::union(vec![TypeDescriptor::int(), TypeDescriptor::text()]);
        let err = Converter::new()
            .structure(&Unstructured::Int(1), &union)
            .unwrap_err();
        assert!(err.is_ambiguous_union());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(global(), global()));
        assert_eq!(global().unstructure(&Value::Int(1)), Unstructured::Int(1));
    }
}
