// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hook registry: which conversion function applies to a descriptor.
//!
//! Two independent tables (structure, unstructure). Lookup order per table:
//!
//! 1. exact descriptor registered by the caller
//! 2. caller predicates, most recently registered first
//! 3. exact descriptor among built-in defaults
//! 4. shape-family rule (`Sequence(_)`, `Class(_)`, ...)
//!
//! Resolved hooks are memoized in a per-direction LRU cache. Registration
//! takes the table write lock and clears that direction's cache inside the
//! same critical section; resolution fills the cache while still holding the
//! read lock, so a cached entry never outlives a later registration.

use crate::converter::Converter;
use crate::descriptor::{Shape, TypeDescriptor};
use crate::disambiguate::UniqueFieldIndex;
use crate::error::{Error, Result};
use crate::value::{Unstructured, Value};
use dashmap::DashMap;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Unstructured -> domain.
    Structure,
    /// Domain -> unstructured.
    Unstructure,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structure => f.write_str("structure"),
            Self::Unstructure => f.write_str("unstructure"),
        }
    }
}

type StructureFn = dyn Fn(&Unstructured, &TypeDescriptor, &Converter) -> Result<Value> + Send + Sync;
type UnstructureFn = dyn Fn(&Value, &TypeDescriptor, &Converter) -> Unstructured + Send + Sync;
type DisambiguationFn = dyn Fn(&Unstructured) -> Result<TypeDescriptor> + Send + Sync;

/// Predicate over descriptors, for hooks that cover a family of types.
pub type Predicate = Arc<dyn Fn(&TypeDescriptor) -> bool + Send + Sync>;

/// Maps (unstructured value, target descriptor) to a domain value.
///
/// The converter is passed in so hooks can recurse into nested values.
#[derive(Clone)]
pub struct StructureHook(Arc<StructureFn>);

impl StructureHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&Unstructured, &TypeDescriptor, &Converter) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub fn call(
        &self,
        raw: &Unstructured,
        descriptor: &TypeDescriptor,
        converter: &Converter,
    ) -> Result<Value> {
        (self.0)(raw, descriptor, converter)
    }

    /// Same underlying function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for StructureHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructureHook@{:p}", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Maps a domain value to an unstructured value. Never fails.
#[derive(Clone)]
pub struct UnstructureHook(Arc<UnstructureFn>);

impl UnstructureHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&Value, &Converter) -> Unstructured + Send + Sync + 'static,
    {
        Self(Arc::new(
            move |value: &Value, _: &TypeDescriptor, converter: &Converter| hook(value, converter),
        ))
    }

    /// Hook that also sees the descriptor it was resolved for.
    pub fn with_descriptor<F>(hook: F) -> Self
    where
        F: Fn(&Value, &TypeDescriptor, &Converter) -> Unstructured + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub fn call(
        &self,
        value: &Value,
        descriptor: &TypeDescriptor,
        converter: &Converter,
    ) -> Unstructured {
        (self.0)(value, descriptor, converter)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for UnstructureHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnstructureHook@{:p}", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Picks the union member a raw value should structure into.
#[derive(Clone)]
pub struct DisambiguationHook(Arc<DisambiguationFn>);

impl DisambiguationHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&Unstructured) -> Result<TypeDescriptor> + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub fn call(&self, raw: &Unstructured) -> Result<TypeDescriptor> {
        (self.0)(raw)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for DisambiguationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisambiguationHook@{:p}", Arc::as_ptr(&self.0) as *const ())
    }
}

/// A hook of either direction.
#[derive(Debug, Clone)]
pub enum Hook {
    Structure(StructureHook),
    Unstructure(UnstructureHook),
}

impl Hook {
    pub fn direction(&self) -> Direction {
        match self {
            Self::Structure(_) => Direction::Structure,
            Self::Unstructure(_) => Direction::Unstructure,
        }
    }

    pub fn as_structure(&self) -> Option<&StructureHook> {
        match self {
            Self::Structure(h) => Some(h),
            Self::Unstructure(_) => None,
        }
    }

    pub fn as_unstructure(&self) -> Option<&UnstructureHook> {
        match self {
            Self::Unstructure(h) => Some(h),
            Self::Structure(_) => None,
        }
    }
}

/// One direction's hook tables.
#[derive(Clone)]
pub(crate) struct HookTable<H> {
    user: HashMap<TypeDescriptor, H>,
    predicates: Vec<(Predicate, H)>,
    defaults: HashMap<TypeDescriptor, H>,
    families: HashMap<Shape, H>,
}

impl<H: Clone> HookTable<H> {
    fn new() -> Self {
        Self {
            user: HashMap::new(),
            predicates: Vec::new(),
            defaults: HashMap::new(),
            families: HashMap::new(),
        }
    }

    pub(crate) fn set_default(&mut self, descriptor: TypeDescriptor, hook: H) {
        self.defaults.insert(descriptor, hook);
    }

    pub(crate) fn set_family(&mut self, shape: Shape, hook: H) {
        self.families.insert(shape, hook);
    }

    fn lookup(&self, descriptor: &TypeDescriptor) -> Option<H> {
        if let Some(hook) = self.user.get(descriptor) {
            return Some(hook.clone());
        }
        if let Some((_, hook)) = self.predicates.iter().rev().find(|(p, _)| p(descriptor)) {
            return Some(hook.clone());
        }
        if let Some(hook) = self.defaults.get(descriptor) {
            return Some(hook.clone());
        }
        self.families.get(&descriptor.shape()).cloned()
    }
}

/// Table plus resolution cache for one direction.
struct Resolver<H> {
    direction: Direction,
    table: RwLock<HookTable<H>>,
    cache: Option<Mutex<LruCache<TypeDescriptor, H>>>,
}

impl<H: Clone> Resolver<H> {
    fn new(direction: Direction, table: HookTable<H>, cache_capacity: usize) -> Self {
        Self {
            direction,
            table: RwLock::new(table),
            cache: NonZeroUsize::new(cache_capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    fn resolve(&self, descriptor: &TypeDescriptor) -> Result<H> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.lock().get(descriptor) {
                return Ok(hit.clone());
            }
        }

        let table = self.table.read();
        let hook = table
            .lookup(descriptor)
            .ok_or_else(|| Error::no_hook_found(self.direction, descriptor))?;
        log::trace!(
            "[HookRegistry::resolve] {} cache miss for {}",
            self.direction,
            descriptor
        );
        if let Some(cache) = &self.cache {
            cache.lock().put(descriptor.clone(), hook.clone());
        }
        drop(table);
        Ok(hook)
    }

    fn modify(&self, f: impl FnOnce(&mut HookTable<H>)) {
        let mut table = self.table.write();
        f(&mut table);
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }

    fn snapshot(&self) -> HookTable<H> {
        self.table.read().clone()
    }

    fn cache_capacity(&self) -> usize {
        self.cache
            .as_ref()
            .map_or(0, |cache| cache.lock().cap().get())
    }
}

/// Structure and unstructure hook tables, plus union disambiguators.
pub struct HookRegistry {
    structure: Resolver<StructureHook>,
    unstructure: Resolver<UnstructureHook>,
    disambiguators: RwLock<HashMap<TypeDescriptor, DisambiguationHook>>,
    unique_fields: DashMap<TypeDescriptor, Arc<UniqueFieldIndex>>,
}

impl HookRegistry {
    /// Registry with no hooks at all; every resolution fails `NoHookFound`
    /// until something is registered.
    pub fn empty(cache_capacity: usize) -> Self {
        Self::from_tables(HookTable::new(), HookTable::new(), HashMap::new(), cache_capacity)
    }

    /// Registry pre-populated with the built-in rules.
    pub fn with_defaults(cache_capacity: usize) -> Self {
        let mut structure = HookTable::new();
        crate::structure::install_defaults(&mut structure);
        let mut unstructure = HookTable::new();
        crate::unstructure::install_defaults(&mut unstructure);
        Self::from_tables(structure, unstructure, HashMap::new(), cache_capacity)
    }

    fn from_tables(
        structure: HookTable<StructureHook>,
        unstructure: HookTable<UnstructureHook>,
        disambiguators: HashMap<TypeDescriptor, DisambiguationHook>,
        cache_capacity: usize,
    ) -> Self {
        Self {
            structure: Resolver::new(Direction::Structure, structure, cache_capacity),
            unstructure: Resolver::new(Direction::Unstructure, unstructure, cache_capacity),
            disambiguators: RwLock::new(disambiguators),
            unique_fields: DashMap::new(),
        }
    }

    /// Register a hook for an exact descriptor. Last write wins, including
    /// over built-in defaults.
    pub fn register(&self, descriptor: TypeDescriptor, hook: Hook) {
        match hook {
            Hook::Structure(h) => self.register_structure_hook(descriptor, h),
            Hook::Unstructure(h) => self.register_unstructure_hook(descriptor, h),
        }
    }

    /// Resolve the hook that applies to `descriptor` in `direction`.
    pub fn resolve(&self, direction: Direction, descriptor: &TypeDescriptor) -> Result<Hook> {
        match direction {
            Direction::Structure => self.resolve_structure(descriptor).map(Hook::Structure),
            Direction::Unstructure => self.resolve_unstructure(descriptor).map(Hook::Unstructure),
        }
    }

    pub fn register_structure_hook(&self, descriptor: TypeDescriptor, hook: StructureHook) {
        log::debug!("[HookRegistry::register] structure hook for {}", descriptor);
        self.structure.modify(|table| {
            table.user.insert(descriptor, hook);
        });
    }

    pub fn register_unstructure_hook(&self, descriptor: TypeDescriptor, hook: UnstructureHook) {
        log::debug!("[HookRegistry::register] unstructure hook for {}", descriptor);
        self.unstructure.modify(|table| {
            table.user.insert(descriptor, hook);
        });
    }

    /// Register a structure hook for every descriptor `predicate` accepts.
    pub fn register_structure_hook_fn<P>(&self, predicate: P, hook: StructureHook)
    where
        P: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        log::debug!("[HookRegistry::register] structure predicate hook");
        let predicate: Predicate = Arc::new(predicate);
        self.structure.modify(|table| table.predicates.push((predicate, hook)));
    }

    /// Register an unstructure hook for every descriptor `predicate` accepts.
    pub fn register_unstructure_hook_fn<P>(&self, predicate: P, hook: UnstructureHook)
    where
        P: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        log::debug!("[HookRegistry::register] unstructure predicate hook");
        let predicate: Predicate = Arc::new(predicate);
        self.unstructure.modify(|table| table.predicates.push((predicate, hook)));
    }

    /// Register a disambiguator for an exact `Union` descriptor.
    pub fn register_disambiguator(&self, union: TypeDescriptor, hook: DisambiguationHook) {
        log::debug!("[HookRegistry::register] disambiguator for {}", union);
        self.unique_fields.remove(&union);
        self.disambiguators.write().insert(union, hook);
    }

    pub fn resolve_structure(&self, descriptor: &TypeDescriptor) -> Result<StructureHook> {
        self.structure.resolve(descriptor)
    }

    pub fn resolve_unstructure(&self, descriptor: &TypeDescriptor) -> Result<UnstructureHook> {
        self.unstructure.resolve(descriptor)
    }

    pub fn disambiguator(&self, union: &TypeDescriptor) -> Option<DisambiguationHook> {
        self.disambiguators.read().get(union).cloned()
    }

    /// Unique-field index for a union of classes, memoized per descriptor.
    ///
    /// `None` if some member is not a defined class.
    pub(crate) fn unique_field_index(&self, union: &TypeDescriptor) -> Option<Arc<UniqueFieldIndex>> {
        if let Some(hit) = self.unique_fields.get(union) {
            return Some(Arc::clone(hit.value()));
        }
        let index = Arc::new(UniqueFieldIndex::build(union.union_members()?)?);
        self.unique_fields.insert(union.clone(), Arc::clone(&index));
        Some(index)
    }

    /// Independent registry holding the same hooks.
    pub fn snapshot(&self) -> Self {
        let capacity = self.structure.cache_capacity();
        Self::from_tables(
            self.structure.snapshot(),
            self.unstructure.snapshot(),
            self.disambiguators.read().clone(),
            capacity,
        )
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let structure = self.structure.table.read();
        let unstructure = self.unstructure.table.read();
        f.debug_struct("HookRegistry")
            .field("structure_user", &structure.user.len())
            .field("structure_predicates", &structure.predicates.len())
            .field("unstructure_user", &unstructure.user.len())
            .field("unstructure_predicates", &unstructure.predicates.len())
            .field("disambiguators", &self.disambiguators.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ScalarKind;

    fn constant(n: i64) -> StructureHook {
        StructureHook::new(move |_, _, _| Ok(Value::Int(n)))
    }

    #[test]
    fn test_empty_registry_has_no_hooks() {
        let registry = HookRegistry::empty(16);
        let err = registry
            .resolve(Direction::Structure, &TypeDescriptor::int())
            .unwrap_err();
        assert!(err.is_no_hook_found());
        assert!(registry
            .resolve(Direction::Unstructure, &TypeDescriptor::Opaque)
            .is_err());
    }

    #[test]
    fn test_user_hook_overrides_default() {
        let registry = HookRegistry::with_defaults(16);
        let default = registry.resolve_structure(&TypeDescriptor::int()).expect("default");

        let custom = constant(7);
        registry.register_structure_hook(TypeDescriptor::int(), custom.clone());
        let resolved = registry.resolve_structure(&TypeDescriptor::int()).expect("custom");
        assert!(resolved.ptr_eq(&custom));
        assert!(!resolved.ptr_eq(&default));
    }

    #[test]
    fn test_last_write_wins() {
        let registry = HookRegistry::empty(16);
        let first = constant(1);
        let second = constant(2);
        registry.register(TypeDescriptor::text(), Hook::Structure(first));
        registry.register(TypeDescriptor::text(), Hook::Structure(second.clone()));

        let resolved = registry
            .resolve(Direction::Structure, &TypeDescriptor::text())
            .expect("resolved");
        assert!(resolved.as_structure().map(|h| h.ptr_eq(&second)).unwrap_or(false));
    }

    #[test]
    fn test_cache_invalidated_by_registration() {
        let registry = HookRegistry::with_defaults(4);
        let d = TypeDescriptor::sequence(TypeDescriptor::int());
        let before = registry.resolve_structure(&d).expect("family rule");
        // Second resolution is served from cache.
        assert!(registry.resolve_structure(&d).expect("cached").ptr_eq(&before));

        let custom = constant(3);
        registry.register_structure_hook(d.clone(), custom.clone());
        assert!(registry.resolve_structure(&d).expect("custom").ptr_eq(&custom));
    }

    #[test]
    fn test_uncached_registry() {
        let registry = HookRegistry::with_defaults(0);
        let custom = constant(3);
        registry.register_structure_hook(TypeDescriptor::float(), custom.clone());
        assert!(registry
            .resolve_structure(&TypeDescriptor::float())
            .expect("custom")
            .ptr_eq(&custom));
    }

    #[test]
    fn test_predicate_order() {
        let registry = HookRegistry::with_defaults(16);
        let any_list = constant(1);
        let int_list = constant(2);
        registry.register_structure_hook_fn(
            |d| matches!(d, TypeDescriptor::Sequence(_)),
            any_list.clone(),
        );
        registry.register_structure_hook_fn(
            |d| *d == TypeDescriptor::sequence(TypeDescriptor::int()),
            int_list.clone(),
        );

        let ints = TypeDescriptor::sequence(TypeDescriptor::int());
        let texts = TypeDescriptor::sequence(TypeDescriptor::text());
        assert!(registry.resolve_structure(&ints).expect("int").ptr_eq(&int_list));
        assert!(registry.resolve_structure(&texts).expect("any").ptr_eq(&any_list));

        // Exact registrations still come first.
        let exact = constant(3);
        registry.register_structure_hook(texts.clone(), exact.clone());
        assert!(registry.resolve_structure(&texts).expect("exact").ptr_eq(&exact));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let registry = HookRegistry::with_defaults(16);
        let custom = constant(9);
        registry.register_structure_hook(TypeDescriptor::Scalar(ScalarKind::Bool), custom.clone());

        let copy = registry.snapshot();
        assert!(copy
            .resolve_structure(&TypeDescriptor::bool())
            .expect("copied")
            .ptr_eq(&custom));

        let later = constant(10);
        copy.register_structure_hook(TypeDescriptor::bool(), later.clone());
        assert!(registry
            .resolve_structure(&TypeDescriptor::bool())
            .expect("original")
            .ptr_eq(&custom));
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Structure.to_string(), "structure");
        assert_eq!(Hook::Structure(constant(0)).direction(), Direction::Structure);
    }
}
