// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # restruct - type-directed structuring and unstructuring
//!
//! Converts between **structured domain values** (class instances, enum
//! members, typed containers) and **unstructured values** (the scalars,
//! sequences, mappings and sets that interchange formats produce and
//! consume). Conversion is recursive and driven by [`TypeDescriptor`]s; every
//! step goes through a [`HookRegistry`] that callers can override per
//! descriptor.
//!
//! ## Quick Start
//!
//! ```rust
//! use restruct::{ClassBuilder, Converter, ScalarKind, TypeDescriptor, Unstructured};
//!
//! let pet = ClassBuilder::new("Pet")
//!     .field("name", ScalarKind::Text)
//!     .field("age", ScalarKind::Int)
//!     .build_descriptor();
//! let pets = TypeDescriptor::sequence(pet);
//!
//! let converter = Converter::new();
//! let raw = Unstructured::seq([Unstructured::map([
//!     ("name", Unstructured::from("Rex")),
//!     ("age", Unstructured::from("3")),
//! ])]);
//!
//! let value = converter.structure(&raw, &pets)?;
//! let first = value.as_sequence().and_then(|pets| pets.first());
//! assert_eq!(first.and_then(|p| p.get_field("age")).and_then(|v| v.as_i64()), Some(3));
//! # Ok::<(), restruct::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                       Converter                             |
//! |   structure(raw, descriptor)      unstructure(value)        |
//! +-------------------------------------------------------------+
//! |                      HookRegistry                           |
//! |   user exact -> user predicates -> defaults -> shape family |
//! |   LRU cache of resolved hooks | union disambiguators        |
//! +-------------------------------------------------------------+
//! |   Structure rules   |  Unstructure rules  |  Disambiguation |
//! +-------------------------------------------------------------+
//! |   TypeDescriptor    |   Value / Unstructured trees          |
//! +-------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Converter`] | Registry plus engines; entry point |
//! | [`TypeDescriptor`] | Expected shape of a structured value |
//! | [`Value`] | Structured domain value |
//! | [`Unstructured`] | Interchange-format value |
//! | [`Error`] | Failure kind plus the path where it happened |
//!
//! ## Features
//!
//! - `serde` - `Serialize`/`Deserialize` for [`ConverterConfig`]
//! - `json` - `Unstructured::from_json` / `Unstructured::to_json`

/// Type descriptors, class and enum declarations, builders.
pub mod descriptor;
/// Union member selection by unique fields.
pub mod disambiguate;
/// Error kinds and value paths.
pub mod error;
/// Hook registry and hook types.
pub mod registry;
/// Statically typed values.
pub mod typed;
/// Domain and unstructured value trees.
pub mod value;

mod converter;
#[cfg(feature = "json")]
mod json;
mod structure;
mod unstructure;

pub use converter::{
    global, Converter, ConverterBuilder, ConverterConfig, UnstructureStrategy,
    DEFAULT_HOOK_CACHE_CAPACITY,
};
pub use descriptor::{
    AttributeSpec, ClassBuilder, ClassRef, ClassSpec, EnumBuilder, EnumDescriptor, ScalarKind,
    Shape, TypeDescriptor,
};
pub use error::{Error, ErrorKind, PathSegment, Result, ValuePath};
pub use registry::{Direction, DisambiguationHook, Hook, HookRegistry, StructureHook, UnstructureHook};
pub use structure::coerce_scalar;
pub use typed::Structured;
pub use value::{EnumMember, Foreign, Instance, Unstructured, Value};

/// Structure with the process-wide default converter.
pub fn structure(raw: &Unstructured, target: &TypeDescriptor) -> Result<Value> {
    global().structure(raw, target)
}

/// Unstructure with the process-wide default converter.
pub fn unstructure(value: &Value) -> Unstructured {
    global().unstructure(value)
}
