// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion errors.
//!
//! Every failure is a structuring-time failure except `NoHookFound`, which a
//! bare registry can also report on resolution. Errors carry the path inside
//! the value tree where they were detected; each recursive step prefixes its
//! own segment while the error propagates upward.

use crate::registry::Direction;
use std::fmt;
use thiserror::Error as ThisError;

/// What went wrong, independent of where.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ErrorKind {
    /// Raw value's shape is incompatible with the expected descriptor.
    #[error("shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch {
        expected: String,
        found: &'static str,
    },

    /// Fixed-arity sequence length disagreement.
    #[error("arity mismatch: expected {expected} elements, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// Required class attribute absent from the raw mapping, with no default.
    #[error("missing attribute '{attribute}' for class {class}")]
    MissingAttribute { class: String, attribute: String },

    /// Scalar or constructor conversion rejected the raw value.
    #[error("cannot coerce to {target}: {reason}")]
    CoercionFailed { target: String, reason: String },

    /// No disambiguation hook and no single unique-field match.
    #[error("ambiguous union {union}: {reason}")]
    AmbiguousUnion { union: String, reason: String },

    /// Registry has no applicable rule.
    #[error("no {direction} hook for {descriptor}")]
    NoHookFound {
        direction: Direction,
        descriptor: String,
    },
}

/// One step into a value tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Class attribute.
    Field(String),
    /// Sequence, set or tuple position.
    Index(usize),
    /// Mapping key, rendered as text.
    Key(String),
}

/// Location of a failure, outermost segment first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuePath(Vec<PathSegment>);

impl ValuePath {
    /// Root path (`$`).
    pub fn root() -> Self {
        Self::default()
    }

    /// Segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    fn prepend(&mut self, segment: PathSegment) {
        self.0.insert(0, segment);
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(i) => write!(f, "[{}]", i)?,
                PathSegment::Key(key) => write!(f, "[{:?}]", key)?,
            }
        }
        Ok(())
    }
}

/// A conversion failure: kind plus location.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{kind} (at {path})")]
pub struct Error {
    kind: ErrorKind,
    path: ValuePath,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: ValuePath::root(),
        }
    }

    pub fn shape_mismatch(expected: impl fmt::Display, found: &'static str) -> Self {
        Self::new(ErrorKind::ShapeMismatch {
            expected: expected.to_string(),
            found,
        })
    }

    pub fn arity_mismatch(expected: usize, found: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch { expected, found })
    }

    pub fn missing_attribute(class: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingAttribute {
            class: class.into(),
            attribute: attribute.into(),
        })
    }

    pub fn coercion_failed(target: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::CoercionFailed {
            target: target.to_string(),
            reason: reason.into(),
        })
    }

    pub fn ambiguous_union(union: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::AmbiguousUnion {
            union: union.to_string(),
            reason: reason.into(),
        })
    }

    pub fn no_hook_found(direction: Direction, descriptor: impl fmt::Display) -> Self {
        Self::new(ErrorKind::NoHookFound {
            direction,
            descriptor: descriptor.to_string(),
        })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn path(&self) -> &ValuePath {
        &self.path
    }

    /// Prefix a path segment; used while unwinding out of a nested value.
    #[must_use]
    pub fn at(mut self, segment: PathSegment) -> Self {
        self.path.prepend(segment);
        self
    }

    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self.kind, ErrorKind::ShapeMismatch { .. })
    }

    pub fn is_arity_mismatch(&self) -> bool {
        matches!(self.kind, ErrorKind::ArityMismatch { .. })
    }

    pub fn is_missing_attribute(&self) -> bool {
        matches!(self.kind, ErrorKind::MissingAttribute { .. })
    }

    pub fn is_coercion_failed(&self) -> bool {
        matches!(self.kind, ErrorKind::CoercionFailed { .. })
    }

    pub fn is_ambiguous_union(&self) -> bool {
        matches!(self.kind, ErrorKind::AmbiguousUnion { .. })
    }

    pub fn is_no_hook_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NoHookFound { .. })
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Convenient alias for conversion results.
pub type Result<T> = core::result::Result<T, Error>;
