// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Unstructured values: the shapes interchange formats agree on.

use crate::value::{cmp_f64, Foreign};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

/// A value a data interchange format can produce or consume.
///
/// Closed set: null, scalars, sequences, mappings, sets, and a `Foreign`
/// passthrough for values the engine does not understand. Floats compare by
/// total order so every variant can live in a set or key a mapping.
#[derive(Debug, Clone)]
pub enum Unstructured {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Seq(Vec<Unstructured>),
    Map(BTreeMap<Unstructured, Unstructured>),
    Set(BTreeSet<Unstructured>),
    Foreign(Foreign),
}

impl Unstructured {
    /// Build a sequence.
    pub fn seq<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Unstructured>,
    {
        Self::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Build a set; equal elements collapse.
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Unstructured>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Build a mapping; a repeated key keeps the last value.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Unstructured>,
        V: Into<Unstructured>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
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
            Self::Seq(_) => "sequence",
            Self::Map(_) => "mapping",
            Self::Set(_) => "set",
            Self::Foreign(_) => "foreign",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Text(_) | Self::Bytes(_)
        )
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Unstructured]> {
        match self {
            Self::Seq(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Unstructured, Unstructured>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<Unstructured>> {
        match self {
            Self::Set(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a text key in a mapping.
    pub fn get(&self, key: &str) -> Option<&Unstructured> {
        self.as_map()?.get(&Unstructured::Text(key.to_string()))
    }

    /// Equality where an int and a float of the same magnitude match.
    pub fn numeric_eq(&self, other: &Unstructured) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            _ => self == other,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Float(_) => 3,
            Self::Text(_) => 4,
            Self::Bytes(_) => 5,
            Self::Seq(_) => 6,
            Self::Map(_) => 7,
            Self::Set(_) => 8,
            Self::Foreign(_) => 9,
        }
    }
}

impl PartialEq for Unstructured {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Unstructured {}

impl PartialOrd for Unstructured {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Unstructured {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => cmp_f64(*a, *b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::Seq(a), Self::Seq(b)) => a.cmp(b),
            (Self::Map(a), Self::Map(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) => a.cmp(b),
            (Self::Foreign(a), Self::Foreign(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Unstructured {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Text(v) => v.hash(state),
            Self::Bytes(v) => v.hash(state),
            Self::Seq(v) => v.hash(state),
            Self::Map(v) => v.hash(state),
            Self::Set(v) => v.hash(state),
            Self::Foreign(v) => v.hash(state),
        }
    }
}

impl From<bool> for Unstructured {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Unstructured {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Unstructured {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Unstructured {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Unstructured {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Unstructured {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Unstructured {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<&[u8]> for Unstructured {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<Foreign> for Unstructured {
    fn from(v: Foreign) -> Self {
        Self::Foreign(v)
    }
}

impl<T: Into<Unstructured>> From<Option<T>> for Unstructured {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Unstructured>> From<Vec<T>> for Unstructured {
    fn from(v: Vec<T>) -> Self {
        Self::seq(v)
    }
}
