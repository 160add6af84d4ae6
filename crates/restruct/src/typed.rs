// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Statically typed Rust values as a descriptor source.
//!
//! A type implementing [`Structured`] declares its descriptor and converts
//! to and from the dynamic [`Value`] tree; the converter does everything in
//! between. Composite user types implement it by hand, usually with a
//! [`ClassBuilder`](crate::ClassBuilder)-built descriptor.

use crate::descriptor::{ScalarKind, TypeDescriptor};
use crate::error::{Error, PathSegment, Result};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A Rust type with a known descriptor.
pub trait Structured: Sized {
    /// Descriptor values of this type structure from.
    fn descriptor() -> TypeDescriptor;

    /// Convert a structured value produced for [`Self::descriptor`].
    fn from_value(value: Value) -> Result<Self>;

    fn to_value(&self) -> Value;
}

fn unexpected<T: Structured>(value: &Value) -> Error {
    Error::shape_mismatch(T::descriptor(), value.kind_name())
}

impl Structured for bool {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::bool()
    }

    fn from_value(value: Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| unexpected::<Self>(&value))
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! impl_structured_int {
    ($($t:ty),*) => {$(
        impl Structured for $t {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::Scalar(ScalarKind::Int)
            }

            fn from_value(value: Value) -> Result<Self> {
                let wide = value.as_i64().ok_or_else(|| unexpected::<Self>(&value))?;
                <$t>::try_from(wide).map_err(|_| {
                    Error::coercion_failed(stringify!($t), format!("{} out of range", wide))
                })
            }

            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }
    )*};
}

impl_structured_int!(i8, i16, i32, i64, u8, u16, u32);

impl Structured for f64 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::float()
    }

    fn from_value(value: Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| unexpected::<Self>(&value))
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl Structured for f32 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::float()
    }

    fn from_value(value: Value) -> Result<Self> {
        value
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| unexpected::<Self>(&value))
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl Structured for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::text()
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl<T: Structured> Structured for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::descriptor())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, Structured::to_value)
    }
}

fn collect_elements<T: Structured>(items: impl IntoIterator<Item = Value>) -> Result<Vec<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| T::from_value(item).map_err(|e| e.at(PathSegment::Index(i))))
        .collect()
}

impl<T: Structured> Structured for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::descriptor())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) | Value::Tuple(items) => collect_elements(items),
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Structured::to_value).collect())
    }
}

impl<T: Structured + Ord> Structured for BTreeSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::set(T::descriptor())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Set(items) | Value::FrozenSet(items) => {
                Ok(collect_elements::<T>(items)?.into_iter().collect())
            }
            other => Err(unexpected::<Self>(&other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(Structured::to_value).collect())
    }
}

impl<K: Structured + Ord, V: Structured> Structured for BTreeMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::mapping(K::descriptor(), V::descriptor())
    }

    fn from_value(value: Value) -> Result<Self> {
        let Value::Map(entries) = value else {
            return Err(unexpected::<Self>(&value));
        };
        entries
            .into_iter()
            .map(|(k, v)| {
                let label = match &k {
                    Value::Text(s) => s.clone(),
                    other => format!("{:?}", other),
                };
                let key = K::from_value(k).map_err(|e| e.at(PathSegment::Key(label.clone())))?;
                let value = V::from_value(v).map_err(|e| e.at(PathSegment::Key(label)))?;
                Ok((key, value))
            })
            .collect()
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }
}

/// Split a tuple value into exactly `arity` elements.
fn tuple_elements<T: Structured>(value: Value, arity: usize) -> Result<Vec<Value>> {
    match value {
        Value::Tuple(items) | Value::List(items) if items.len() == arity => Ok(items),
        Value::Tuple(items) | Value::List(items) => Err(Error::arity_mismatch(arity, items.len())),
        other => Err(unexpected::<T>(&other)),
    }
}

fn element<T: Structured>(items: &mut std::vec::IntoIter<Value>, index: usize) -> Result<T> {
    let item = items
        .next()
        .ok_or_else(|| Error::arity_mismatch(index + 1, index))?;
    T::from_value(item).map_err(|e| e.at(PathSegment::Index(index)))
}

impl<A: Structured, B: Structured> Structured for (A, B) {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::fixed_tuple(vec![A::descriptor(), B::descriptor()])
    }

    fn from_value(value: Value) -> Result<Self> {
        let mut items = tuple_elements::<Self>(value, 2)?.into_iter();
        Ok((element(&mut items, 0)?, element(&mut items, 1)?))
    }

    fn to_value(&self) -> Value {
        Value::Tuple(vec![self.0.to_value(), self.1.to_value()])
    }
}

impl<A: Structured, B: Structured, C: Structured> Structured for (A, B, C) {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::fixed_tuple(vec![A::descriptor(), B::descriptor(), C::descriptor()])
    }

    fn from_value(value: Value) -> Result<Self> {
        let mut items = tuple_elements::<Self>(value, 3)?.into_iter();
        Ok((
            element(&mut items, 0)?,
            element(&mut items, 1)?,
            element(&mut items, 2)?,
        ))
    }

    fn to_value(&self) -> Value {
        Value::Tuple(vec![self.0.to_value(), self.1.to_value(), self.2.to_value()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors() {
        assert_eq!(<Vec<Option<i32>>>::descriptor().to_string(), "List[Optional[int]]");
        assert_eq!(
            <(String, f64)>::descriptor(),
            TypeDescriptor::fixed_tuple(vec![TypeDescriptor::text(), TypeDescriptor::float()])
        );
    }

    #[test]
    fn test_int_range() {
        assert_eq!(u8::from_value(Value::Int(255)).expect("fits"), 255);
        let err = u8::from_value(Value::Int(256)).unwrap_err();
        assert!(err.is_coercion_failed());
        assert!(i32::from_value(Value::from("1")).unwrap_err().is_shape_mismatch());
    }

    #[test]
    fn test_nested_error_path() {
        let value = Value::List(vec![Value::Int(1), Value::from("x")]);
        let err = <Vec<i64>>::from_value(value).unwrap_err();
        assert_eq!(err.path().to_string(), "$[1]");
    }

    #[test]
    fn test_tuple_arity() {
        let err = <(i64, i64)>::from_value(Value::Tuple(vec![Value::Int(1)])).unwrap_err();
        assert!(err.is_arity_mismatch());
        let ok = <(i64, bool, String)>::from_value(Value::Tuple(vec![
            Value::Int(1),
            Value::Bool(false),
            Value::from("s"),
        ]))
        .expect("three");
        assert_eq!(ok, (1, false, "s".to_string()));
    }
}
