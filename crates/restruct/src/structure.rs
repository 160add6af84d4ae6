// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in structuring rules: unstructured value + descriptor -> domain value.
//!
//! Each rule recurses through [`Converter::structure`], so user hooks apply
//! at every nesting level. A failure anywhere aborts the whole call; the
//! error collects its path while propagating.

use crate::converter::{Converter, UnstructureStrategy};
use crate::descriptor::{AttributeSpec, ClassRef, ScalarKind, Shape, TypeDescriptor};
use crate::disambiguate::disambiguate;
use crate::error::{Error, PathSegment, Result};
use crate::registry::{Direction, HookTable, StructureHook};
use crate::value::{EnumMember, Instance, Unstructured, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Populate a structure table with the default rules.
pub(crate) fn install_defaults(table: &mut HookTable<StructureHook>) {
    for kind in ScalarKind::ALL {
        table.set_default(
            TypeDescriptor::Scalar(kind),
            StructureHook::new(move |raw, _, _| coerce_scalar(raw, kind)),
        );
    }
    table.set_default(TypeDescriptor::Opaque, StructureHook::new(structure_opaque));

    table.set_family(Shape::Scalar, StructureHook::new(structure_scalar));
    table.set_family(Shape::Opaque, StructureHook::new(structure_opaque));
    table.set_family(Shape::Optional, StructureHook::new(structure_optional));
    table.set_family(Shape::Sequence, StructureHook::new(structure_sequence));
    table.set_family(Shape::VariableTuple, StructureHook::new(structure_sequence));
    table.set_family(Shape::Set, StructureHook::new(structure_set));
    table.set_family(Shape::FrozenSet, StructureHook::new(structure_set));
    table.set_family(Shape::Mapping, StructureHook::new(structure_mapping));
    table.set_family(Shape::FixedTuple, StructureHook::new(structure_fixed_tuple));
    table.set_family(Shape::Union, StructureHook::new(structure_union));
    table.set_family(Shape::Enum, StructureHook::new(structure_enum));
    table.set_family(Shape::Class, StructureHook::new(structure_class));
}

/// A family rule invoked for a descriptor of another shape.
fn misrouted(descriptor: &TypeDescriptor) -> Error {
    Error::no_hook_found(Direction::Structure, descriptor)
}

/// Mapping key rendered for error paths.
fn key_label(key: &Unstructured) -> String {
    match key {
        Unstructured::Text(s) => s.clone(),
        Unstructured::Int(i) => i.to_string(),
        other => format!("{:?}", other),
    }
}

fn structure_opaque(raw: &Unstructured, _: &TypeDescriptor, _: &Converter) -> Result<Value> {
    Ok(Value::from_unstructured(raw))
}

fn structure_scalar(
    raw: &Unstructured,
    descriptor: &TypeDescriptor,
    _: &Converter,
) -> Result<Value> {
    match descriptor {
        TypeDescriptor::Scalar(kind) => coerce_scalar(raw, *kind),
        other => Err(misrouted(other)),
    }
}

fn parse_int(text: &str, target: ScalarKind) -> Result<Value> {
    text.trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|e| Error::coercion_failed(target, format!("{:?}: {}", text, e)))
}

fn parse_float(text: &str, target: ScalarKind) -> Result<Value> {
    text.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|e| Error::coercion_failed(target, format!("{:?}: {}", text, e)))
}

fn utf8(bytes: &[u8], target: ScalarKind) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::coercion_failed(target, e.to_string()))
}

/// Shortest round-trip rendering of a float in Python's `str(float)` form:
/// positional for decimal exponents in `-4..16`, otherwise `1.5e+16`.
fn render_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        let text = if f > 0.0 { "inf" } else { "-inf" };
        return text.to_string();
    }

    let scientific = format!("{:e}", f);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let body = if (-4..16).contains(&exponent) {
        if exponent < 0 {
            format!("0.{}{}", "0".repeat((-exponent - 1) as usize), digits)
        } else {
            let point = exponent as usize + 1;
            if digits.len() <= point {
                format!("{}{}.0", digits, "0".repeat(point - digits.len()))
            } else {
                format!("{}.{}", &digits[..point], &digits[point..])
            }
        }
    } else {
        let (lead, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() { String::new() } else { format!(".{}", rest) };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!("{}{}e{}{:02}", lead, fraction, exp_sign, exponent.abs())
    };
    format!("{}{}", sign, body)
}

// i64::MIN as f64 is exact; i64::MAX as f64 rounds up to 2^63.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER_EXCLUSIVE: f64 = 9_223_372_036_854_775_808.0;

/// Apply the scalar kind's constructor to a raw scalar.
///
/// A raw value already of the target kind is returned unchanged.
pub fn coerce_scalar(raw: &Unstructured, kind: ScalarKind) -> Result<Value> {
    use Unstructured as U;

    match (kind, raw) {
        (_, U::Null | U::Seq(_) | U::Map(_) | U::Set(_) | U::Foreign(_)) => {
            Err(Error::shape_mismatch(kind, raw.kind_name()))
        }

        (ScalarKind::Bool, U::Bool(b)) => Ok(Value::Bool(*b)),
        (ScalarKind::Bool, U::Int(i)) => Ok(Value::Bool(*i != 0)),
        (ScalarKind::Bool, U::Float(f)) => Ok(Value::Bool(*f != 0.0)),
        (ScalarKind::Bool, U::Text(s)) => Ok(Value::Bool(!s.is_empty())),
        (ScalarKind::Bool, U::Bytes(b)) => Ok(Value::Bool(!b.is_empty())),

        (ScalarKind::Int, U::Int(i)) => Ok(Value::Int(*i)),
        (ScalarKind::Int, U::Bool(b)) => Ok(Value::Int(i64::from(*b))),
        (ScalarKind::Int, U::Float(f)) => {
            if !f.is_finite() {
                return Err(Error::coercion_failed(kind, format!("{} is not finite", f)));
            }
            let truncated = f.trunc();
            if !(I64_LOWER..I64_UPPER_EXCLUSIVE).contains(&truncated) {
                return Err(Error::coercion_failed(kind, format!("{} out of range", f)));
            }
            Ok(Value::Int(truncated as i64))
        }
        (ScalarKind::Int, U::Text(s)) => parse_int(s, kind),
        (ScalarKind::Int, U::Bytes(b)) => parse_int(utf8(b, kind)?, kind),

        (ScalarKind::Float, U::Float(f)) => Ok(Value::Float(*f)),
        (ScalarKind::Float, U::Int(i)) => Ok(Value::Float(*i as f64)),
        (ScalarKind::Float, U::Bool(b)) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        (ScalarKind::Float, U::Text(s)) => parse_float(s, kind),
        (ScalarKind::Float, U::Bytes(b)) => parse_float(utf8(b, kind)?, kind),

        (ScalarKind::Text, U::Text(s)) => Ok(Value::Text(s.clone())),
        (ScalarKind::Text, U::Int(i)) => Ok(Value::Text(i.to_string())),
        (ScalarKind::Text, U::Float(f)) => Ok(Value::Text(render_float(*f))),
        (ScalarKind::Text, U::Bool(true)) => Ok(Value::from("True")),
        (ScalarKind::Text, U::Bool(false)) => Ok(Value::from("False")),
        (ScalarKind::Text, U::Bytes(b)) => utf8(b, kind).map(|s| Value::Text(s.to_string())),

        (ScalarKind::Bytes, U::Bytes(b)) => Ok(Value::Bytes(b.clone())),
        (ScalarKind::Bytes, U::Text(s)) => Ok(Value::Bytes(s.as_bytes().to_vec())),
        (ScalarKind::Bytes, U::Int(_) | U::Float(_) | U::Bool(_)) => Err(Error::coercion_failed(
            kind,
            format!("no byte encoding for {}", raw.kind_name()),
        )),
    }
}

fn structure_optional(
    raw: &Unstructured,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Result<Value> {
    let TypeDescriptor::Optional(inner) = descriptor else {
        return Err(misrouted(descriptor));
    };
    if raw.is_null() {
        return Ok(Value::Null);
    }
    converter.structure(raw, inner)
}

/// Elements of an iterable raw value, or a shape mismatch.
fn elements<'a>(
    raw: &'a Unstructured,
    descriptor: &TypeDescriptor,
) -> Result<Box<dyn Iterator<Item = &'a Unstructured> + 'a>> {
    match raw {
        Unstructured::Seq(items) => Ok(Box::new(items.iter())),
        Unstructured::Set(items) => Ok(Box::new(items.iter())),
        other => Err(Error::shape_mismatch(descriptor, other.kind_name())),
    }
}

fn structure_elements(
    raw: &Unstructured,
    descriptor: &TypeDescriptor,
    inner: &TypeDescriptor,
    converter: &Converter,
) -> Result<Vec<Value>> {
    elements(raw, descriptor)?
        .enumerate()
        .map(|(i, item)| {
            converter
                .structure(item, inner)
                .map_err(|e| e.at(PathSegment::Index(i)))
        })
        .collect()
}

fn structure_sequence(
    raw: &Unstructured,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Result<Value> {
    match descriptor {
        TypeDescriptor::Sequence(inner) => {
            structure_elements(raw, descriptor, inner, converter).map(Value::List)
        }
        TypeDescriptor::VariableTuple(inner) => {
            structure_elements(raw, descriptor, inner, converter).map(Value::Tuple)
        }
        other => Err(misrouted(other)),
    }
}

fn structure_set(
    raw: &Unstructured,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Result<Value> {
    let collect = |inner: &TypeDescriptor| -> Result<BTreeSet<Value>> {
        Ok(structure_elements(raw, descriptor, inner, converter)?
            .into_iter()
            .collect())
    };
    match descriptor {
        TypeDescriptor::Set(inner) => collect(inner).map(Value::Set),
        TypeDescriptor::FrozenSet(inner) => collect(inner).map(Value::FrozenSet),
        other => Err(misrouted(other)),
    }
}

fn structure_mapping(
    raw: &Unstructured,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Result<Value> {
    let TypeDescriptor::Mapping(key_desc, value_desc) = descriptor else {
        return Err(misrouted(descriptor));
    };
    let Unstructured::Map(entries) = raw else {
        return Err(Error::shape_mismatch(descriptor, raw.kind_name()));
    };

    let mut out = BTreeMap::new();
    for (k, v) in entries {
        let at = || PathSegment::Key(key_label(k));
        let key = converter.structure(k, key_desc).map_err(|e| e.at(at()))?;
        let value = converter.structure(v, value_desc).map_err(|e| e.at(at()))?;
        out.insert(key, value);
    }
    Ok(Value::Map(out))
}

fn structure_fixed_tuple(
    raw: &Unstructured,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Result<Value> {
    let TypeDescriptor::FixedTuple(members) = descriptor else {
        return Err(misrouted(descriptor));
    };
    let Unstructured::Seq(items) = raw else {
        return Err(Error::shape_mismatch(descriptor, raw.kind_name()));
    };
    if items.len() != members.len() {
        return Err(Error::arity_mismatch(members.len(), items.len()));
    }

    items
        .iter()
        .zip(members.iter())
        .enumerate()
        .map(|(i, (item, member))| {
            converter
                .structure(item, member)
                .map_err(|e| e.at(PathSegment::Index(i)))
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Tuple)
}

fn structure_union(
    raw: &Unstructured,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Result<Value> {
    let TypeDescriptor::Union(members) = descriptor else {
        return Err(misrouted(descriptor));
    };
    let chosen = disambiguate(descriptor, members, raw, converter)?;
    converter.structure(raw, &chosen)
}

fn structure_enum(raw: &Unstructured, descriptor: &TypeDescriptor, _: &Converter) -> Result<Value> {
    let TypeDescriptor::Enum(e) = descriptor else {
        return Err(misrouted(descriptor));
    };
    if !raw.is_scalar() {
        return Err(Error::shape_mismatch(descriptor, raw.kind_name()));
    }
    EnumMember::by_value(e, raw)
        .map(Value::Enum)
        .ok_or_else(|| {
            Error::coercion_failed(descriptor, format!("{:?} is not a member value", raw))
        })
}

fn structure_attribute(
    attribute: &AttributeSpec,
    raw: Option<&Unstructured>,
    class: &ClassRef,
    converter: &Converter,
) -> Result<Value> {
    match raw {
        Some(raw) if attribute.descriptor.is_opaque() => Ok(Value::from_unstructured(raw)),
        Some(raw) => converter
            .structure(raw, &attribute.descriptor)
            .map_err(|e| e.at(PathSegment::Field(attribute.name.clone()))),
        None => match &attribute.default {
            Some(default) => Ok(default.clone()),
            None if attribute.required => {
                Err(Error::missing_attribute(class.name(), &attribute.name))
            }
            None => Ok(Value::Null),
        },
    }
}

fn structure_class(
    raw: &Unstructured,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Result<Value> {
    let TypeDescriptor::Class(class) = descriptor else {
        return Err(misrouted(descriptor));
    };
    let spec = class.require_spec()?;
    let mut instance = Instance::new(class);

    match raw {
        Unstructured::Map(entries) => {
            // Keys not declared by the class are ignored.
            for attribute in spec.attributes() {
                let key = Unstructured::Text(attribute.name.clone());
                let value = structure_attribute(attribute, entries.get(&key), class, converter)?;
                instance.set(attribute.name.clone(), value);
            }
        }
        Unstructured::Seq(items)
            if converter.config().unstructure_strategy == UnstructureStrategy::AsTuple =>
        {
            if items.len() > spec.len() {
                return Err(Error::arity_mismatch(spec.len(), items.len()));
            }
            for (i, attribute) in spec.attributes().iter().enumerate() {
                let value = structure_attribute(attribute, items.get(i), class, converter)?;
                instance.set(attribute.name.clone(), value);
            }
        }
        other => return Err(Error::shape_mismatch(descriptor, other.kind_name())),
    }

    spec.construct(instance).map_err(|e| {
        if e.is_coercion_failed() {
            e
        } else {
            Error::coercion_failed(class.name(), e.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(raw: impl Into<Unstructured>, kind: ScalarKind) -> Value {
        coerce_scalar(&raw.into(), kind).expect("coercion")
    }

    fn err(raw: impl Into<Unstructured>, kind: ScalarKind) -> Error {
        coerce_scalar(&raw.into(), kind).unwrap_err()
    }

    #[test]
    fn test_identity_coercion() {
        assert_eq!(ok(5i64, ScalarKind::Int), Value::Int(5));
        assert_eq!(ok("x", ScalarKind::Text), Value::from("x"));
        assert_eq!(
            ok(Unstructured::bytes(b"ab".to_vec()), ScalarKind::Bytes),
            Value::Bytes(b"ab".to_vec())
        );
    }

    #[test]
    fn test_int_coercion() {
        assert_eq!(ok(2.9, ScalarKind::Int), Value::Int(2));
        assert_eq!(ok(-2.9, ScalarKind::Int), Value::Int(-2));
        assert_eq!(ok(" 42 ", ScalarKind::Int), Value::Int(42));
        assert_eq!(ok(true, ScalarKind::Int), Value::Int(1));

        assert!(err("4.5", ScalarKind::Int).is_coercion_failed());
        assert!(err("abc", ScalarKind::Int).is_coercion_failed());
        assert!(err(f64::NAN, ScalarKind::Int).is_coercion_failed());
        assert!(err(1e300, ScalarKind::Int).is_coercion_failed());
    }

    #[test]
    fn test_float_and_text_coercion() {
        assert_eq!(ok(3i64, ScalarKind::Float), Value::Float(3.0));
        assert_eq!(ok("2.5", ScalarKind::Float), Value::Float(2.5));
        assert_eq!(ok(1.0, ScalarKind::Text), Value::from("1.0"));
        assert_eq!(ok(-7i64, ScalarKind::Text), Value::from("-7"));
        assert_eq!(ok(true, ScalarKind::Text), Value::from("True"));
        assert!(err(Unstructured::bytes(vec![0xff, 0xfe]), ScalarKind::Text).is_coercion_failed());
    }

    #[test]
    fn test_bool_and_bytes_coercion() {
        assert_eq!(ok(0i64, ScalarKind::Bool), Value::Bool(false));
        assert_eq!(ok("no", ScalarKind::Bool), Value::Bool(true));
        assert_eq!(ok("hi", ScalarKind::Bytes), Value::Bytes(b"hi".to_vec()));
        assert!(err(1i64, ScalarKind::Bytes).is_coercion_failed());
    }

    #[test]
    fn test_containers_are_not_scalars() {
        assert!(err(Unstructured::map([("a", 1i64)]), ScalarKind::Int).is_shape_mismatch());
        assert!(err(Unstructured::Null, ScalarKind::Text).is_shape_mismatch());
    }

    #[test]
    fn test_render_float() {
        assert_eq!(render_float(2.5), "2.5");
        assert_eq!(render_float(123.456), "123.456");
        assert_eq!(render_float(-0.0), "-0.0");
        assert_eq!(render_float(1e15), "1000000000000000.0");
        assert_eq!(render_float(1e16), "1e+16");
        assert_eq!(render_float(1.5e-7), "1.5e-07");
        assert_eq!(render_float(0.0001), "0.0001");
        assert_eq!(render_float(0.1), "0.1");
        assert_eq!(render_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_key_label() {
        assert_eq!(key_label(&Unstructured::from("k")), "k");
        assert_eq!(key_label(&Unstructured::Int(3)), "3");
    }
}
