// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in unstructuring rules: domain value -> unstructured value.
//!
//! Rules never fail. A value whose shape does not fit the descriptor a rule
//! was resolved for is handed back to [`Converter::unstructure`], which keys
//! on the value's runtime shape instead.

use crate::converter::{Converter, UnstructureStrategy};
use crate::descriptor::{ScalarKind, Shape, TypeDescriptor};
use crate::registry::{HookTable, UnstructureHook};
use crate::value::{Foreign, Instance, Unstructured, Value};

/// Populate an unstructure table with the default rules.
pub(crate) fn install_defaults(table: &mut HookTable<UnstructureHook>) {
    for kind in ScalarKind::ALL {
        table.set_default(
            TypeDescriptor::Scalar(kind),
            UnstructureHook::new(unstructure_scalar),
        );
    }
    table.set_default(TypeDescriptor::Opaque, UnstructureHook::new(|v, _| passthrough(v)));

    table.set_family(Shape::Scalar, UnstructureHook::new(unstructure_scalar));
    table.set_family(Shape::Opaque, UnstructureHook::new(|v, _| passthrough(v)));
    table.set_family(Shape::Optional, UnstructureHook::with_descriptor(unstructure_optional));
    table.set_family(Shape::Sequence, UnstructureHook::with_descriptor(unstructure_sequence));
    table.set_family(Shape::VariableTuple, UnstructureHook::with_descriptor(unstructure_sequence));
    table.set_family(Shape::FixedTuple, UnstructureHook::with_descriptor(unstructure_fixed_tuple));
    table.set_family(Shape::Set, UnstructureHook::with_descriptor(unstructure_set));
    table.set_family(Shape::FrozenSet, UnstructureHook::with_descriptor(unstructure_set));
    table.set_family(Shape::Mapping, UnstructureHook::with_descriptor(unstructure_mapping));
    table.set_family(Shape::Union, UnstructureHook::new(|v, converter| converter.unstructure(v)));
    table.set_family(Shape::Enum, UnstructureHook::new(unstructure_enum));
    table.set_family(Shape::Class, UnstructureHook::new(unstructure_class));
}

/// Identity for scalars and null; anything else travels as a foreign value.
pub(crate) fn passthrough(value: &Value) -> Unstructured {
    match value {
        Value::Null => Unstructured::Null,
        Value::Bool(v) => Unstructured::Bool(*v),
        Value::Int(v) => Unstructured::Int(*v),
        Value::Float(v) => Unstructured::Float(*v),
        Value::Text(v) => Unstructured::Text(v.clone()),
        Value::Bytes(v) => Unstructured::Bytes(v.clone()),
        Value::Foreign(v) => Unstructured::Foreign(v.clone()),
        other => Unstructured::Foreign(Foreign::new(other.clone())),
    }
}

/// Scalars pass through; a container or instance declared as a scalar is
/// unstructured by its runtime shape.
fn unstructure_scalar(value: &Value, converter: &Converter) -> Unstructured {
    match value {
        Value::Null
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::Text(_)
        | Value::Bytes(_)
        | Value::Foreign(_) => passthrough(value),
        _ => converter.unstructure(value),
    }
}

static OPAQUE: TypeDescriptor = TypeDescriptor::Opaque;

/// Element descriptor of a homogeneous container descriptor.
fn element_descriptor(descriptor: &TypeDescriptor) -> &TypeDescriptor {
    match descriptor {
        TypeDescriptor::Sequence(inner)
        | TypeDescriptor::VariableTuple(inner)
        | TypeDescriptor::Set(inner)
        | TypeDescriptor::FrozenSet(inner) => inner,
        _ => &OPAQUE,
    }
}

fn unstructure_optional(
    value: &Value,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Unstructured {
    match (value, descriptor) {
        (Value::Null, _) => Unstructured::Null,
        (_, TypeDescriptor::Optional(inner)) => converter.unstructure_as(value, inner),
        _ => converter.unstructure(value),
    }
}

fn unstructure_sequence(
    value: &Value,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Unstructured {
    let Some(items) = value.as_sequence() else {
        return converter.unstructure(value);
    };
    let inner = element_descriptor(descriptor);
    Unstructured::Seq(items.iter().map(|item| converter.unstructure_as(item, inner)).collect())
}

fn unstructure_fixed_tuple(
    value: &Value,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Unstructured {
    let (Some(items), TypeDescriptor::FixedTuple(members)) = (value.as_sequence(), descriptor)
    else {
        return converter.unstructure(value);
    };
    Unstructured::Seq(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| match members.get(i) {
                Some(member) => converter.unstructure_as(item, member),
                None => converter.unstructure(item),
            })
            .collect(),
    )
}

fn unstructure_set(
    value: &Value,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Unstructured {
    let Some(items) = value.as_set() else {
        return converter.unstructure(value);
    };
    let inner = element_descriptor(descriptor);
    Unstructured::Set(items.iter().map(|item| converter.unstructure_as(item, inner)).collect())
}

fn unstructure_mapping(
    value: &Value,
    descriptor: &TypeDescriptor,
    converter: &Converter,
) -> Unstructured {
    let Some(entries) = value.as_map() else {
        return converter.unstructure(value);
    };
    let (key_desc, value_desc) = match descriptor {
        TypeDescriptor::Mapping(k, v) => (k.as_ref(), v.as_ref()),
        _ => (&OPAQUE, &OPAQUE),
    };
    Unstructured::Map(
        entries
            .iter()
            .map(|(k, v)| {
                (
                    converter.unstructure_as(k, key_desc),
                    converter.unstructure_as(v, value_desc),
                )
            })
            .collect(),
    )
}

fn unstructure_enum(value: &Value, converter: &Converter) -> Unstructured {
    match value {
        Value::Enum(member) => member.value().clone(),
        other => converter.unstructure(other),
    }
}

fn unstructure_class(value: &Value, converter: &Converter) -> Unstructured {
    let Value::Instance(instance) = value else {
        return converter.unstructure(value);
    };
    match converter.config().unstructure_strategy {
        UnstructureStrategy::AsDict => class_as_dict(instance, converter),
        UnstructureStrategy::AsTuple => class_as_tuple(instance, converter),
    }
}

fn class_as_dict(instance: &Instance, converter: &Converter) -> Unstructured {
    let spec = instance.class().spec();
    Unstructured::Map(
        instance
            .fields()
            .map(|(name, field)| {
                // Attributes without a declaration use the runtime shape.
                let unstructured = match spec.and_then(|s| s.attribute(name)) {
                    Some(attribute) => converter.unstructure_as(field, &attribute.descriptor),
                    None => converter.unstructure(field),
                };
                (Unstructured::Text(name.to_string()), unstructured)
            })
            .collect(),
    )
}

fn class_as_tuple(instance: &Instance, converter: &Converter) -> Unstructured {
    let Some(spec) = instance.class().spec() else {
        let fields = instance.fields().map(|(_, v)| converter.unstructure(v));
        return Unstructured::Seq(fields.collect());
    };
    Unstructured::Seq(
        spec.attributes()
            .iter()
            .map(|attribute| match instance.get(&attribute.name) {
                Some(field) => converter.unstructure_as(field, &attribute.descriptor),
                None => Unstructured::Null,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ClassBuilder, EnumBuilder};
    use crate::value::EnumMember;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Arc;

    #[test]
    fn test_passthrough() {
        assert_eq!(passthrough(&Value::Int(3)), Unstructured::Int(3));
        assert_eq!(passthrough(&Value::Null), Unstructured::Null);

        let handle = Foreign::new(17u8);
        assert_eq!(passthrough(&Value::Foreign(handle.clone())), Unstructured::Foreign(handle));

        let wrapped = passthrough(&Value::List(vec![Value::Int(1)]));
        let Unstructured::Foreign(f) = wrapped else {
            panic!("expected foreign, got {:?}", wrapped);
        };
        assert_eq!(f.downcast_ref::<Value>(), Some(&Value::List(vec![Value::Int(1)])));
    }

    #[test]
    fn test_containers_keep_their_kind() {
        let converter = Converter::new();
        let set: BTreeSet<Value> = [Value::Int(2), Value::Int(1)].into_iter().collect();
        assert_eq!(converter.unstructure(&Value::Set(set)), Unstructured::set([1i64, 2]));
        assert_eq!(
            converter.unstructure(&Value::Tuple(vec![Value::Int(1), Value::from("a")])),
            Unstructured::seq([Unstructured::Int(1), Unstructured::from("a")])
        );

        let mut map = BTreeMap::new();
        map.insert(Value::from("k"), Value::List(vec![Value::Bool(true)]));
        assert_eq!(
            converter.unstructure(&Value::Map(map)),
            Unstructured::map([("k", Unstructured::seq([true]))])
        );
    }

    #[test]
    fn test_enum_member_unstructures_to_value() {
        let converter = Converter::new();
        let color = Arc::new(EnumBuilder::new("Color").variant("RED").variant_value("BLUE", 7).build());
        let blue = EnumMember::by_name(&color, "BLUE").expect("BLUE");
        assert_eq!(converter.unstructure(&Value::Enum(blue)), Unstructured::Int(7));
    }

    #[test]
    fn test_class_as_dict_and_tuple() {
        let pair = ClassBuilder::new("Pair")
            .field("a", ScalarKind::Int)
            .field("b", ScalarKind::Text)
            .build();
        let value = Value::Instance(Instance::new(&pair).with("a", 1i64).with("b", "a"));

        let as_dict = Converter::new().unstructure(&value);
        assert_eq!(as_dict, Unstructured::map([("a", Unstructured::Int(1)), ("b", Unstructured::from("a"))]));

        let as_tuple = Converter::builder()
            .strategy(UnstructureStrategy::AsTuple)
            .build()
            .unstructure(&value);
        assert_eq!(as_tuple, Unstructured::seq([Unstructured::Int(1), Unstructured::from("a")]));
    }

    #[test]
    fn test_optional_declared_descriptor() {
        let converter = Converter::new();
        let declared = TypeDescriptor::optional(TypeDescriptor::sequence(TypeDescriptor::int()));
        assert_eq!(converter.unstructure_as(&Value::Null, &declared), Unstructured::Null);
        assert_eq!(
            converter.unstructure_as(&Value::List(vec![Value::Int(4)]), &declared),
            Unstructured::seq([4i64])
        );
    }

    #[test]
    fn test_declared_shape_mismatch_uses_runtime_shape() {
        let converter = Converter::new();
        let declared = TypeDescriptor::sequence(TypeDescriptor::int());
        assert_eq!(converter.unstructure_as(&Value::from("x"), &declared), Unstructured::from("x"));

        let inner = ClassBuilder::new("Inner").field("k", ScalarKind::Int).build();
        let outer = ClassBuilder::new("Outer").field("n", ScalarKind::Int).build();
        let value = Value::Instance(
            Instance::new(&outer).with("n", Value::Instance(Instance::new(&inner).with("k", 2i64))),
        );
        assert_eq!(
            converter.unstructure(&value),
            Unstructured::map([("n", Unstructured::map([("k", 2i64)]))])
        );
        assert_eq!(
            converter.unstructure_as(&Value::List(vec![Value::Int(1)]), &TypeDescriptor::int()),
            Unstructured::seq([1i64])
        );
    }
}
