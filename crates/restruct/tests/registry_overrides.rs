// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test readability over pedantic

//! Hook registry integration tests
//!
//! Override precedence, predicate hooks, nested application of user hooks,
//! and registration racing with conversions.

use restruct::{
    ClassBuilder, Converter, Direction, Error, Hook, HookRegistry, ScalarKind, StructureHook,
    TypeDescriptor, UnstructureHook, Unstructured, Value,
};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_override_precedence() {
    let registry = HookRegistry::with_defaults(32);
    let d = TypeDescriptor::int();
    let h = StructureHook::new(|_, _, _| Ok(Value::Int(-1)));

    registry.register(d.clone(), Hook::Structure(h.clone()));
    let resolved = registry.resolve(Direction::Structure, &d).expect("resolved");
    assert!(resolved.as_structure().is_some_and(|r| r.ptr_eq(&h)));
}

#[test]
fn test_user_hook_applies_at_every_depth() {
    let converter = Converter::new();
    // Text trimmed and upper-cased wherever a str is expected.
    converter.register_structure_hook(
        TypeDescriptor::text(),
        StructureHook::new(|raw, _, _| match raw.as_str() {
            Some(s) => Ok(Value::Text(s.trim().to_uppercase())),
            None => Err(Error::shape_mismatch("str", raw.kind_name())),
        }),
    );

    let tag = ClassBuilder::new("Tag")
        .field("name", ScalarKind::Text)
        .build_descriptor();
    let descriptor = TypeDescriptor::mapping(TypeDescriptor::text(), TypeDescriptor::sequence(tag));
    let raw = Unstructured::map([(
        " group ",
        Unstructured::seq([Unstructured::map([("name", " a ")])]),
    )]);

    let value = converter.structure(&raw, &descriptor).expect("structured");
    let tags = value
        .as_map()
        .and_then(|m| m.get(&Value::from("GROUP")))
        .and_then(Value::as_sequence)
        .expect("GROUP key");
    assert_eq!(tags[0].get_field("name"), Some(&Value::from("A")));

    // Non-text raw now fails through the user hook instead of coercing.
    let err = converter
        .structure(&Unstructured::Int(1), &TypeDescriptor::text())
        .unwrap_err();
    assert!(err.is_shape_mismatch());
}

#[test]
fn test_unstructure_hook_by_runtime_type() {
    let converter = Converter::new();
    converter.register_unstructure_hook(
        TypeDescriptor::float(),
        UnstructureHook::new(|v, _| match v.as_f64() {
            Some(f) => Unstructured::Text(format!("{:.2}", f)),
            None => Unstructured::Null,
        }),
    );

    let value = Value::List(vec![Value::Float(1.0), Value::Int(2)]);
    assert_eq!(
        converter.unstructure(&value),
        Unstructured::seq([Unstructured::from("1.00"), Unstructured::Int(2)])
    );
}

#[test]
fn test_unstructure_hook_for_declared_attribute() {
    let converter = Converter::new();
    let cents = TypeDescriptor::sequence(TypeDescriptor::int());
    converter.register_unstructure_hook(
        cents.clone(),
        UnstructureHook::new(|v, _| Unstructured::Int(v.as_sequence().map_or(0, |s| s.len() as i64))),
    );

    let ledger = ClassBuilder::new("Ledger")
        .field_with_type("entries", cents)
        .build();
    let value = Value::Instance(
        restruct::Instance::new(&ledger).with("entries", vec![Value::Int(5), Value::Int(7)]),
    );

    // The attribute's declared descriptor keys the hook.
    assert_eq!(
        converter.unstructure(&value),
        Unstructured::map([("entries", Unstructured::Int(2))])
    );
    // A bare list has runtime descriptor List[Any] and is unaffected.
    assert_eq!(
        converter.unstructure(&Value::List(vec![Value::Int(5)])),
        Unstructured::seq([5i64])
    );
}

#[test]
fn test_predicate_hook_for_a_family() {
    let converter = Converter::new();
    converter.register_structure_hook_fn(
        |d| matches!(d, TypeDescriptor::Enum(_)),
        StructureHook::new(|raw, d, _| {
            let e = d.as_enum().ok_or_else(|| Error::shape_mismatch("enum", raw.kind_name()))?;
            let name = raw.as_str().unwrap_or_default();
            let variant = e
                .variant(name)
                .ok_or_else(|| Error::coercion_failed(d, format!("no member named {}", name)))?;
            Ok(Value::from(variant.name.as_str()))
        }),
    );

    let mood = restruct::EnumBuilder::new("Mood")
        .variant("HAPPY")
        .variant("SAD")
        .build_descriptor();
    assert_eq!(
        converter.structure(&Unstructured::from("SAD"), &mood).expect("by name"),
        Value::from("SAD")
    );
    assert!(converter
        .structure(&Unstructured::from("ANGRY"), &mood)
        .unwrap_err()
        .is_coercion_failed());
}

#[test]
fn test_no_hook_found_on_empty_registry() {
    let registry = HookRegistry::empty(0);
    let err = registry
        .resolve(Direction::Structure, &TypeDescriptor::sequence(TypeDescriptor::int()))
        .unwrap_err();
    assert!(err.is_no_hook_found());
    assert_eq!(err.to_string(), "no structure hook for List[int] (at $)");
}

#[test]
fn test_registration_visible_across_threads() {
    let converter = Arc::new(Converter::new());
    let descriptor = TypeDescriptor::sequence(TypeDescriptor::int());
    let raw = Unstructured::seq([1i64, 2, 3]);
    let readers = 4;
    let barrier = Arc::new(Barrier::new(readers + 1));

    let handles: Vec<_> = (0..readers)
        .map(|i| {
            let converter = Arc::clone(&converter);
            let barrier = Arc::clone(&barrier);
            let descriptor = descriptor.clone();
            let raw = raw.clone();
            thread::spawn(move || {
                let mut rng = fastrand::Rng::with_seed(i as u64);
                barrier.wait();
                for _ in 0..500 {
                    let value = converter.structure(&raw, &descriptor).expect("structure");
                    // Either the default list or the hooked constant, never anything else.
                    assert!(
                        value == Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
                            || value == Value::Int(0),
                        "unexpected {:?}",
                        value
                    );
                    if rng.u8(..) == 0 {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    barrier.wait();
    converter.register_structure_hook(
        descriptor.clone(),
        StructureHook::new(|_, _, _| Ok(Value::Int(0))),
    );
    for handle in handles {
        handle.join().expect("reader thread");
    }

    // Every lookup after registration observes the new hook.
    assert_eq!(converter.structure(&raw, &descriptor).expect("hooked"), Value::Int(0));
}

#[test]
fn test_global_converter_functions() {
    let raw = Unstructured::seq([Unstructured::from("1"), Unstructured::Float(2.7)]);
    let value = restruct::structure(&raw, &TypeDescriptor::sequence(TypeDescriptor::int()))
        .expect("global structure");
    assert_eq!(value, Value::List(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(restruct::unstructure(&value), Unstructured::seq([1i64, 2]));
}

#[test]
fn test_hook_does_not_leak_to_same_named_class() {
    let converter = Converter::new();
    let planar = ClassBuilder::new("Point")
        .field("x", ScalarKind::Int)
        .build_descriptor();
    let geo = ClassBuilder::new("Point")
        .field("lat", ScalarKind::Float)
        .build_descriptor();
    converter.register_structure_hook(
        planar.clone(),
        StructureHook::new(|_, _, _| Ok(Value::from("hooked"))),
    );

    let raw = Unstructured::map([("x", 1i64)]);
    assert_eq!(converter.structure(&raw, &planar).expect("hooked"), Value::from("hooked"));

    let raw = Unstructured::map([("lat", Unstructured::Float(48.8))]);
    let value = converter.structure(&raw, &geo).expect("default class rule");
    assert_eq!(value.get_field("lat"), Some(&Value::Float(48.8)));
}
