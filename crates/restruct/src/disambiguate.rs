// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Union member selection during structuring.
//!
//! Order: a registered disambiguation hook for the exact union; a
//! single-member union; unique-field matching when every member is a class;
//! otherwise `AmbiguousUnion`. Unique-field matching looks at key presence
//! only, never at values, and never falls back to the first member.

use crate::converter::Converter;
use crate::descriptor::{TypeDescriptor, UnionMembers};
use crate::error::{Error, Result};
use crate::value::Unstructured;
use std::collections::BTreeSet;

/// Per-member attribute names that no other member declares.
#[derive(Debug, Clone)]
pub struct UniqueFieldIndex {
    members: Vec<(TypeDescriptor, BTreeSet<String>)>,
}

impl UniqueFieldIndex {
    /// Build for a union of defined classes; `None` otherwise.
    pub fn build(members: &UnionMembers) -> Option<Self> {
        let mut all: Vec<(TypeDescriptor, BTreeSet<String>)> = Vec::with_capacity(members.len());
        for member in members {
            let spec = member.as_class()?.spec()?;
            let names = spec.attribute_names().map(str::to_string).collect();
            all.push((member.clone(), names));
        }

        let members = all
            .iter()
            .enumerate()
            .map(|(i, (member, names))| {
                let unique: BTreeSet<String> = names
                    .iter()
                    .filter(|name| {
                        all.iter()
                            .enumerate()
                            .all(|(j, (_, other))| i == j || !other.contains(*name))
                    })
                    .cloned()
                    .collect();
                (member.clone(), unique)
            })
            .collect();
        Some(Self { members })
    }

    pub fn unique_fields(&self, member: &TypeDescriptor) -> Option<&BTreeSet<String>> {
        self.members
            .iter()
            .find(|(m, _)| m == member)
            .map(|(_, fields)| fields)
    }

    /// Choose the one member whose unique fields intersect the raw keys.
    pub fn select(&self, union: &TypeDescriptor, raw: &Unstructured) -> Result<TypeDescriptor> {
        let Some(entries) = raw.as_map() else {
            return Err(Error::ambiguous_union(
                union,
                format!("cannot disambiguate a {} value by fields", raw.kind_name()),
            ));
        };
        let keys: BTreeSet<&str> = entries.keys().filter_map(Unstructured::as_str).collect();

        let matches: Vec<&TypeDescriptor> = self
            .members
            .iter()
            .filter(|(_, unique)| unique.iter().any(|f| keys.contains(f.as_str())))
            .map(|(member, _)| member)
            .collect();

        match matches.as_slice() {
            [single] => Ok((*single).clone()),
            [] => Err(Error::ambiguous_union(union, "no member-unique field present")),
            several => {
                let names: Vec<String> = several.iter().map(|m| m.to_string()).collect();
                Err(Error::ambiguous_union(
                    union,
                    format!("unique fields of {} are all present", names.join(", ")),
                ))
            }
        }
    }
}

/// Pick the member of `union` that `raw` should structure into.
pub(crate) fn disambiguate(
    union: &TypeDescriptor,
    members: &UnionMembers,
    raw: &Unstructured,
    converter: &Converter,
) -> Result<TypeDescriptor> {
    if let Some(hook) = converter.registry().disambiguator(union) {
        return hook.call(raw);
    }

    if let [only] = members.as_slice() {
        return Ok(only.clone());
    }

    let Some(index) = converter.registry().unique_field_index(union) else {
        return Err(Error::ambiguous_union(
            union,
            "members are not all defined classes and no disambiguator is registered",
        ));
    };
    let chosen = index.select(union, raw)?;
    log::trace!("[disambiguate] {} -> {}", union, chosen);
    Ok(chosen)
}
