// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON interchange bridge (feature `json`).
//!
//! JSON has no bytes, sets or non-text keys, so unstructuring to JSON is
//! lossy: bytes become arrays of integers, sets become arrays, non-text map
//! keys are rendered as their JSON text. Structuring then recovers the
//! declared shapes from the descriptor.

use crate::value::Unstructured;
use serde_json::{Map, Number, Value as Json};

impl Unstructured {
    /// Lift a parsed JSON document.
    pub fn from_json(json: Json) -> Self {
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                // u64 above i64::MAX, or a float
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            Json::String(s) => Self::Text(s),
            Json::Array(items) => Self::Seq(items.into_iter().map(Self::from_json).collect()),
            Json::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (Self::Text(k), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render as JSON. Non-finite floats and foreign values become `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Self::Null | Self::Foreign(_) => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::Number(Number::from(*i)),
            Self::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::Text(s) => Json::String(s.clone()),
            Self::Bytes(b) => Json::Array(b.iter().map(|byte| Json::from(*byte)).collect()),
            Self::Seq(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Set(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => {
                let mut object = Map::with_capacity(entries.len());
                for (k, v) in entries {
                    let key = match k {
                        Self::Text(s) => s.clone(),
                        other => other.to_json().to_string(),
                    };
                    object.insert(key, v.to_json());
                }
                Json::Object(object)
            }
        }
    }
}
