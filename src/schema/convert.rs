// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Translation between attribute values and Kubernetes JSON

use super::{Attribute, AttributeKind};
use crate::error::{ProviderError, Result};
use serde_json::{Map, Value};

fn child_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

/// Convert an attribute object into the JSON expected by the API server.
///
/// Unknown attributes, missing required attributes and values of the wrong
/// type are rejected with the attribute path. Null values are dropped.
/// Attributes that are computed only are never sent.
pub fn to_manifest(value: &Value, attrs: &[Attribute], path: &str) -> Result<Value> {
    let Value::Object(map) = value else {
        return Err(ProviderError::invalid(path, "expected an object"));
    };

    if let Some(unknown) = map.keys().find(|k| !attrs.iter().any(|a| &a.name == *k)) {
        return Err(ProviderError::invalid(
            child_path(path, unknown),
            "unsupported attribute",
        ));
    }

    let mut out = Map::new();
    for attr in attrs {
        let here = child_path(path, &attr.name);
        match map.get(&attr.name) {
            None | Some(Value::Null) => {
                if attr.required {
                    return Err(ProviderError::invalid(here, "required attribute is missing"));
                }
            }
            Some(_) if attr.computed && !attr.optional => {}
            Some(v) => {
                let key = if attr.json_name.is_empty() {
                    &attr.name
                } else {
                    &attr.json_name
                };
                out.insert(key.clone(), value_to_manifest(v, &attr.kind, &here)?);
            }
        }
    }

    Ok(Value::Object(out))
}

fn value_to_manifest(value: &Value, kind: &AttributeKind, path: &str) -> Result<Value> {
    let mismatch = |expected: &str| ProviderError::invalid(path, format!("expected {expected}"));

    match kind {
        AttributeKind::String if value.is_string() => Ok(value.clone()),
        AttributeKind::String => Err(mismatch("a string")),
        AttributeKind::Int64 if value.is_i64() || value.is_u64() => Ok(value.clone()),
        AttributeKind::Int64 => Err(mismatch("an integer")),
        AttributeKind::Float64 if value.is_number() => Ok(value.clone()),
        AttributeKind::Float64 => Err(mismatch("a number")),
        AttributeKind::Bool if value.is_boolean() => Ok(value.clone()),
        AttributeKind::Bool => Err(mismatch("a boolean")),
        AttributeKind::Dynamic => Ok(value.clone()),
        AttributeKind::List(elem) => {
            let items = value.as_array().ok_or_else(|| mismatch("a list"))?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| list_item(item, path, i, |v, p| value_to_manifest(v, elem, p)))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        AttributeKind::ListNested(attrs) => {
            let items = value.as_array().ok_or_else(|| mismatch("a list"))?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| list_item(item, path, i, |v, p| to_manifest(v, attrs, p)))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        AttributeKind::Map(elem) => {
            let entries = value.as_object().ok_or_else(|| mismatch("a map"))?;
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), value_to_manifest(v, elem, &child_path(path, k))?);
            }
            Ok(Value::Object(out))
        }
        AttributeKind::MapNested(attrs) => {
            let entries = value.as_object().ok_or_else(|| mismatch("a map"))?;
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), to_manifest(v, attrs, &child_path(path, k))?);
            }
            Ok(Value::Object(out))
        }
        AttributeKind::SingleNested(attrs) => to_manifest(value, attrs, path),
    }
}

fn list_item(
    item: &Value,
    path: &str,
    index: usize,
    convert: impl Fn(&Value, &str) -> Result<Value>,
) -> Result<Value> {
    let here = format!("{path}[{index}]");
    if item.is_null() {
        return Err(ProviderError::invalid(here, "list elements must not be null"));
    }
    convert(item, &here)
}

/// Convert JSON returned by the API server back into attribute values.
///
/// Fields without a matching attribute are dropped, map keys are kept as-is.
pub fn from_manifest(value: &Value, attrs: &[Attribute]) -> Value {
    let Value::Object(map) = value else {
        return Value::Null;
    };

    let mut out = Map::new();
    for attr in attrs.iter().filter(|a| !a.json_name.is_empty()) {
        match map.get(&attr.json_name) {
            None | Some(Value::Null) => {}
            Some(v) => {
                out.insert(attr.name.clone(), value_from_manifest(v, &attr.kind));
            }
        }
    }
    Value::Object(out)
}

fn value_from_manifest(value: &Value, kind: &AttributeKind) -> Value {
    match (kind, value) {
        (AttributeKind::List(elem), Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| value_from_manifest(item, elem))
                .collect(),
        ),
        (AttributeKind::ListNested(attrs), Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| from_manifest(item, attrs))
                .collect(),
        ),
        (AttributeKind::Map(elem), Value::Object(entries)) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_from_manifest(v, elem)))
                .collect(),
        ),
        (AttributeKind::MapNested(attrs), Value::Object(entries)) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), from_manifest(v, attrs)))
                .collect(),
        ),
        (AttributeKind::SingleNested(attrs), Value::Object(_)) => from_manifest(value, attrs),
        _ => value.clone(),
    }
}
