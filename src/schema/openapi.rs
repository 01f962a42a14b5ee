// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Attribute trees derived from a CRD's OpenAPI v3 schema

use super::{Attribute, AttributeKind};
use crate::naming::to_snake_case;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, JSONSchemaProps, JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};

/// Build the `spec` attribute of the first served version of `crd`.
///
/// The spec is required when the CRD marks it required; a CRD without a
/// spec property yields an optional dynamic attribute.
pub fn spec_attribute(crd: &CustomResourceDefinition) -> Attribute {
    let root = crd
        .spec
        .versions
        .iter()
        .find(|v| v.served)
        .and_then(|v| v.schema.as_ref())
        .and_then(|s| s.open_api_v3_schema.as_ref());

    let Some(root) = root else {
        return Attribute::optional("spec", AttributeKind::Dynamic).json("spec");
    };

    let spec = root.properties.as_ref().and_then(|p| p.get("spec"));
    let required = is_required(root, "spec");

    match spec {
        Some(props) => property("spec", props, required),
        None => Attribute::optional("spec", AttributeKind::Dynamic).json("spec"),
    }
}

fn is_required(parent: &JSONSchemaProps, field: &str) -> bool {
    parent
        .required
        .as_ref()
        .is_some_and(|r| r.iter().any(|f| f == field))
}

fn property(json_name: &str, props: &JSONSchemaProps, required: bool) -> Attribute {
    let props = unwrap_all_of(props);
    let name = to_snake_case(json_name);
    let attr = if required {
        Attribute::required(&name, kind_of(props))
    } else {
        Attribute::optional(&name, kind_of(props))
    };
    let attr = attr.json(json_name);
    match &props.description {
        Some(d) => attr.describe(d.clone()),
        None => attr,
    }
}

/// Schemas wrapped in a single-element `allOf` behave like the wrapped schema
fn unwrap_all_of(props: &JSONSchemaProps) -> &JSONSchemaProps {
    match props.all_of.as_deref() {
        Some([inner]) if props.type_.is_none() && props.properties.is_none() => {
            unwrap_all_of(inner)
        }
        _ => props,
    }
}

fn attributes(props: &JSONSchemaProps) -> Vec<Attribute> {
    props
        .properties
        .iter()
        .flatten()
        .map(|(json_name, child)| property(json_name, child, is_required(props, json_name)))
        .collect()
}

fn has_properties(props: &JSONSchemaProps) -> bool {
    props.properties.as_ref().is_some_and(|p| !p.is_empty())
}

fn kind_of(props: &JSONSchemaProps) -> AttributeKind {
    let props = unwrap_all_of(props);

    if props.x_kubernetes_int_or_string == Some(true) {
        return AttributeKind::String;
    }
    if props.x_kubernetes_preserve_unknown_fields == Some(true) && !has_properties(props) {
        return AttributeKind::Dynamic;
    }

    match props.type_.as_deref() {
        Some("string") => AttributeKind::String,
        Some("integer") => AttributeKind::Int64,
        Some("number") => AttributeKind::Float64,
        Some("boolean") => AttributeKind::Bool,
        Some("array") => match &props.items {
            Some(JSONSchemaPropsOrArray::Schema(inner)) => {
                let inner = unwrap_all_of(inner);
                if has_properties(inner) {
                    AttributeKind::ListNested(attributes(inner))
                } else {
                    AttributeKind::List(Box::new(kind_of(inner)))
                }
            }
            _ => AttributeKind::List(Box::new(AttributeKind::Dynamic)),
        },
        Some("object") | None if has_properties(props) => {
            AttributeKind::SingleNested(attributes(props))
        }
        Some("object") => match &props.additional_properties {
            Some(JSONSchemaPropsOrBool::Schema(inner)) => {
                let inner = unwrap_all_of(inner);
                if has_properties(inner) {
                    AttributeKind::MapNested(attributes(inner))
                } else {
                    AttributeKind::Map(Box::new(kind_of(inner)))
                }
            }
            _ => AttributeKind::Dynamic,
        },
        _ => AttributeKind::Dynamic,
    }
}
