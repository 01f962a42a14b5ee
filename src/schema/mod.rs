// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Attribute schemas for resources and data sources.
//!
//! Attribute names are snake_case while the Kubernetes JSON they map to is
//! camelCase; every [`Attribute`] carries both so values can be translated
//! in either direction by [`convert`].

pub mod convert;
pub mod openapi;

use serde::Serialize;

pub use convert::{from_manifest, to_manifest};
pub use openapi::spec_attribute;

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Int64,
    Float64,
    Bool,
    /// List of primitive elements
    List(Box<AttributeKind>),
    /// String-keyed map of primitive elements
    Map(Box<AttributeKind>),
    ListNested(Vec<Attribute>),
    MapNested(Vec<Attribute>),
    SingleNested(Vec<Attribute>),
    /// Arbitrary JSON, passed through untouched
    Dynamic,
}

impl AttributeKind {
    pub fn nested(&self) -> Option<&[Attribute]> {
        match self {
            AttributeKind::ListNested(attrs)
            | AttributeKind::MapNested(attrs)
            | AttributeKind::SingleNested(attrs) => Some(attrs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    /// Field name on the Kubernetes object; empty for provider-only attributes
    #[serde(skip_serializing_if = "String::is_empty")]
    pub json_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: AttributeKind,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
}

impl Attribute {
    fn new(name: &str, kind: AttributeKind) -> Self {
        Self {
            name: name.to_string(),
            json_name: String::new(),
            description: None,
            kind,
            required: false,
            optional: false,
            computed: false,
        }
    }

    pub fn required(name: &str, kind: AttributeKind) -> Self {
        Self {
            required: true,
            ..Self::new(name, kind)
        }
    }

    pub fn optional(name: &str, kind: AttributeKind) -> Self {
        Self {
            optional: true,
            ..Self::new(name, kind)
        }
    }

    pub fn computed(name: &str, kind: AttributeKind) -> Self {
        Self {
            computed: true,
            ..Self::new(name, kind)
        }
    }

    /// Optional attribute the provider fills in when left unset
    pub fn optional_computed(name: &str, kind: AttributeKind) -> Self {
        Self {
            optional: true,
            computed: true,
            ..Self::new(name, kind)
        }
    }

    pub fn json(mut self, json_name: &str) -> Self {
        self.json_name = json_name.to_string();
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark this attribute and everything below it as computed only
    pub fn into_computed(mut self) -> Self {
        self.required = false;
        self.optional = false;
        self.computed = true;
        self.kind = match self.kind {
            AttributeKind::ListNested(attrs) => {
                AttributeKind::ListNested(attrs.into_iter().map(Self::into_computed).collect())
            }
            AttributeKind::MapNested(attrs) => {
                AttributeKind::MapNested(attrs.into_iter().map(Self::into_computed).collect())
            }
            AttributeKind::SingleNested(attrs) => {
                AttributeKind::SingleNested(attrs.into_iter().map(Self::into_computed).collect())
            }
            other => other,
        };
        self
    }
}

/// Full schema of one resource or data source type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub type_name: String,
    pub description: String,
    pub version: i64,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

fn string() -> AttributeKind {
    AttributeKind::String
}

fn string_map() -> AttributeKind {
    AttributeKind::Map(Box::new(AttributeKind::String))
}

fn metadata_attribute(namespaced: bool, computed_maps: bool) -> Attribute {
    let mut attrs = vec![Attribute::required("name", string())
        .json("name")
        .describe("Unique name of the object within its namespace or the cluster.")];
    if namespaced {
        attrs.push(
            Attribute::required("namespace", string())
                .json("namespace")
                .describe("Namespace the object lives in."),
        );
    }
    let (labels, annotations) = if computed_maps {
        (
            Attribute::computed("labels", string_map()),
            Attribute::computed("annotations", string_map()),
        )
    } else {
        (
            Attribute::optional("labels", string_map()),
            Attribute::optional("annotations", string_map()),
        )
    };
    attrs.push(
        labels
            .json("labels")
            .describe("Map of string keys and values that can be used to organize and categorize objects."),
    );
    attrs.push(
        annotations
            .json("annotations")
            .describe("Unstructured key value map stored with a resource."),
    );
    Attribute::required("metadata", AttributeKind::SingleNested(attrs))
        .json("metadata")
        .describe("Standard object metadata.")
}

fn wait_for_upsert_attribute() -> Attribute {
    Attribute::optional(
        "wait_for_upsert",
        AttributeKind::ListNested(vec![
            Attribute::required("jsonpath", string())
                .describe("JSONPath expression evaluated against the object, e.g. '.status.state'."),
            Attribute::required("value", string()).describe("Expected rendered value."),
            Attribute::optional("timeout", string())
                .describe("Maximum time to wait, e.g. '30s'. Defaults to the provider timeout."),
            Attribute::optional("poll_interval", string())
                .describe("Time between two checks, e.g. '5s'. Defaults to the provider interval."),
        ]),
    )
    .describe("Conditions that must hold after create or update before the operation completes.")
}

fn wait_for_delete_attribute() -> Attribute {
    Attribute::optional(
        "wait_for_delete",
        AttributeKind::SingleNested(vec![
            Attribute::optional("timeout", string()),
            Attribute::optional("poll_interval", string()),
        ]),
    )
    .describe("Wait until the object is gone after delete.")
}

/// Schema of a managed resource
pub fn resource_schema(
    type_name: &str,
    description: &str,
    namespaced: bool,
    spec: Attribute,
) -> Schema {
    Schema {
        type_name: type_name.to_string(),
        description: description.to_string(),
        version: 1,
        attributes: vec![
            Attribute::computed("id", string())
                .describe("'namespace/name' for namespaced objects, 'name' otherwise."),
            Attribute::computed("api_version", string()).json("apiVersion"),
            Attribute::computed("kind", string()).json("kind"),
            Attribute::optional_computed("field_manager", string())
                .describe("Field manager used for server-side apply."),
            Attribute::optional_computed("force_conflicts", AttributeKind::Bool)
                .describe("Take ownership of fields managed by other field managers."),
            Attribute::optional_computed("deletion_propagation", string())
                .describe("One of 'Orphan', 'Background' or 'Foreground'."),
            wait_for_upsert_attribute(),
            wait_for_delete_attribute(),
            metadata_attribute(namespaced, false),
            spec,
        ],
    }
}

/// Schema of the data source reading an existing object
pub fn data_source_schema(
    type_name: &str,
    description: &str,
    namespaced: bool,
    spec: Attribute,
) -> Schema {
    Schema {
        type_name: type_name.to_string(),
        description: description.to_string(),
        version: 0,
        attributes: vec![
            Attribute::computed("id", string()),
            Attribute::computed("api_version", string()).json("apiVersion"),
            Attribute::computed("kind", string()).json("kind"),
            metadata_attribute(namespaced, true),
            spec.into_computed(),
        ],
    }
}

/// Schema of the offline data source rendering a manifest
pub fn manifest_schema(
    type_name: &str,
    description: &str,
    namespaced: bool,
    spec: Attribute,
) -> Schema {
    Schema {
        type_name: type_name.to_string(),
        description: description.to_string(),
        version: 0,
        attributes: vec![
            Attribute::computed("id", string()),
            metadata_attribute(namespaced, false),
            spec,
            Attribute::computed("yaml", string()).describe("The rendered manifest in YAML format."),
        ],
    }
}
