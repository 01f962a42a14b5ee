// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! State and plan envelope shared by every resource type.

use crate::error::{ProviderError, Result};
use crate::wait::{DeleteWait, WaitCondition};
use kube::api::PropagationPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// What happens to dependents when an object is deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionPropagation {
    Orphan,
    #[default]
    Background,
    Foreground,
}

impl From<DeletionPropagation> for PropagationPolicy {
    fn from(p: DeletionPropagation) -> Self {
        match p {
            DeletionPropagation::Orphan => PropagationPolicy::Orphan,
            DeletionPropagation::Background => PropagationPolicy::Background,
            DeletionPropagation::Foreground => PropagationPolicy::Foreground,
        }
    }
}

/// State of a managed resource, also used for plans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_conflicts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_propagation: Option<DeletionPropagation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_upsert: Option<Vec<WaitCondition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_delete: Option<DeleteWait>,
    pub metadata: StateMetadata,
    /// Attribute values of the object's spec, snake_case keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,
}

impl ResourceState {
    /// Parse a state document, reporting shape errors against `state`
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| ProviderError::invalid("state", e.to_string()))
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Lookup keys of a data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceConfig {
    pub metadata: StateMetadata,
}

/// Computed values of a data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceState {
    pub id: String,
    pub api_version: String,
    pub kind: String,
    pub metadata: StateMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,
}

/// Configuration and result of a manifest data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub metadata: StateMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml: Option<String>,
}

/// `namespace/name` for namespaced objects, `name` otherwise
pub fn object_id(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{ns}/{name}"),
        None => name.to_string(),
    }
}

/// Split an import id into namespace and name.
///
/// Namespaced kinds expect `namespace/name`, cluster-scoped kinds a bare `name`.
pub fn parse_import_id(id: &str, namespaced: bool) -> Result<(Option<String>, String)> {
    let invalid = |message: &str| ProviderError::InvalidImportId {
        id: id.to_string(),
        message: message.to_string(),
    };

    if namespaced {
        match id.split('/').collect::<Vec<_>>().as_slice() {
            [ns, name] if !ns.is_empty() && !name.is_empty() => {
                Ok((Some(ns.to_string()), name.to_string()))
            }
            _ => Err(invalid("expected 'namespace/name'")),
        }
    } else if id.is_empty() || id.contains('/') {
        Err(invalid("expected 'name' for a cluster-scoped resource"))
    } else {
        Ok((None, id.to_string()))
    }
}
