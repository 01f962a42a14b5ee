// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resources exposed by the provider and the registry that maps type
//! names to them.

pub mod acme;
pub mod certificates;
pub mod issuers;
pub mod meta;

use crate::constants::MANIFEST_SUFFIX;
use crate::error::{ProviderError, Result};
use crate::naming::type_name;
use crate::schema::{self, spec_attribute, Attribute, Schema};
use kube::api::{Api, DynamicObject};
use kube::discovery::ApiResource;
use kube::{Client, CustomResourceExt, Resource};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

pub use acme::{Challenge, Order};
pub use certificates::{Certificate, CertificateRequest};
pub use issuers::{ClusterIssuer, Issuer};

/// Everything needed to manage one custom resource kind dynamically
#[derive(Clone)]
pub struct ResourceDescriptor {
    pub type_name: String,
    pub description: String,
    pub api_resource: ApiResource,
    pub namespaced: bool,
    /// `spec` attribute derived from the CRD schema
    pub spec: Attribute,
    validate: fn(&Value) -> std::result::Result<(), serde_json::Error>,
}

impl std::fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("type_name", &self.type_name)
            .field("api_version", &self.api_resource.api_version)
            .field("kind", &self.api_resource.kind)
            .field("namespaced", &self.namespaced)
            .finish()
    }
}

fn deserializes_as<K: DeserializeOwned>(manifest: &Value) -> std::result::Result<(), serde_json::Error> {
    K::deserialize(manifest).map(|_| ())
}

impl ResourceDescriptor {
    /// Describe the custom resource `K` from its generated CRD
    pub fn of<K>() -> Self
    where
        K: CustomResourceExt + Resource<DynamicType = ()> + DeserializeOwned,
    {
        let crd = K::crd();
        let api_resource = ApiResource::erase::<K>(&());
        let spec = spec_attribute(&crd);
        let description = spec.description.clone().unwrap_or_else(|| {
            format!("{} ({})", api_resource.kind, api_resource.api_version)
        });

        Self {
            type_name: type_name(&api_resource.group, &api_resource.kind, &api_resource.version),
            description,
            namespaced: crd.spec.scope == "Namespaced",
            api_resource,
            spec,
            validate: deserializes_as::<K>,
        }
    }

    pub fn kind(&self) -> &str {
        &self.api_resource.kind
    }

    pub fn api_version(&self) -> &str {
        &self.api_resource.api_version
    }

    /// Check that `manifest` is a valid object of this kind
    pub fn validate_manifest(&self, manifest: &Value) -> Result<()> {
        (self.validate)(manifest).map_err(|e| ProviderError::ManifestError {
            kind: self.kind().to_string(),
            message: e.to_string(),
        })
    }

    pub fn resource_schema(&self) -> Schema {
        schema::resource_schema(
            &self.type_name,
            &self.description,
            self.namespaced,
            self.spec.clone(),
        )
    }

    pub fn data_source_schema(&self) -> Schema {
        schema::data_source_schema(
            &self.type_name,
            &self.description,
            self.namespaced,
            self.spec.clone(),
        )
    }

    pub fn manifest_schema(&self) -> Schema {
        schema::manifest_schema(
            &self.manifest_type_name(),
            &self.description,
            self.namespaced,
            self.spec.clone(),
        )
    }

    pub fn manifest_type_name(&self) -> String {
        format!("{}{}", self.type_name, MANIFEST_SUFFIX)
    }

    /// Human readable reference used in logs and errors, e.g. `Certificate default/web`
    pub fn display(&self, namespace: Option<&str>, name: &str) -> String {
        match namespace {
            Some(ns) if self.namespaced => format!("{} {}/{}", self.kind(), ns, name),
            _ => format!("{} {}", self.kind(), name),
        }
    }

    /// Dynamic API for this kind, scoped to `namespace` when namespaced
    pub fn api(&self, client: Client, namespace: Option<&str>) -> Result<Api<DynamicObject>> {
        match (self.namespaced, namespace) {
            (true, Some(ns)) => Ok(Api::namespaced_with(client, ns, &self.api_resource)),
            (true, None) => Err(ProviderError::invalid(
                "metadata.namespace",
                format!("{} is namespaced", self.kind()),
            )),
            (false, _) => Ok(Api::all_with(client, &self.api_resource)),
        }
    }
}

/// Resource descriptors keyed by type name
#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: BTreeMap<String, ResourceDescriptor>,
}

impl Registry {
    pub fn new(descriptors: impl IntoIterator<Item = ResourceDescriptor>) -> Self {
        Self {
            descriptors: descriptors
                .into_iter()
                .map(|d| (d.type_name.clone(), d))
                .collect(),
        }
    }

    /// The cert-manager `acme.cert-manager.io` and `cert-manager.io` kinds
    pub fn cert_manager() -> Self {
        Self::new([
            ResourceDescriptor::of::<Challenge>(),
            ResourceDescriptor::of::<Order>(),
            ResourceDescriptor::of::<Certificate>(),
            ResourceDescriptor::of::<CertificateRequest>(),
            ResourceDescriptor::of::<Issuer>(),
            ResourceDescriptor::of::<ClusterIssuer>(),
        ])
    }

    pub fn get(&self, type_name: &str) -> Result<&ResourceDescriptor> {
        self.descriptors
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResourceType(type_name.to_string()))
    }

    /// Descriptor behind a `<type>_manifest` data source
    pub fn manifest(&self, type_name: &str) -> Result<&ResourceDescriptor> {
        type_name
            .strip_suffix(MANIFEST_SUFFIX)
            .and_then(|base| self.descriptors.get(base))
            .ok_or_else(|| ProviderError::UnknownResourceType(type_name.to_string()))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    /// Data sources: one reading each kind, one rendering its manifest
    pub fn data_source_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .descriptors
            .values()
            .flat_map(|d| [d.type_name.clone(), d.manifest_type_name()])
            .collect();
        names.sort();
        names
    }

    pub fn data_source_schema(&self, type_name: &str) -> Result<Schema> {
        match self.manifest(type_name) {
            Ok(desc) => Ok(desc.manifest_schema()),
            Err(_) => Ok(self.get(type_name)?.data_source_schema()),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::cert_manager()
    }
}
