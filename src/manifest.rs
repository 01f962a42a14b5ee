// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Building manifests from state and reading state back from objects.

use crate::error::{ProviderError, Result};
use crate::resources::ResourceDescriptor;
use crate::schema::{from_manifest, to_manifest};
use crate::state::{object_id, ManifestState, StateMetadata};
use crate::validation::validate_metadata;
use kube::api::DynamicObject;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::slice;

/// Build the manifest applied for `metadata` and `spec`.
///
/// The spec is converted through the kind's attribute schema and the result
/// must deserialize as the typed custom resource.
pub fn build(
    desc: &ResourceDescriptor,
    metadata: &StateMetadata,
    spec: Option<&Value>,
) -> Result<Value> {
    let mut manifest = json!({
        "apiVersion": desc.api_version(),
        "kind": desc.kind(),
        "metadata": serde_json::to_value(metadata)?,
    });

    let wrapped = json!({ "spec": spec.cloned().unwrap_or(Value::Null) });
    let converted = to_manifest(&wrapped, slice::from_ref(&desc.spec), "")?;
    if let Some(spec) = converted.get(&desc.spec.json_name) {
        manifest["spec"] = spec.clone();
    }

    desc.validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Spec attribute values of a server object, `None` when it has no spec
pub fn spec_from_object(desc: &ResourceDescriptor, object: &Value) -> Option<Value> {
    from_manifest(object, slice::from_ref(&desc.spec))
        .get(&desc.spec.name)
        .cloned()
}

fn pick(
    server: Option<&BTreeMap<String, String>>,
    known: Option<&BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    let Some(server) = server else {
        return BTreeMap::new();
    };
    match known {
        Some(known) => server
            .iter()
            .filter(|(k, _)| known.contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        None => server.clone(),
    }
}

/// Metadata of a server object.
///
/// With `known` metadata only the label and annotation keys it already has
/// are refreshed, so keys added by controllers do not show up as drift.
pub fn metadata_from_object(object: &DynamicObject, known: Option<&StateMetadata>) -> StateMetadata {
    let meta = &object.metadata;
    StateMetadata {
        name: meta.name.clone().unwrap_or_default(),
        namespace: meta.namespace.clone(),
        labels: pick(meta.labels.as_ref(), known.map(|k| &k.labels)),
        annotations: pick(meta.annotations.as_ref(), known.map(|k| &k.annotations)),
    }
}

pub fn to_yaml(manifest: &Value) -> Result<String> {
    serde_yaml::to_string(manifest).map_err(|e| ProviderError::SerializationError(e.to_string()))
}

/// Validate `config` and render its manifest as YAML without contacting a cluster
pub fn render(desc: &ResourceDescriptor, config: &ManifestState) -> Result<ManifestState> {
    validate_metadata(&config.metadata, desc.namespaced)?;
    let manifest = build(desc, &config.metadata, config.spec.as_ref())?;

    Ok(ManifestState {
        id: Some(object_id(
            config.metadata.namespace.as_deref(),
            &config.metadata.name,
        )),
        metadata: config.metadata.clone(),
        spec: config.spec.clone(),
        yaml: Some(to_yaml(&manifest)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Certificate, ClusterIssuer};

    fn metadata(namespace: Option<&str>) -> StateMetadata {
        StateMetadata {
            name: "web".to_string(),
            namespace: namespace.map(str::to_string),
            labels: BTreeMap::from([("app".to_string(), "web".to_string())]),
            annotations: BTreeMap::new(),
        }
    }

    fn certificate_spec() -> Value {
        json!({
            "secret_name": "web-tls",
            "issuer_ref": {"name": "letsencrypt", "kind": "ClusterIssuer"},
            "dns_names": ["web.example.com"],
            "is_ca": false,
            "common_name": null
        })
    }

    #[test]
    fn test_build_certificate_manifest() {
        let desc = ResourceDescriptor::of::<Certificate>();
        let manifest = build(&desc, &metadata(Some("default")), Some(&certificate_spec())).unwrap();

        assert_eq!(
            manifest,
            json!({
                "apiVersion": "cert-manager.io/v1",
                "kind": "Certificate",
                "metadata": {"name": "web", "namespace": "default", "labels": {"app": "web"}},
                "spec": {
                    "secretName": "web-tls",
                    "issuerRef": {"name": "letsencrypt", "kind": "ClusterIssuer"},
                    "dnsNames": ["web.example.com"],
                    "isCA": false
                }
            })
        );
    }

    #[test]
    fn test_build_reports_attribute_path() {
        let desc = ResourceDescriptor::of::<Certificate>();
        let mut spec = certificate_spec();
        spec["dns_names"] = json!("web.example.com");

        let err = build(&desc, &metadata(Some("default")), Some(&spec)).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidAttribute { ref path, .. } if path == "spec.dns_names"));
    }

    #[test]
    fn test_build_requires_spec() {
        let desc = ResourceDescriptor::of::<Certificate>();
        let err = build(&desc, &metadata(Some("default")), None).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidAttribute { ref path, .. } if path == "spec"));
    }

    #[test]
    fn test_spec_from_object_renames_and_drops_unknown() {
        let desc = ResourceDescriptor::of::<Certificate>();
        let object = json!({
            "metadata": {"name": "web"},
            "spec": {
                "secretName": "web-tls",
                "issuerRef": {"name": "letsencrypt"},
                "somethingNew": true
            },
            "status": {"conditions": []}
        });

        assert_eq!(
            spec_from_object(&desc, &object),
            Some(json!({"secret_name": "web-tls", "issuer_ref": {"name": "letsencrypt"}}))
        );
        assert_eq!(spec_from_object(&desc, &json!({"metadata": {}})), None);
    }

    #[test]
    fn test_metadata_refreshes_known_keys_only() {
        let object: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "cert-manager.io/v1",
            "kind": "Certificate",
            "metadata": {
                "name": "web",
                "namespace": "default",
                "labels": {"app": "web-v2", "controller": "added"},
                "annotations": {"kubectl.kubernetes.io/last-applied-configuration": "{}"}
            }
        }))
        .unwrap();

        let refreshed = metadata_from_object(&object, Some(&metadata(Some("default"))));
        assert_eq!(refreshed.labels, BTreeMap::from([("app".to_string(), "web-v2".to_string())]));
        assert!(refreshed.annotations.is_empty());

        let imported = metadata_from_object(&object, None);
        assert_eq!(imported.labels.len(), 2);
        assert_eq!(imported.annotations.len(), 1);
    }

    #[test]
    fn test_render_cluster_scoped_manifest() {
        let desc = ResourceDescriptor::of::<ClusterIssuer>();
        let config = ManifestState {
            metadata: StateMetadata {
                name: "selfsigned".to_string(),
                ..Default::default()
            },
            spec: Some(json!({"self_signed": {}})),
            ..Default::default()
        };

        let rendered = render(&desc, &config).unwrap();
        assert_eq!(rendered.id.as_deref(), Some("selfsigned"));

        let yaml = rendered.yaml.unwrap();
        let parsed: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["kind"], "ClusterIssuer");
        assert_eq!(parsed["spec"], json!({"selfSigned": {}}));
        assert!(parsed["metadata"].get("namespace").is_none());
    }

    #[test]
    fn test_render_rejects_namespace_on_cluster_scoped_kind() {
        let desc = ResourceDescriptor::of::<ClusterIssuer>();
        let config = ManifestState {
            metadata: StateMetadata {
                name: "selfsigned".to_string(),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: Some(json!({"self_signed": {}})),
            ..Default::default()
        };
        assert!(render(&desc, &config).is_err());
    }
}
