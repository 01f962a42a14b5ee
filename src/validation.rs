// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Checks applied to a plan before anything is sent to the cluster.

use crate::error::{ProviderError, Result};
use crate::jsonpath::JsonPath;
use crate::state::{ResourceState, StateMetadata};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static DNS1123_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid regex")
});

static DNS1123_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

static QUALIFIED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("valid regex")
});

const MAX_SUBDOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// `metadata.name`: a DNS-1123 subdomain
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ProviderError::invalid("metadata.name", "must not be empty"));
    }
    if name.len() > MAX_SUBDOMAIN_LEN {
        return Err(ProviderError::invalid(
            "metadata.name",
            format!("must be no more than {MAX_SUBDOMAIN_LEN} characters"),
        ));
    }
    if !DNS1123_SUBDOMAIN.is_match(name) {
        return Err(ProviderError::invalid(
            "metadata.name",
            format!("'{name}' must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character"),
        ));
    }
    Ok(())
}

/// `metadata.namespace`: a DNS-1123 label
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.len() > MAX_LABEL_LEN || !DNS1123_LABEL.is_match(namespace) {
        return Err(ProviderError::invalid(
            "metadata.namespace",
            format!("'{namespace}' must be a lower case RFC 1123 label of at most {MAX_LABEL_LEN} characters"),
        ));
    }
    Ok(())
}

/// Label and annotation keys: an optional DNS subdomain prefix and a name
pub fn validate_key(path: &str, key: &str) -> Result<()> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty()
            || prefix.len() > MAX_SUBDOMAIN_LEN
            || !DNS1123_SUBDOMAIN.is_match(prefix)
        {
            return Err(ProviderError::invalid(
                path,
                format!("key '{key}' has an invalid prefix, it must be a DNS subdomain"),
            ));
        }
    }

    if name.is_empty() || name.len() > MAX_LABEL_LEN || !QUALIFIED_NAME.is_match(name) {
        return Err(ProviderError::invalid(
            path,
            format!("key '{key}' must be at most {MAX_LABEL_LEN} alphanumeric characters, '-', '_' or '.', starting and ending with an alphanumeric character"),
        ));
    }
    Ok(())
}

/// Label values may be empty, otherwise they follow the key name grammar
pub fn validate_label_value(path: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > MAX_LABEL_LEN || !QUALIFIED_NAME.is_match(value) {
        return Err(ProviderError::invalid(
            path,
            format!("value '{value}' must be at most {MAX_LABEL_LEN} alphanumeric characters, '-', '_' or '.', starting and ending with an alphanumeric character"),
        ));
    }
    Ok(())
}

/// Validate object metadata for a kind with the given scope
pub fn validate_metadata(metadata: &StateMetadata, namespaced: bool) -> Result<()> {
    validate_name(&metadata.name)?;

    match (&metadata.namespace, namespaced) {
        (Some(ns), true) => validate_namespace(ns)?,
        (None, true) => {
            return Err(ProviderError::invalid(
                "metadata.namespace",
                "required attribute is missing",
            ))
        }
        (Some(_), false) => {
            return Err(ProviderError::invalid(
                "metadata.namespace",
                "cluster-scoped resources do not have a namespace",
            ))
        }
        (None, false) => {}
    }

    for (key, value) in &metadata.labels {
        let path = format!("metadata.labels[\"{key}\"]");
        validate_key(&path, key)?;
        validate_label_value(&path, value)?;
    }
    for key in metadata.annotations.keys() {
        validate_key(&format!("metadata.annotations[\"{key}\"]"), key)?;
    }
    Ok(())
}

fn positive(path: String, duration: Option<Duration>) -> Result<()> {
    match duration {
        Some(d) if d.is_zero() => Err(ProviderError::invalid(path, "must be greater than zero")),
        _ => Ok(()),
    }
}

/// Validate everything in a plan except `spec`, which is checked against
/// the attribute schema when the manifest is built.
pub fn validate_state(state: &ResourceState, namespaced: bool) -> Result<()> {
    validate_metadata(&state.metadata, namespaced)?;

    if let Some(manager) = &state.field_manager {
        if manager.trim().is_empty() {
            return Err(ProviderError::invalid("field_manager", "must not be empty"));
        }
    }

    for (i, condition) in state.wait_for_upsert.iter().flatten().enumerate() {
        JsonPath::parse(&condition.jsonpath).map_err(|e| {
            ProviderError::invalid(format!("wait_for_upsert[{i}].jsonpath"), e.to_string())
        })?;
        positive(format!("wait_for_upsert[{i}].timeout"), condition.timeout)?;
        positive(format!("wait_for_upsert[{i}].poll_interval"), condition.poll_interval)?;
    }

    if let Some(wait) = &state.wait_for_delete {
        positive("wait_for_delete.timeout".to_string(), wait.timeout)?;
        positive("wait_for_delete.poll_interval".to_string(), wait.poll_interval)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::{DeleteWait, WaitCondition};
    use std::collections::BTreeMap;

    fn metadata(name: &str, namespace: Option<&str>) -> StateMetadata {
        StateMetadata {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            ..Default::default()
        }
    }

    fn error_path(result: Result<()>) -> String {
        match result {
            Err(ProviderError::InvalidAttribute { path, .. }) => path,
            other => panic!("expected InvalidAttribute, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_names() {
        for name in ["web", "web-1", "a.b.c", "0abc", "x"] {
            assert!(validate_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        let too_long = "a".repeat(254);
        for name in ["", "Web", "-web", "web-", "web_1", "a..b", too_long.as_str()] {
            assert!(validate_name(name).is_err(), "{name} should be invalid");
        }
    }

    #[test]
    fn test_namespace_is_a_label() {
        assert!(validate_namespace("cert-manager").is_ok());
        assert!(validate_namespace("cert.manager").is_err());
        assert!(validate_namespace(&"n".repeat(64)).is_err());
    }

    #[test]
    fn test_label_keys() {
        assert!(validate_key("labels", "app").is_ok());
        assert!(validate_key("labels", "app.kubernetes.io/name").is_ok());
        assert!(validate_key("labels", "My_Label.v2").is_ok());
        assert!(validate_key("labels", "/name").is_err());
        assert!(validate_key("labels", "Example.COM/name").is_err());
        assert!(validate_key("labels", "app/").is_err());
        assert!(validate_key("labels", "_app").is_err());
        assert!(validate_key("labels", &"k".repeat(64)).is_err());
    }

    #[test]
    fn test_label_values() {
        assert!(validate_label_value("labels", "").is_ok());
        assert!(validate_label_value("labels", "v1.2_beta").is_ok());
        assert!(validate_label_value("labels", "has space").is_err());
        assert!(validate_label_value("labels", "-start").is_err());
    }

    #[test]
    fn test_annotation_values_are_unrestricted() {
        let mut meta = metadata("web", Some("default"));
        meta.annotations = BTreeMap::from([(
            "cert-manager.io/issuer-kind".to_string(),
            "anything goes: {\"even\": json}".to_string(),
        )]);
        assert!(validate_metadata(&meta, true).is_ok());
    }

    #[test]
    fn test_invalid_label_reports_path() {
        let mut meta = metadata("web", Some("default"));
        meta.labels = BTreeMap::from([("app".to_string(), "not valid!".to_string())]);
        assert_eq!(error_path(validate_metadata(&meta, true)), "metadata.labels[\"app\"]");
    }

    #[test]
    fn test_namespace_scope() {
        assert_eq!(
            error_path(validate_metadata(&metadata("web", None), true)),
            "metadata.namespace"
        );
        assert_eq!(
            error_path(validate_metadata(&metadata("issuer", Some("default")), false)),
            "metadata.namespace"
        );
        assert!(validate_metadata(&metadata("issuer", None), false).is_ok());
    }

    #[test]
    fn test_invalid_wait_jsonpath_reports_index() {
        let state = ResourceState {
            metadata: metadata("web", Some("default")),
            wait_for_upsert: Some(vec![
                WaitCondition {
                    jsonpath: ".status.state".to_string(),
                    value: "valid".to_string(),
                    timeout: None,
                    poll_interval: None,
                },
                WaitCondition {
                    jsonpath: "{.status[".to_string(),
                    value: "valid".to_string(),
                    timeout: None,
                    poll_interval: None,
                },
            ]),
            ..Default::default()
        };
        assert_eq!(error_path(validate_state(&state, true)), "wait_for_upsert[1].jsonpath");
    }

    #[test]
    fn test_zero_durations_are_rejected() {
        let state = ResourceState {
            metadata: metadata("web", Some("default")),
            wait_for_delete: Some(DeleteWait {
                timeout: Some(Duration::ZERO),
                poll_interval: None,
            }),
            ..Default::default()
        };
        assert_eq!(error_path(validate_state(&state, true)), "wait_for_delete.timeout");
    }

    #[test]
    fn test_empty_field_manager_is_rejected() {
        let state = ResourceState {
            metadata: metadata("web", Some("default")),
            field_manager: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(error_path(validate_state(&state, true)), "field_manager");
    }
}
