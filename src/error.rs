// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Invalid provider configuration: {0}")]
    ConfigError(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Invalid value for attribute '{path}': {message}")]
    InvalidAttribute { path: String, message: String },

    #[error("Invalid import id '{id}': {message}")]
    InvalidImportId { id: String, message: String },

    #[error("Changing {attribute} from '{from}' to '{to}' requires replacing the resource")]
    ReplacementRequired {
        attribute: String,
        from: String,
        to: String,
    },

    #[error("Resource {0} not found")]
    NotFound(String),

    #[error("Invalid JSONPath expression '{expression}': {message}")]
    JsonPathError { expression: String, message: String },

    #[error(
        "Timed out after {timeout:?} waiting for {jsonpath} to equal '{expected}' on {object} (last value: '{last}')"
    )]
    WaitTimeout {
        object: String,
        jsonpath: String,
        expected: String,
        last: String,
        timeout: std::time::Duration,
    },

    #[error("Timed out after {timeout:?} waiting for {object} to be deleted")]
    DeleteTimeout {
        object: String,
        timeout: std::time::Duration,
    },

    #[error("Manifest rejected by {kind} type: {message}")]
    ManifestError { kind: String, message: String },

    #[error("Custom resource {0} is not served by the cluster")]
    CrdNotServed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::SerializationError(e.to_string())
    }
}

impl ProviderError {
    pub(crate) fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::InvalidAttribute {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
