// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Field manager used for server-side apply when none is configured
pub const DEFAULT_FIELD_MANAGER: &str = "kube-crd-provider";

/// Prefix shared by every resource and data source type name
pub const TYPE_NAME_PREFIX: &str = "k8s";

/// Suffix of the offline data sources that only render a manifest
pub const MANIFEST_SUFFIX: &str = "_manifest";

/// Environment variables read by `ProviderConfig::from_env`
pub mod env {
    pub const KUBECONFIG: &str = "KUBE_CRD_PROVIDER_KUBECONFIG";
    pub const CONTEXT: &str = "KUBE_CRD_PROVIDER_CONTEXT";
    pub const FIELD_MANAGER: &str = "KUBE_CRD_PROVIDER_FIELD_MANAGER";
    pub const WAIT_TIMEOUT: &str = "KUBE_CRD_PROVIDER_WAIT_TIMEOUT";
    pub const POLL_INTERVAL: &str = "KUBE_CRD_PROVIDER_POLL_INTERVAL";
}

/// Polling defaults for `wait_for_upsert` and `wait_for_delete`
pub mod wait {
    /// Timeout applied to a wait block without an explicit timeout
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Interval between two checks of a wait block
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
}

/// CRD discovery polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for a CRD
    pub const POLL_INTERVAL_SECS: u64 = 1;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 10;
}
