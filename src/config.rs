// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{env as vars, wait, DEFAULT_FIELD_MANAGER};
use crate::error::{ProviderError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Provider configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Explicit kubeconfig file, falls back to in-cluster or `KUBECONFIG` inference
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of the current one
    pub context: Option<String>,
    /// Field manager for server-side apply when a resource does not set one
    pub field_manager: String,
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            wait_timeout: Duration::from_secs(wait::DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(wait::DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl ProviderConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let field_manager = match lookup(vars::FIELD_MANAGER) {
            Some(v) if v.trim().is_empty() => {
                return Err(ProviderError::ConfigError(format!(
                    "{} must not be empty",
                    vars::FIELD_MANAGER
                )))
            }
            Some(v) => v,
            None => defaults.field_manager,
        };

        let wait_timeout = match non_empty(vars::WAIT_TIMEOUT) {
            Some(v) => parse_duration(vars::WAIT_TIMEOUT, &v)?,
            None => defaults.wait_timeout,
        };
        let poll_interval = match non_empty(vars::POLL_INTERVAL) {
            Some(v) => parse_duration(vars::POLL_INTERVAL, &v)?,
            None => defaults.poll_interval,
        };

        Ok(ProviderConfig {
            kubeconfig: non_empty(vars::KUBECONFIG).map(PathBuf::from),
            context: non_empty(vars::CONTEXT),
            field_manager,
            wait_timeout,
            poll_interval,
        })
    }
}

/// Parse a human duration such as `30s` or `1m 30s`. Zero is rejected.
pub fn parse_duration(name: &str, value: &str) -> Result<Duration> {
    let duration = humantime::parse_duration(value.trim()).map_err(|e| {
        ProviderError::ConfigError(format!("{name}: invalid duration '{value}': {e}"))
    })?;
    if duration.is_zero() {
        return Err(ProviderError::ConfigError(format!(
            "{name} must be greater than zero"
        )));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ProviderConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProviderConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.field_manager, "kube-crd-provider");
        assert_eq!(config.wait_timeout, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_reads_all_variables() {
        let config = load(&[
            (vars::KUBECONFIG, "/tmp/kubeconfig"),
            (vars::CONTEXT, "kind-test"),
            (vars::FIELD_MANAGER, "platform-team"),
            (vars::WAIT_TIMEOUT, "2m"),
            (vars::POLL_INTERVAL, "500ms"),
        ])
        .unwrap();

        assert_eq!(config.kubeconfig, Some(PathBuf::from("/tmp/kubeconfig")));
        assert_eq!(config.context.as_deref(), Some("kind-test"));
        assert_eq!(config.field_manager, "platform-team");
        assert_eq!(config.wait_timeout, Duration::from_secs(120));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_empty_field_manager_is_rejected() {
        let err = load(&[(vars::FIELD_MANAGER, " ")]).unwrap_err();
        assert!(matches!(err, ProviderError::ConfigError(_)));
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let err = load(&[(vars::WAIT_TIMEOUT, "soon")]).unwrap_err();
        assert!(err.to_string().contains(vars::WAIT_TIMEOUT));
    }

    #[test]
    fn test_zero_durations_are_rejected() {
        let err = load(&[(vars::POLL_INTERVAL, "0s")]).unwrap_err();
        assert!(matches!(err, ProviderError::ConfigError(ref m) if m.contains(vars::POLL_INTERVAL)));

        let err = load(&[(vars::WAIT_TIMEOUT, "0ms")]).unwrap_err();
        assert!(matches!(err, ProviderError::ConfigError(ref m) if m.contains(vars::WAIT_TIMEOUT)));
    }

    #[test]
    fn test_blank_paths_are_ignored() {
        let config = load(&[(vars::KUBECONFIG, ""), (vars::CONTEXT, "")]).unwrap();
        assert!(config.kubeconfig.is_none());
        assert!(config.context.is_none());
    }
}
