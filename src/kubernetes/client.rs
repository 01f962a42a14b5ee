// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation from provider configuration

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KConfig};
use tracing::{debug, info, instrument};

/// Create a Kubernetes client honouring the configured kubeconfig and context
#[instrument(skip(config), fields(kubeconfig = ?config.kubeconfig, context = ?config.context))]
pub async fn create_client(config: &ProviderConfig) -> Result<Client> {
    let options = KubeConfigOptions {
        context: config.context.clone(),
        ..Default::default()
    };

    let client_config = match (&config.kubeconfig, &config.context) {
        (Some(path), _) => {
            info!("Loading kubeconfig from {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                ProviderError::KubeconfigError(format!(
                    "Failed to read kubeconfig {}: {}",
                    path.display(),
                    e
                ))
            })?;
            KConfig::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| {
                    ProviderError::KubeconfigError(format!("Failed to create config: {}", e))
                })?
        }
        (None, Some(context)) => {
            info!("Using kubeconfig context '{}'", context);
            KConfig::from_kubeconfig(&options).await.map_err(|e| {
                ProviderError::KubeconfigError(format!("Failed to create config: {}", e))
            })?
        }
        (None, None) => KConfig::infer()
            .await
            .map_err(|e| ProviderError::KubeconfigError(format!("Failed to infer config: {}", e)))?,
    };

    debug!("Connecting to cluster at {}", client_config.cluster_url);

    Client::try_from(client_config)
        .map_err(|e| ProviderError::KubeconfigError(format!("Failed to create client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_missing_kubeconfig_file_is_reported() {
        let config = ProviderConfig {
            kubeconfig: Some(PathBuf::from("/nonexistent/kube-crd-provider/kubeconfig")),
            ..Default::default()
        };

        let Err(err) = create_client(&config).await else {
            panic!("expected an error");
        };
        assert!(matches!(err, ProviderError::KubeconfigError(_)));
        assert!(err.to_string().contains("/nonexistent/kube-crd-provider/kubeconfig"));
    }
}
