// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::{ProviderError, Result};
use kube::{
    discovery::{ApiResource, Discovery},
    Client,
};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

fn describe(ar: &ApiResource) -> String {
    format!("{} ({})", ar.kind, ar.api_version)
}

/// Wait for a CRD to be served by the cluster, giving up after `timeout`.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_crd(client: &Client, ar: &ApiResource, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match crd_is_served(client, ar).await {
            Ok(true) => {
                info!("CRD {} is available", describe(ar));
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "CRD {} not yet available, waiting {} seconds...",
                    describe(ar),
                    interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for CRD {}: {}, retrying in {} seconds...",
                    describe(ar),
                    e,
                    interval
                );
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ProviderError::CrdNotServed(describe(ar)));
        }
        sleep(Duration::from_secs(interval).min(deadline - now)).await;

        // Exponential backoff with max cap
        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Check if the group/version/kind of `ar` is served, using API discovery.
pub async fn crd_is_served(client: &Client, ar: &ApiResource) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[ar.group.as_str()])
        .run()
        .await?;

    for group in discovery.groups() {
        if group.name() == ar.group {
            for (candidate, _) in group.versioned_resources(&ar.version) {
                if candidate.kind == ar.kind {
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}
