// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation and CRD discovery.

pub mod client;
pub mod crd;

pub use client::create_client;
pub use crd::{crd_is_served, wait_for_crd};
