// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod error;
pub mod jsonpath;
pub mod kubernetes;
pub mod manifest;
pub mod naming;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod state;
pub mod validation;
pub mod wait;

#[cfg(test)]
pub mod test_utils;

pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
pub use provider::Provider;
