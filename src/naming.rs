// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Attribute and type naming conventions

use crate::constants::TYPE_NAME_PREFIX;

/// Convert a Kubernetes JSON field name to its attribute name.
///
/// Acronyms are kept together, so `isCA` becomes `is_ca` and
/// `caBundle` becomes `ca_bundle`. Digits stick to the preceding word.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == '.' || c == '/' {
            out.push('_');
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let starts_word = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if starts_word && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    out
}

/// Type name of the resource exposing `kind` in `group`/`version`,
/// e.g. `k8s_acme_cert_manager_io_challenge_v1`.
pub fn type_name(group: &str, kind: &str, version: &str) -> String {
    let group = group.replace(['.', '-'], "_");
    if group.is_empty() {
        format!("{}_{}_{}", TYPE_NAME_PREFIX, to_snake_case(kind), version)
    } else {
        format!(
            "{}_{}_{}_{}",
            TYPE_NAME_PREFIX,
            group,
            to_snake_case(kind),
            version
        )
    }
}
