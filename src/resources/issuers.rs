// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `cert-manager.io/v1` `Issuer` and `ClusterIssuer`, which share one
//! configuration block.

use super::acme::AcmeChallengeSolver;
use super::meta::{Condition, LocalObjectReference, SecretKeySelector};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// An Issuer represents a certificate issuing authority which can be
/// referenced as part of `issuerRef` fields. It is scoped to a single namespace.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(group = "cert-manager.io", version = "v1", kind = "Issuer")]
#[kube(namespaced)]
#[kube(status = "IssuerStatus")]
#[serde(rename_all = "camelCase")]
pub struct IssuerSpec {
    #[serde(flatten)]
    pub config: IssuerConfig,
}

/// A ClusterIssuer represents a certificate issuing authority which can be
/// referenced as part of `issuerRef` fields. It is similar to an Issuer,
/// however it is cluster-scoped.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(group = "cert-manager.io", version = "v1", kind = "ClusterIssuer")]
#[kube(status = "IssuerStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterIssuerSpec {
    #[serde(flatten)]
    pub config: IssuerConfig,
}

/// Exactly one of the issuer types should be set.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuerConfig {
    /// Configures this issuer to communicate with an RFC8555 (ACME) server to obtain signed x509 certificates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acme: Option<AcmeIssuer>,
    /// Configures this issuer to sign certificates using a signing CA keypair stored in a Secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca: Option<CaIssuer>,
    /// Configures this issuer to sign certificates using a HashiCorp Vault PKI backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault: Option<VaultIssuer>,
    /// Configures this issuer to 'self sign' certificates using the private key used to create the CertificateRequest object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_signed: Option<SelfSignedIssuer>,
    /// Configures this issuer to sign certificates using a Venafi TPP or Venafi Cloud policy zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venafi: Option<VenafiIssuer>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeIssuer {
    /// The URL used to access the ACME server's 'directory' endpoint.
    pub server: String,
    /// The email address to be associated with the ACME account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The name of a Kubernetes Secret resource that will be used to store the automatically generated ACME account private key.
    pub private_key_secret_ref: SecretKeySelector,
    /// Use a certificate chain other than the ACME server's default one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_chain: Option<String>,
    /// Base64-encoded bundle of PEM CAs used to validate the ACME server's certificate chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<String>,
    /// Skip verifying the ACME server's TLS certificate. Insecure.
    #[serde(rename = "skipTLSVerify", skip_serializing_if = "Option::is_none")]
    pub skip_tls_verify: Option<bool>,
    /// Account binding for ACME servers that require External Account Binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_account_binding: Option<AcmeExternalAccountBinding>,
    /// Disable generating a new ACME account key when the Secret is missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_account_key_generation: Option<bool>,
    /// Request certificates with the ACME `duration` field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_duration_feature: Option<bool>,
    /// Solvers is a list of challenge solvers that will be used to solve ACME challenges for the matching domains.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub solvers: Vec<AcmeChallengeSolver>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeExternalAccountBinding {
    /// ID of the CA key that the External Account is bound to.
    #[serde(rename = "keyID")]
    pub key_id: String,
    /// Secret holding the symmetric MAC key of the External Account Binding.
    pub key_secret_ref: SecretKeySelector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_algorithm: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaIssuer {
    /// Name of the Secret containing the signing CA keypair.
    pub secret_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crl_distribution_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ocsp_servers: Vec<String>,
    #[serde(rename = "issuingCertificateURLs", default, skip_serializing_if = "Vec::is_empty")]
    pub issuing_certificate_urls: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultIssuer {
    /// Connection address for the Vault server, e.g. `https://vault.example.com:8200`.
    pub server: String,
    /// Mount path of the Vault PKI backend's `sign` endpoint.
    pub path: String,
    /// Vault namespace, Vault Enterprise only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<String>,
    /// How cert-manager authenticates with Vault.
    pub auth: VaultAuth,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultAuth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_secret_ref: Option<SecretKeySelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_role: Option<VaultAppRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<VaultKubernetesAuth>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultAppRole {
    pub path: String,
    pub role_id: String,
    pub secret_ref: SecretKeySelector,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultKubernetesAuth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretKeySelector>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelfSignedIssuer {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crl_distribution_points: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VenafiIssuer {
    /// The Venafi Policy Zone to use for this issuer.
    pub zone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tpp: Option<VenafiTpp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud: Option<VenafiCloud>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VenafiTpp {
    pub url: String,
    pub credentials_ref: LocalObjectReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VenafiCloud {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub api_token_secret_ref: SecretKeySelector,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuerStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acme: Option<AcmeIssuerStatus>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeIssuerStatus {
    /// URI of the registered ACME account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_registered_email: Option<String>,
}
