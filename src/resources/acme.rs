// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `acme.cert-manager.io/v1` kinds: `Challenge` and `Order`, plus the
//! ACME solver configuration they share with issuers.

use super::meta::{preserve_unknown_fields, IssuerReference, SecretKeySelector};
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A Challenge is a type to represent a Challenge request with an ACME server.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(group = "acme.cert-manager.io", version = "v1", kind = "Challenge")]
#[kube(namespaced)]
#[kube(status = "ChallengeStatus")]
#[serde(rename_all = "camelCase")]
pub struct ChallengeSpec {
    /// The URL of the ACME Challenge resource for this challenge.
    pub url: String,
    /// The URL to the ACME Authorization resource that this challenge is a part of.
    #[serde(rename = "authorizationURL")]
    pub authorization_url: String,
    /// The identifier that this challenge is for, e.g. `example.com`.
    pub dns_name: String,
    /// Whether this challenge is for a wildcard identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wildcard: Option<bool>,
    /// The type of ACME challenge, `HTTP-01` or `DNS-01`.
    #[serde(rename = "type")]
    pub challenge_type: String,
    /// The ACME challenge token for this challenge.
    pub token: String,
    /// The ACME challenge key for this challenge.
    pub key: String,
    /// Contains the domain solving configuration that should be used to solve this challenge.
    pub solver: AcmeChallengeSolver,
    /// Reference to the issuer that created this challenge.
    pub issuer_ref: IssuerReference,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeStatus {
    /// Whether this challenge is currently being processed by cert-manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing: Option<bool>,
    /// Whether the challenge has been presented to the solver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presented: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Last observed ACME state, e.g. `pending`, `valid` or `invalid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Order is a type to represent an Order with an ACME server.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(group = "acme.cert-manager.io", version = "v1", kind = "Order")]
#[kube(namespaced)]
#[kube(status = "OrderStatus")]
#[serde(rename_all = "camelCase")]
pub struct OrderSpec {
    /// The PEM encoded, base64 encoded x509 certificate request to be submitted to the ACME server.
    pub request: String,
    /// Reference to the issuer that should be used to fulfil this order.
    pub issuer_ref: IssuerReference,
    /// The common name included in the certificate request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    /// DNS names included in the certificate request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_names: Vec<String>,
    /// IP addresses included in the certificate request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses: Vec<String>,
    /// Requested validity duration of the certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "finalizeURL", skip_serializing_if = "Option::is_none")]
    pub finalize_url: Option<String>,
    /// The PEM encoded certificate chain once the order is valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    /// Last observed ACME state, e.g. `pending`, `ready`, `valid` or `errored`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// An ACMEChallengeSolver describes how to solve ACME challenges for the
/// issuer it is part of.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeChallengeSolver {
    /// Selects a set of DNSNames on the Certificate resource that should be solved using this solver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<CertificateDnsNameSelector>,
    /// Configures cert-manager to attempt to complete authorizations by performing the HTTP01 challenge flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http01: Option<AcmeChallengeSolverHttp01>,
    /// Configures cert-manager to attempt to complete authorizations by performing the DNS01 challenge flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns01: Option<AcmeChallengeSolverDns01>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDnsNameSelector {
    /// A label selector used to refine the set of certificates this solver applies to.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
    /// List of DNSNames that should be solved using this solver.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_names: Vec<String>,
    /// List of DNSZones that should be solved using this solver.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_zones: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeChallengeSolverHttp01 {
    /// Solve challenges by creating or modifying Ingress resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress: Option<AcmeChallengeSolverHttp01Ingress>,
    /// Solve challenges by creating HTTPRoutes of the Gateway API.
    #[serde(rename = "gatewayHTTPRoute", skip_serializing_if = "Option::is_none")]
    pub gateway_http_route: Option<AcmeChallengeSolverHttp01GatewayHttpRoute>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeChallengeSolverHttp01Ingress {
    /// The IngressClass to use when creating Ingress resources to solve ACME challenges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,
    /// The ingress class to use, set through the `kubernetes.io/ingress.class` annotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Name of an existing Ingress resource to edit instead of creating new ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Service type used for the solver service, `NodePort` by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeChallengeSolverHttp01GatewayHttpRoute {
    /// Custom labels added to the created HTTPRoutes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    /// Gateways the created HTTPRoutes attach to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_refs: Vec<ParentReference>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParentReference {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeChallengeSolverDns01 {
    /// `None` (default) or `Follow` to follow CNAME records on `_acme-challenge`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cname_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudflare: Option<AcmeIssuerDns01ProviderCloudflare>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route53: Option<AcmeIssuerDns01ProviderRoute53>,
    #[serde(rename = "acmeDNS", skip_serializing_if = "Option::is_none")]
    pub acme_dns: Option<AcmeIssuerDns01ProviderAcmeDns>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rfc2136: Option<AcmeIssuerDns01ProviderRfc2136>,
    /// Configure an external webhook based DNS01 challenge solver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<AcmeIssuerDns01ProviderWebhook>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeIssuerDns01ProviderCloudflare {
    /// Email of the account, only required when using API key based authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_secret_ref: Option<SecretKeySelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token_secret_ref: Option<SecretKeySelector>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeIssuerDns01ProviderRoute53 {
    /// Always set the region when using AccessKeyID and SecretAccessKey.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// If set, the provider will manage only this zone in Route53.
    #[serde(rename = "hostedZoneID", skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<String>,
    /// Role is a Role ARN which the Route53 provider will assume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(rename = "accessKeyIDSecretRef", skip_serializing_if = "Option::is_none")]
    pub access_key_id_secret_ref: Option<SecretKeySelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_access_key_secret_ref: Option<SecretKeySelector>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeIssuerDns01ProviderAcmeDns {
    pub host: String,
    pub account_secret_ref: SecretKeySelector,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeIssuerDns01ProviderRfc2136 {
    /// The IP address or hostname of an authoritative DNS server supporting RFC2136.
    pub nameserver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsig_key_name: Option<String>,
    /// One of `HMACMD5`, `HMACSHA1`, `HMACSHA256` or `HMACSHA512`.
    #[serde(rename = "tsigAlgorithm", skip_serializing_if = "Option::is_none")]
    pub tsig_algorithm: Option<String>,
    #[serde(rename = "tsigSecretSecretRef", skip_serializing_if = "Option::is_none")]
    pub tsig_secret_secret_ref: Option<SecretKeySelector>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcmeIssuerDns01ProviderWebhook {
    /// The API group name that should be used when POSTing ChallengePayload resources to the webhook apiserver.
    pub group_name: String,
    /// The name of the solver to use, as defined in the webhook provider implementation.
    pub solver_name: String,
    /// Additional configuration that should be passed to the webhook apiserver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub config: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::{CustomResourceExt, Resource};

    #[test]
    fn test_challenge_api_coordinates() {
        assert_eq!(Challenge::group(&()), "acme.cert-manager.io");
        assert_eq!(Challenge::version(&()), "v1");
        assert_eq!(Challenge::plural(&()), "challenges");
        assert_eq!(Challenge::crd().spec.scope, "Namespaced");
    }

    #[test]
    fn test_challenge_serializes_renamed_fields() {
        let spec = ChallengeSpec {
            url: "https://acme.example/chall/1".to_string(),
            authorization_url: "https://acme.example/authz/1".to_string(),
            dns_name: "example.com".to_string(),
            wildcard: None,
            challenge_type: "HTTP-01".to_string(),
            token: "token".to_string(),
            key: "key".to_string(),
            solver: AcmeChallengeSolver::default(),
            issuer_ref: IssuerReference {
                name: "letsencrypt".to_string(),
                kind: Some("ClusterIssuer".to_string()),
                group: None,
            },
        };

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["authorizationURL"], "https://acme.example/authz/1");
        assert_eq!(json["type"], "HTTP-01");
        assert_eq!(json["issuerRef"]["kind"], "ClusterIssuer");
        assert!(json.get("wildcard").is_none());
    }

    #[test]
    fn test_webhook_config_preserves_unknown_fields() {
        let crd = serde_json::to_value(Order::crd()).unwrap();
        assert_eq!(crd["spec"]["names"]["plural"], "orders");

        let solver: AcmeChallengeSolver = serde_json::from_value(serde_json::json!({
            "dns01": {"webhook": {"groupName": "acme.example.com", "solverName": "example", "config": {"apiUrl": "https://dns"}}}
        }))
        .unwrap();
        let webhook = solver.dns01.unwrap().webhook.unwrap();
        assert_eq!(webhook.config.unwrap()["apiUrl"], "https://dns");
    }
}
