// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) owned by the relocation operator.
//!
//! # Resource Types
//!
//! - [`ClusterRelocation`] - Cluster-scoped request to move the cluster's public
//!   ingress identity (apps domain and ingress certificate) to a new domain
//!
//! Platform resources that are only read or patched (`IngressController`, the
//! cluster `Ingress` config, `Route`, `ClusterOperator`) live in [`crate::openshift`].
//!
//! # Example: Requesting a Relocation
//!
//! ```rust,no_run
//! use ingress_relocator::crd::{ClusterRelocationSpec, SecretReference};
//!
//! // Self-signed certificate for *.apps.example.com
//! let generated = ClusterRelocationSpec {
//!     domain: "example.com".to_string(),
//!     ingress_cert_ref: None,
//! };
//!
//! // Certificate issued elsewhere (e.g. by cert-manager)
//! let supplied = ClusterRelocationSpec {
//!     domain: "example.com".to_string(),
//!     ingress_cert_ref: Some(SecretReference {
//!         name: "wildcard-apps".to_string(),
//!         namespace: "cert-manager".to_string(),
//!     }),
//! };
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a secret in an arbitrary namespace.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
pub struct SecretReference {
    /// Name of the secret.
    #[serde(default)]
    pub name: String,

    /// Namespace of the secret.
    #[serde(default)]
    pub namespace: String,
}

impl SecretReference {
    /// Build a reference from a name and namespace.
    #[must_use]
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

impl std::fmt::Display for SecretReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. Common types include: Ready, Available, Progressing, Degraded, Failed.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// `ClusterRelocation` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRelocationStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

/// `ClusterRelocation` declares the public identity a cluster should be reachable under.
///
/// When `ingressCertRef` is omitted a self-signed wildcard certificate for
/// `*.apps.<domain>` is generated and kept in sync with the domain. When it is set,
/// the referenced TLS secret is copied (never modified) into the namespaces the
/// ingress stack reads from.
///
/// # Example
///
/// ```yaml
/// apiVersion: rhsyseng.github.io/v1beta1
/// kind: ClusterRelocation
/// metadata:
///   name: cluster
/// spec:
///   domain: example.com
///   ingressCertRef:
///     name: wildcard-apps
///     namespace: cert-manager
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "rhsyseng.github.io",
    version = "v1beta1",
    kind = "ClusterRelocation",
    doc = "ClusterRelocation moves the cluster's apps domain and ingress certificate to a new base domain, and reverts them when deleted."
)]
#[kube(status = "ClusterRelocationStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterRelocationSpec {
    /// New base domain of the cluster (e.g. "example.com").
    ///
    /// The apps domain becomes `apps.<domain>`.
    #[schemars(regex(
        pattern = r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)*[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$"
    ))]
    pub domain: String,

    /// Existing TLS secret to use for ingress instead of a generated self-signed certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_cert_ref: Option<SecretReference>,
}
