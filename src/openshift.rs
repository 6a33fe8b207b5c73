// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed views of the OpenShift platform resources the operator touches.
//!
//! None of these resources are created by the operator. The types only model the
//! fields that are read or merge-patched; everything else on the live objects is
//! left alone because writes are JSON merge patches restricted to owned fields.
//!
//! - [`IngressController`] - `operator.openshift.io/v1`, holds the default ingress certificate
//! - [`IngressConfig`] - `config.openshift.io/v1` `Ingress`, holds the apps domain and component routes
//! - [`Route`] - `route.openshift.io/v1`, inspected and deleted when its host is stale
//! - [`ClusterOperator`] - `config.openshift.io/v1`, polled for readiness

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a secret in the namespace implied by the referring resource.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
pub struct SecretNameReference {
    pub name: String,
}

impl SecretNameReference {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// The subset of `IngressController.spec` managed by the operator.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[kube(
    group = "operator.openshift.io",
    version = "v1",
    kind = "IngressController",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct IngressControllerSpec {
    /// Secret (in `openshift-ingress`) served by the router for routes without their own certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_certificate: Option<SecretNameReference>,
}

/// A hostname override for a platform component route.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRouteSpec {
    /// Namespace of the component route.
    pub namespace: String,

    /// Name of the component route.
    pub name: String,

    /// Hostname the component should be served under.
    pub hostname: String,

    /// Secret (in `openshift-config`) with the serving certificate for the hostname.
    pub serving_cert_key_pair_secret: SecretNameReference,
}

/// The subset of the cluster `Ingress` config spec managed by the operator.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[kube(
    group = "config.openshift.io",
    version = "v1",
    kind = "Ingress",
    root = "IngressConfig",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct IngressConfigSpec {
    /// Domain used for new routes instead of the cluster's base ingress domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apps_domain: Option<String>,

    /// Hostname and certificate overrides for platform component routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_routes: Option<Vec<ComponentRouteSpec>>,
}

/// Route spec fields the operator looks at.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[kube(
    group = "route.openshift.io",
    version = "v1",
    kind = "Route",
    namespaced,
    status = "RouteStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Route status as reported by the routers admitting it.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
pub struct RouteStatus {
    #[serde(default)]
    pub ingress: Vec<RouteIngress>,
}

/// Admission of a route by one router.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteIngress {
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub router_name: String,
}

impl Route {
    /// Hosts this route was admitted under by the given router.
    pub fn hosts_for_router<'a>(&'a self, router_name: &'a str) -> impl Iterator<Item = &'a str> {
        self.status
            .iter()
            .flat_map(|status| status.ingress.iter())
            .filter(move |ingress| ingress.router_name == router_name)
            .map(|ingress| ingress.host.as_str())
    }
}

/// `ClusterOperator` has no spec fields the operator cares about.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[kube(
    group = "config.openshift.io",
    version = "v1",
    kind = "ClusterOperator",
    status = "ClusterOperatorStatus",
    derive = "PartialEq"
)]
pub struct ClusterOperatorSpec {}

/// Status of a platform component.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
pub struct ClusterOperatorStatus {
    #[serde(default)]
    pub conditions: Vec<ClusterOperatorCondition>,
}

/// A single `Available`/`Progressing`/`Degraded` observation.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
pub struct ClusterOperatorCondition {
    pub r#type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClusterOperator {
    /// Status string ("True", "False", "Unknown") of a condition type, if reported.
    #[must_use]
    pub fn condition_status(&self, condition_type: &str) -> Option<&str> {
        self.status
            .as_ref()?
            .conditions
            .iter()
            .find(|c| c.r#type == condition_type)
            .map(|c| c.status.as_str())
    }

    /// A component is settled when it is available, not progressing and not degraded.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.condition_status("Available") == Some("True")
            && self.condition_status("Progressing") == Some("False")
            && self.condition_status("Degraded") == Some("False")
    }
}
