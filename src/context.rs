// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared configuration and context for the relocation controller.
//!
//! Every well-known namespace and resource name the reconcilers touch is a field
//! of [`RelocationConfig`]. Defaults come from [`crate::constants`]; a YAML file can
//! override any subset of them:
//!
//! ```yaml
//! ingressNamespace: openshift-ingress
//! routeExclusions:
//!   - openshift-console
//!   - openshift-authentication
//! clusterOperatorPollIntervalSecs: 5
//! ```
//!
//! The controller receives an `Arc<Context>` holding the cluster store and the config.

use crate::constants::{
    APISERVER_CLUSTER_OPERATOR, AUTHENTICATION_NAMESPACE, CLUSTER_INGRESS_CONFIG,
    CLUSTER_OPERATOR_POLL_INTERVAL_SECS, CONFIG_NAMESPACE, CONSOLE_NAMESPACE,
    COPIED_SECRET_NAME, DEFAULT_INGRESS_CONTROLLER, DEFAULT_ROUTER_NAME, GENERATED_SECRET_NAME,
    INGRESS_NAMESPACE, INGRESS_OPERATOR_NAMESPACE, INGRESS_WILDCARD_PREFIX,
    KLUSTERLET_ADDON_NAMESPACE,
};
use crate::store::ClusterStore;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Well-known names and tunables of the ingress stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelocationConfig {
    /// Namespace the router reads its default certificate from
    pub ingress_namespace: String,

    /// Namespace component routes read serving certificates from
    pub config_namespace: String,

    /// Name of the generated self-signed certificate secret
    pub generated_secret_name: String,

    /// Name of replicas of a user-supplied certificate secret
    pub copied_secret_name: String,

    /// Namespace of the `IngressController`
    pub ingress_controller_namespace: String,

    /// Name of the `IngressController`
    pub ingress_controller_name: String,

    /// Name of the cluster `Ingress` config
    pub ingress_config_name: String,

    /// Router whose admitted hosts are checked for staleness
    pub default_router_name: String,

    /// Cluster operator to wait for before listing routes
    pub apiserver_operator: String,

    /// Namespaces whose routes are never deleted.
    ///
    /// `open-cluster-management-agent-addon` works around a Klusterlet add-on bug
    /// and can be dropped once the add-on stops pinning its route hosts.
    pub route_exclusions: Vec<String>,

    /// Prefix placed before the domain in certificate names (`*.apps`)
    pub wildcard_prefix: String,

    /// Interval between cluster operator readiness checks
    pub cluster_operator_poll_interval_secs: u64,
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            ingress_namespace: INGRESS_NAMESPACE.to_string(),
            config_namespace: CONFIG_NAMESPACE.to_string(),
            generated_secret_name: GENERATED_SECRET_NAME.to_string(),
            copied_secret_name: COPIED_SECRET_NAME.to_string(),
            ingress_controller_namespace: INGRESS_OPERATOR_NAMESPACE.to_string(),
            ingress_controller_name: DEFAULT_INGRESS_CONTROLLER.to_string(),
            ingress_config_name: CLUSTER_INGRESS_CONFIG.to_string(),
            default_router_name: DEFAULT_ROUTER_NAME.to_string(),
            apiserver_operator: APISERVER_CLUSTER_OPERATOR.to_string(),
            route_exclusions: vec![
                CONSOLE_NAMESPACE.to_string(),
                AUTHENTICATION_NAMESPACE.to_string(),
                KLUSTERLET_ADDON_NAMESPACE.to_string(),
            ],
            wildcard_prefix: INGRESS_WILDCARD_PREFIX.to_string(),
            cluster_operator_poll_interval_secs: CLUSTER_OPERATOR_POLL_INTERVAL_SECS,
        }
    }
}

impl RelocationConfig {
    /// Load a config from a YAML file. Fields missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Parse a config from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML for this structure, or if
    /// the cluster operator poll interval is zero.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        anyhow::ensure!(
            config.cluster_operator_poll_interval_secs > 0,
            "clusterOperatorPollIntervalSecs must be at least 1"
        );
        Ok(config)
    }

    /// `apps.<domain>`
    #[must_use]
    pub fn apps_domain(&self, domain: &str) -> String {
        format!("{}.{domain}", crate::constants::APPS_SUBDOMAIN)
    }

    /// Delay between readiness checks, never shorter than one second.
    #[must_use]
    pub fn cluster_operator_poll_interval(&self) -> Duration {
        Duration::from_secs(self.cluster_operator_poll_interval_secs.max(1))
    }

    /// Whether routes in `namespace` must be left alone.
    #[must_use]
    pub fn is_route_excluded(&self, namespace: &str) -> bool {
        self.route_exclusions.iter().any(|ns| ns == namespace)
    }
}

/// Shared context passed to the relocation controller.
#[derive(Clone)]
pub struct Context {
    /// Cluster API access
    pub store: Arc<dyn ClusterStore>,

    /// Well-known names
    pub config: RelocationConfig,
}

impl Context {
    #[must_use]
    pub fn new(store: Arc<dyn ClusterStore>, config: RelocationConfig) -> Self {
        Self { store, config }
    }
}
