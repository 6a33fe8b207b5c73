// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the ingress relocation operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance. Well-known names are
//! only defaults: the reconcilers read them through [`crate::context::RelocationConfig`].

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `ClusterRelocation` CRD
pub const API_GROUP: &str = "rhsyseng.github.io";

/// API version for the `ClusterRelocation` CRD
pub const API_VERSION: &str = "v1beta1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "rhsyseng.github.io/v1beta1";

/// Kind name for `ClusterRelocation` resource
pub const KIND_CLUSTER_RELOCATION: &str = "ClusterRelocation";

/// Finalizer that keeps a `ClusterRelocation` around until the ingress state is reverted
pub const RELOCATION_FINALIZER: &str = "clusterrelocation.rhsyseng.github.io/ingress-finalizer";

/// Field manager used for patches issued by this operator
pub const FIELD_MANAGER: &str = "ingress-relocator";

// ============================================================================
// Well-Known Namespaces
// ============================================================================

/// Namespace served by the default ingress controller's router pods
pub const INGRESS_NAMESPACE: &str = "openshift-ingress";

/// Namespace holding cluster-wide configuration secrets
pub const CONFIG_NAMESPACE: &str = "openshift-config";

/// Namespace of the `IngressController` resources
pub const INGRESS_OPERATOR_NAMESPACE: &str = "openshift-ingress-operator";

/// Namespace of the web console
pub const CONSOLE_NAMESPACE: &str = "openshift-console";

/// Namespace of the OAuth server
pub const AUTHENTICATION_NAMESPACE: &str = "openshift-authentication";

/// Namespace of the Klusterlet add-on agents
pub const KLUSTERLET_ADDON_NAMESPACE: &str = "open-cluster-management-agent-addon";

// ============================================================================
// Well-Known Resource Names
// ============================================================================

/// Name of the self-signed certificate secret generated when no certificate is supplied
pub const GENERATED_SECRET_NAME: &str = "generated-ingress-secret";

/// Name given to replicas of a user-supplied certificate secret
pub const COPIED_SECRET_NAME: &str = "copied-ingress-secret";

/// Name of the default `IngressController`
pub const DEFAULT_INGRESS_CONTROLLER: &str = "default";

/// Name of the cluster `Ingress` config singleton
pub const CLUSTER_INGRESS_CONFIG: &str = "cluster";

/// Router name reported in route status by the default ingress controller
pub const DEFAULT_ROUTER_NAME: &str = "default";

/// Cluster operator that restarts whenever the apps domain changes
pub const APISERVER_CLUSTER_OPERATOR: &str = "openshift-apiserver";

// ============================================================================
// Certificate Constants
// ============================================================================

/// Wildcard prefix placed in front of the relocation domain for ingress certificates
pub const INGRESS_WILDCARD_PREFIX: &str = "*.apps";

/// Prefix of the apps domain (`apps.<domain>`)
pub const APPS_SUBDOMAIN: &str = "apps";

/// Validity of generated self-signed ingress certificates (days)
pub const GENERATED_CERT_VALIDITY_DAYS: i64 = 365;

/// Organization placed in generated certificate subjects
pub const GENERATED_CERT_ORGANIZATION: &str = "Cluster Relocation";

// ============================================================================
// Component Route Constants
// ============================================================================

/// Component route name for the web console
pub const CONSOLE_ROUTE_NAME: &str = "console";

/// Hostname label of the web console route
pub const CONSOLE_ROUTE_HOST_LABEL: &str = "console-openshift-console";

/// Component route name for the CLI downloads
pub const DOWNLOADS_ROUTE_NAME: &str = "downloads";

/// Hostname label of the CLI downloads route
pub const DOWNLOADS_ROUTE_HOST_LABEL: &str = "downloads-openshift-console";

/// Component route name for the OAuth server
pub const OAUTH_ROUTE_NAME: &str = "oauth-openshift";

/// Hostname label of the OAuth server route
pub const OAUTH_ROUTE_HOST_LABEL: &str = "oauth-openshift";

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Requeue duration after a successful reconciliation (5 minutes)
pub const SUCCESS_REQUEUE_DURATION_SECS: u64 = 300;

/// Upper bound for a single reconciliation cycle, including the cluster operator wait
pub const DEFAULT_CYCLE_TIMEOUT_SECS: u64 = 900;

/// Number of times a read-modify-write is restarted after a write conflict
pub const MAX_CONFLICT_RETRIES: u32 = 5;

// ============================================================================
// Cluster Operator Polling Constants
// ============================================================================

/// Interval between cluster operator readiness checks (10 seconds)
pub const CLUSTER_OPERATOR_POLL_INTERVAL_SECS: u64 = 10;

// ============================================================================
// Kubernetes API Constants
// ============================================================================

/// Page size for paginated list calls
pub const KUBE_LIST_PAGE_SIZE: u32 = 100;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
