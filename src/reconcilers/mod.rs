// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for `ClusterRelocation` resources.
//!
//! A relocation moves the cluster's public ingress identity to a new domain and
//! reverts it when the request is deleted.
//!
//! # Reconciliation Architecture
//!
//! Each cycle runs the phases in order and stops at the first error:
//!
//! 1. **Certificate** - provision or copy the ingress TLS secret ([`certificate`])
//! 2. **Cluster config** - point the `IngressController` and the cluster `Ingress`
//!    config at the new domain and secret ([`cluster_config`])
//! 3. **Routes** - once the API server has settled, delete routes still admitted
//!    under the previous domain ([`routes`])
//! 4. **Status** - report the result in the `Ready` condition ([`status`])
//!
//! Every phase is idempotent. Writes go through [`resources::create_or_merge`],
//! which only writes when the desired state differs from the observed one and
//! retries on optimistic-concurrency conflicts.
//!
//! # Available Reconcilers
//!
//! - [`reconcile_relocation`] - Relocates the cluster ingress
//! - [`delete_relocation`] - Reverts the cluster ingress and releases the finalizer
//! - [`IngressReconciler`] - The individual `reconcile`, `cleanup` and
//!   `reset_routes` operations
//!
//! # Example: Using the Reconciler
//!
//! ```rust,no_run
//! use ingress_relocator::context::{Context, RelocationConfig};
//! use ingress_relocator::crd::ClusterRelocation;
//! use ingress_relocator::reconcilers::IngressReconciler;
//!
//! async fn relocate(ctx: &Context, relocation: &ClusterRelocation) -> anyhow::Result<()> {
//!     let reconciler = IngressReconciler::from_context(ctx);
//!     reconciler.reconcile(relocation).await?;
//!     reconciler.reset_routes(&relocation.spec.domain).await?;
//!     Ok(())
//! }
//! ```

pub mod certificate;
pub mod cluster_config;
pub mod cluster_operator;
pub mod finalizers;
pub mod relocation;
pub mod resources;
pub mod retry;
pub mod routes;
pub mod secrets;
pub mod status;

#[cfg(test)]
pub(crate) mod fixtures;

pub use certificate::{provision_certificate, CanonicalSecret};
pub use cluster_config::{revert_cluster_config, sync_cluster_config, ClusterConfigResult};
pub use cluster_operator::wait_for_cluster_operator;
pub use relocation::{
    delete_relocation, reconcile_relocation, record_cycle_timeout, IngressReconciler,
    RelocationOutcome,
};
pub use resources::OperationResult;
pub use routes::reset_routes;
pub use secrets::{copy_secret, validate_secret_type, OwnershipPolicy};
