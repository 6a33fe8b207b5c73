// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Ingress Relocator - Ingress Relocation Operator for OpenShift
//!
//! Ingress Relocator moves an OpenShift cluster's public ingress identity (apps
//! domain and ingress certificate) to a new base domain, and reverts it when the
//! request is withdrawn.
//!
//! ## Overview
//!
//! This library provides the core functionality of the operator:
//!
//! - The `ClusterRelocation` Custom Resource Definition
//! - Self-signed wildcard certificate generation, or replication of a supplied one
//! - Merge-patching of the `IngressController` and cluster `Ingress` config
//! - Invalidation of routes still admitted under the previous domain
//! - Revert of the ingress configuration on deletion
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`openshift`] - Typed views of the platform resources the operator patches
//! - [`reconcilers`] - Reconciliation logic
//! - [`store`] - Cluster API seam used by the reconcilers
//! - [`certificates`] - TLS key pair generation and inspection
//! - [`context`] - Shared context and well-known names
//!
//! ## Example
//!
//! ```rust,no_run
//! use ingress_relocator::context::{Context, RelocationConfig};
//! use ingress_relocator::crd::{ClusterRelocation, ClusterRelocationSpec};
//! use ingress_relocator::reconcilers::IngressReconciler;
//! use ingress_relocator::store::KubeStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = kube::Client::try_default().await?;
//! let ctx = Context::new(Arc::new(KubeStore::new(client)), RelocationConfig::default());
//!
//! let relocation = ClusterRelocation::new(
//!     "cluster",
//!     ClusterRelocationSpec {
//!         domain: "example.com".to_string(),
//!         ingress_cert_ref: None,
//!     },
//! );
//!
//! let reconciler = IngressReconciler::from_context(&ctx);
//! reconciler.reconcile(&relocation).await?;
//! reconciler.reset_routes("example.com").await?;
//! # Ok(())
//! # }
//! ```

pub mod certificates;
pub mod constants;
pub mod context;
pub mod crd;
pub mod errors;
pub mod metrics;
pub mod openshift;
pub mod reconcilers;
pub mod status_reasons;
pub mod store;

#[cfg(test)]
mod openshift_tests;
