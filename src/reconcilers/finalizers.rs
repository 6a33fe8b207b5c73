// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer management for `ClusterRelocation` resources.
//!
//! The relocation finalizer keeps a deleted request around until the cluster
//! configuration has been reverted. It is added on the first reconciliation and
//! removed only after a successful revert.
//!
//! # Example
//!
//! ```rust,ignore
//! use ingress_relocator::constants::RELOCATION_FINALIZER;
//! use ingress_relocator::reconcilers::finalizers::{ensure_finalizer, remove_finalizer};
//!
//! if relocation.metadata.deletion_timestamp.is_some() {
//!     reconciler.cleanup(&relocation).await?;
//!     remove_finalizer(store, &relocation, RELOCATION_FINALIZER).await?;
//! } else {
//!     ensure_finalizer(store, &relocation, RELOCATION_FINALIZER).await?;
//! }
//! ```

use crate::crd::ClusterRelocation;
use crate::errors::Result;
use crate::store::ClusterStore;
use kube::ResourceExt;
use serde_json::json;
use tracing::info;

/// Returns `true` if `finalizer` is present on the relocation.
#[must_use]
pub fn has_finalizer(relocation: &ClusterRelocation, finalizer: &str) -> bool {
    relocation.finalizers().iter().any(|f| f == finalizer)
}

/// Add a finalizer to a relocation if not already present.
///
/// The operation is idempotent: nothing is written when the finalizer is
/// already there.
///
/// # Returns
///
/// `true` if the finalizer was added by this call.
///
/// # Errors
///
/// Returns an error if the patch fails.
pub async fn ensure_finalizer(
    store: &dyn ClusterStore,
    relocation: &ClusterRelocation,
    finalizer: &str,
) -> Result<bool> {
    if has_finalizer(relocation, finalizer) {
        return Ok(false);
    }

    let name = relocation.name_any();
    info!("Adding finalizer {} to ClusterRelocation {}", finalizer, name);

    let mut finalizers = relocation.finalizers().to_vec();
    finalizers.push(finalizer.to_string());

    let patch = json!({ "metadata": { "finalizers": finalizers } });
    store.patch_relocation(&name, &patch).await?;

    Ok(true)
}

/// Remove a finalizer from a relocation.
///
/// The operation is idempotent: nothing is written when the finalizer is
/// already absent. Other finalizers are preserved.
///
/// # Returns
///
/// `true` if the finalizer was removed by this call.
///
/// # Errors
///
/// Returns an error if the patch fails. A relocation that is already gone is
/// not an error.
pub async fn remove_finalizer(
    store: &dyn ClusterStore,
    relocation: &ClusterRelocation,
    finalizer: &str,
) -> Result<bool> {
    if !has_finalizer(relocation, finalizer) {
        return Ok(false);
    }

    let name = relocation.name_any();
    info!(
        "Removing finalizer {} from ClusterRelocation {}",
        finalizer, name
    );

    let finalizers: Vec<&String> = relocation
        .finalizers()
        .iter()
        .filter(|f| *f != finalizer)
        .collect();

    let patch = json!({ "metadata": { "finalizers": finalizers } });
    match store.patch_relocation(&name, &patch).await {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
