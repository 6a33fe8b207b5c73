// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `ClusterRelocation` reconciliation logic.
//!
//! [`IngressReconciler`] exposes the three idempotent operations of a
//! relocation:
//!
//! - [`IngressReconciler::reconcile`] provisions the certificate and points the
//!   ingress singletons at it
//! - [`IngressReconciler::reset_routes`] deletes routes still admitted under the
//!   previous domain
//! - [`IngressReconciler::cleanup`] reverts the ingress singletons
//!
//! [`reconcile_relocation`] and [`delete_relocation`] drive them from the
//! controller: finalizer handling, phase ordering, the `Ready` condition and
//! metrics.

use super::certificate::{provision_certificate, CanonicalSecret};
use super::cluster_config::{revert_cluster_config, sync_cluster_config, ClusterConfigResult};
use super::finalizers::{ensure_finalizer, has_finalizer, remove_finalizer};
use super::routes::reset_routes;
use super::status::RelocationStatusUpdater;
use crate::constants::{KIND_CLUSTER_RELOCATION, RELOCATION_FINALIZER};
use crate::context::{Context, RelocationConfig};
use crate::crd::ClusterRelocation;
use crate::errors::{RelocationError, Result};
use crate::metrics;
use crate::status_reasons::{CONDITION_TYPE_READY, REASON_CYCLE_TIMEOUT, REASON_RELOCATED};
use crate::store::ClusterStore;
use kube::ResourceExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// What a forward sync did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelocationOutcome {
    /// Secret the ingress configuration now references
    pub certificate: CanonicalSecret,
    /// Writes made to the ingress singletons
    pub cluster_config: ClusterConfigResult,
}

/// Relocates and reverts the cluster's ingress identity.
#[derive(Clone)]
pub struct IngressReconciler {
    store: Arc<dyn ClusterStore>,
    config: RelocationConfig,
}

impl IngressReconciler {
    #[must_use]
    pub fn new(store: Arc<dyn ClusterStore>, config: RelocationConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn from_context(ctx: &Context) -> Self {
        Self::new(Arc::clone(&ctx.store), ctx.config.clone())
    }

    #[must_use]
    pub fn config(&self) -> &RelocationConfig {
        &self.config
    }

    /// Converge certificate and ingress configuration on the relocation's domain.
    ///
    /// Running it again with an unchanged relocation writes nothing.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before anything is written. Other errors
    /// abort the cycle; every step already applied is safe to repeat.
    pub async fn reconcile(&self, relocation: &ClusterRelocation) -> Result<RelocationOutcome> {
        let domain = relocation.spec.domain.as_str();
        debug!(relocation = %relocation.name_any(), domain = %domain, "Reconciling ingress");

        let certificate =
            provision_certificate(self.store.as_ref(), &self.config, relocation).await?;
        let cluster_config =
            sync_cluster_config(self.store.as_ref(), &self.config, domain, &certificate).await?;

        Ok(RelocationOutcome {
            certificate,
            cluster_config,
        })
    }

    /// Restore the ingress singletons to their pre-relocation state.
    ///
    /// Secrets are left to garbage collection through their owner references.
    ///
    /// # Errors
    ///
    /// Returns the store error of a failed read or patch.
    pub async fn cleanup(&self, relocation: &ClusterRelocation) -> Result<ClusterConfigResult> {
        debug!(relocation = %relocation.name_any(), "Reverting ingress configuration");
        revert_cluster_config(self.store.as_ref(), &self.config).await
    }

    /// Delete routes whose admitted host does not contain `domain`.
    ///
    /// # Errors
    ///
    /// Returns the error of the readiness wait, the route listing, or a deletion.
    pub async fn reset_routes(&self, domain: &str) -> Result<usize> {
        reset_routes(self.store.as_ref(), &self.config, domain).await
    }
}

/// Reconcile one `ClusterRelocation` from the controller.
///
/// Adds the relocation finalizer, runs the forward sync followed by route
/// invalidation, and reports the result in the `Ready` condition. A relocation
/// marked for deletion is reverted instead.
///
/// # Errors
///
/// Returns the error that failed the cycle, after recording it in the status.
/// A failure to write the status itself is logged and does not mask the
/// cycle's result.
pub async fn reconcile_relocation(ctx: &Context, relocation: &ClusterRelocation) -> Result<()> {
    if relocation.metadata.deletion_timestamp.is_some() {
        return delete_relocation(ctx, relocation).await;
    }

    let name = relocation.name_any();
    let start = Instant::now();
    let reconciler = IngressReconciler::from_context(ctx);

    let result = async {
        ensure_finalizer(ctx.store.as_ref(), relocation, RELOCATION_FINALIZER).await?;
        let outcome = reconciler.reconcile(relocation).await?;
        let deleted = reconciler.reset_routes(&relocation.spec.domain).await?;
        Ok::<_, RelocationError>((outcome, deleted))
    }
    .await;

    let mut status = RelocationStatusUpdater::new(relocation);
    status.set_observed_generation(relocation.metadata.generation);

    match &result {
        Ok((outcome, deleted)) => {
            let apps_domain = ctx.config.apps_domain(&relocation.spec.domain);
            status.set_condition(
                CONDITION_TYPE_READY,
                "True",
                REASON_RELOCATED,
                &format!(
                    "Ingress relocated to {} using {}/{}",
                    apps_domain, outcome.certificate.namespace, outcome.certificate.name
                ),
            );
            metrics::record_reconciliation_success(KIND_CLUSTER_RELOCATION, start.elapsed());
            if outcome.cluster_config.is_changed() || *deleted > 0 {
                info!(
                    relocation = %name,
                    apps_domain = %apps_domain,
                    routes_deleted = deleted,
                    "ClusterRelocation converged"
                );
            } else {
                debug!(relocation = %name, "ClusterRelocation already converged");
            }
        }
        Err(e) => {
            status.set_condition(CONDITION_TYPE_READY, "False", e.reason(), &e.to_string());
            metrics::record_reconciliation_error(KIND_CLUSTER_RELOCATION, start.elapsed());
            metrics::record_error(KIND_CLUSTER_RELOCATION, e.reason());
            if e.is_validation() {
                warn!(relocation = %name, reason = e.reason(), "Invalid ClusterRelocation: {}", e);
            } else {
                error!(
                    relocation = %name,
                    reason = e.reason(),
                    "Failed to reconcile ClusterRelocation: {}", e
                );
            }
        }
    }

    if let Err(e) = status.apply(ctx.store.as_ref()).await {
        warn!(relocation = %name, "Failed to update ClusterRelocation status: {}", e);
    }

    result.map(|_| ())
}

/// Mark a relocation as not ready after its cycle was abandoned at `timeout`.
///
/// The abandoned cycle never reached its own status write, so the condition
/// would otherwise keep describing the previous cycle.
///
/// # Errors
///
/// Returns an error if the status patch fails.
pub async fn record_cycle_timeout(
    ctx: &Context,
    relocation: &ClusterRelocation,
    timeout: Duration,
) -> Result<()> {
    let mut status = RelocationStatusUpdater::new(relocation);
    status.set_observed_generation(relocation.metadata.generation);
    status.set_condition(
        CONDITION_TYPE_READY,
        "False",
        REASON_CYCLE_TIMEOUT,
        &format!(
            "reconciliation did not finish within {}s",
            timeout.as_secs()
        ),
    );
    status.apply(ctx.store.as_ref()).await?;
    Ok(())
}

/// Revert the cluster configuration for a relocation being deleted, then
/// release its finalizer.
///
/// Nothing happens if the finalizer is already gone.
///
/// # Errors
///
/// Returns the error of the revert or of the finalizer removal. The finalizer
/// stays in place when the revert fails, so deletion waits for a later success.
pub async fn delete_relocation(ctx: &Context, relocation: &ClusterRelocation) -> Result<()> {
    let name = relocation.name_any();
    if !has_finalizer(relocation, RELOCATION_FINALIZER) {
        debug!(relocation = %name, "ClusterRelocation has no finalizer, nothing to clean up");
        return Ok(());
    }

    info!("Deleting ClusterRelocation {}", name);
    let start = Instant::now();

    let reverted = IngressReconciler::from_context(ctx).cleanup(relocation).await;
    let result = match reverted {
        Ok(result) => {
            debug!(
                relocation = %name,
                ingress_controller = %result.ingress_controller,
                ingress_config = %result.ingress_config,
                "Ingress configuration reverted"
            );
            remove_finalizer(ctx.store.as_ref(), relocation, RELOCATION_FINALIZER)
                .await
                .map(|_| ())
        }
        Err(e) => Err(e),
    };

    match &result {
        Ok(()) => {
            metrics::record_reconciliation_success(KIND_CLUSTER_RELOCATION, start.elapsed());
            info!("Successfully deleted ClusterRelocation {}", name);
        }
        Err(e) => {
            metrics::record_reconciliation_error(KIND_CLUSTER_RELOCATION, start.elapsed());
            metrics::record_error(KIND_CLUSTER_RELOCATION, e.reason());
            error!(relocation = %name, "Failed to revert ClusterRelocation: {}", e);
        }
    }

    result
}

#[cfg(test)]
#[path = "relocation_tests.rs"]
mod relocation_tests;
