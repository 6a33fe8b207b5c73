// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster operator readiness.
//!
//! Changing the apps domain restarts platform components. Callers that must not
//! race such a restart wait here until the component reports
//! `Available=True`, `Progressing=False` and `Degraded=False`.
//!
//! There is no local deadline: the wait ends when the operator settles, when a
//! read fails, or when the caller drops the future.

use crate::errors::{RelocationError, Result};
use crate::metrics;
use crate::store::ClusterStore;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Poll the `ClusterOperator` `name` every `poll_interval` until it is settled.
///
/// # Errors
///
/// Returns [`RelocationError::ClusterOperatorMissing`] if the operator does not
/// exist, or the store error of a failed read.
pub async fn wait_for_cluster_operator(
    store: &dyn ClusterStore,
    name: &str,
    poll_interval: Duration,
) -> Result<()> {
    let started = Instant::now();
    let mut announced = false;

    loop {
        let operator = store
            .get_cluster_operator(name)
            .await?
            .ok_or_else(|| RelocationError::ClusterOperatorMissing(name.to_string()))?;

        if operator.is_settled() {
            let waited = started.elapsed();
            if announced {
                info!(operator = %name, waited = ?waited, "Cluster operator is available");
            }
            metrics::record_cluster_operator_wait(name, waited);
            return Ok(());
        }

        if !announced {
            info!(operator = %name, "Waiting for cluster operator to become available");
            announced = true;
        }
        debug!(
            operator = %name,
            available = ?operator.condition_status("Available"),
            progressing = ?operator.condition_status("Progressing"),
            degraded = ?operator.condition_status("Degraded"),
            "Cluster operator not settled yet"
        );
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
#[path = "cluster_operator_tests.rs"]
mod cluster_operator_tests;
