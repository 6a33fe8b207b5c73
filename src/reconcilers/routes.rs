// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Stale route invalidation.
//!
//! Routes admitted by the default router keep the host they were admitted with.
//! After a domain change the platform only re-derives the host when the route is
//! recreated, so every route whose host does not contain the new domain is
//! deleted and left to its owner to recreate.
//!
//! Routes in [`RelocationConfig::route_exclusions`] are never touched; their
//! owners either manage the hosts themselves or ignore the apps domain.

use super::cluster_operator::wait_for_cluster_operator;
use crate::context::RelocationConfig;
use crate::errors::Result;
use crate::metrics;
use crate::openshift::Route;
use crate::store::ClusterStore;
use kube::ResourceExt;
use tracing::{debug, info};

/// Host of `route` that makes it stale for `domain`, if any.
fn stale_host<'a>(route: &'a Route, router_name: &'a str, domain: &str) -> Option<&'a str> {
    route
        .hosts_for_router(router_name)
        .find(|host| !host.contains(domain))
}

/// Delete every route on the default router whose host does not contain `domain`.
///
/// Waits for the API server cluster operator first so the listing does not race
/// its domain-triggered restart.
///
/// # Returns
///
/// The number of routes deleted. A route that vanished before it could be
/// deleted is not counted.
///
/// # Errors
///
/// Returns the error of the readiness wait, the listing, or a deletion. Routes
/// deleted before the failure stay deleted; the next pass picks up the rest.
pub async fn reset_routes(
    store: &dyn ClusterStore,
    config: &RelocationConfig,
    domain: &str,
) -> Result<usize> {
    wait_for_cluster_operator(
        store,
        &config.apiserver_operator,
        config.cluster_operator_poll_interval(),
    )
    .await?;

    let routes = store.list_routes().await?;
    debug!(count = routes.len(), domain = %domain, "Checking routes for stale hosts");

    let mut deleted = 0;
    for route in &routes {
        let namespace = route.namespace().unwrap_or_default();
        if config.is_route_excluded(&namespace) {
            continue;
        }
        let Some(host) = stale_host(route, &config.default_router_name, domain) else {
            continue;
        };

        let name = route.name_any();
        match store.delete_route(&namespace, &name).await {
            Ok(()) => {
                deleted += 1;
                metrics::record_route_deleted();
                info!(
                    route = %name,
                    namespace = %namespace,
                    host = %host,
                    "Deleted Route so that it can be re-created with new domain"
                );
            }
            Err(e) if e.is_not_found() => {
                debug!(route = %name, namespace = %namespace, "Route already gone");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(deleted)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod routes_tests;
