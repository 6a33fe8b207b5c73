// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster ingress configuration.
//!
//! Points the default `IngressController` at the canonical certificate and moves
//! the cluster `Ingress` config (apps domain and platform component routes) to the
//! relocation domain. [`revert_cluster_config`] undoes both.
//!
//! Neither singleton is ever created or replaced: only the fields listed below
//! are merge-patched, everything else on them is left as found.
//!
//! | Resource            | Owned fields                                  |
//! |---------------------|-----------------------------------------------|
//! | `IngressController` | `spec.defaultCertificate`                     |
//! | `Ingress`           | `spec.appsDomain`, `spec.componentRoutes`     |

use super::certificate::CanonicalSecret;
use super::resources::{
    create_or_merge, IngressConfigTarget, IngressControllerTarget, OperationResult, WhenAbsent,
};
use crate::constants::{
    AUTHENTICATION_NAMESPACE, CONSOLE_NAMESPACE, CONSOLE_ROUTE_HOST_LABEL, CONSOLE_ROUTE_NAME,
    DOWNLOADS_ROUTE_HOST_LABEL, DOWNLOADS_ROUTE_NAME, OAUTH_ROUTE_HOST_LABEL, OAUTH_ROUTE_NAME,
};
use crate::context::RelocationConfig;
use crate::errors::Result;
use crate::openshift::{ComponentRouteSpec, SecretNameReference};
use crate::store::ClusterStore;
use tracing::info;

/// Outcome of a sync or revert, one entry per singleton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterConfigResult {
    pub ingress_controller: OperationResult,
    pub ingress_config: OperationResult,
}

impl ClusterConfigResult {
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.ingress_controller.is_changed() || self.ingress_config.is_changed()
    }
}

/// Component routes for `domain`, in the order the platform lists them.
#[must_use]
pub fn component_routes(
    config: &RelocationConfig,
    domain: &str,
    secret_name: &str,
) -> Vec<ComponentRouteSpec> {
    let apps_domain = config.apps_domain(domain);
    [
        (CONSOLE_ROUTE_NAME, CONSOLE_NAMESPACE, CONSOLE_ROUTE_HOST_LABEL),
        (DOWNLOADS_ROUTE_NAME, CONSOLE_NAMESPACE, DOWNLOADS_ROUTE_HOST_LABEL),
        (OAUTH_ROUTE_NAME, AUTHENTICATION_NAMESPACE, OAUTH_ROUTE_HOST_LABEL),
    ]
    .into_iter()
    .map(|(name, namespace, host_label)| ComponentRouteSpec {
        namespace: namespace.to_string(),
        name: name.to_string(),
        hostname: format!("{host_label}.{apps_domain}"),
        serving_cert_key_pair_secret: SecretNameReference::new(secret_name),
    })
    .collect()
}

/// Move both ingress singletons to `domain` and `certificate`.
///
/// # Errors
///
/// Returns [`crate::errors::RelocationError::SingletonMissing`] if either
/// singleton does not exist, or a store error.
pub async fn sync_cluster_config(
    store: &dyn ClusterStore,
    config: &RelocationConfig,
    domain: &str,
    certificate: &CanonicalSecret,
) -> Result<ClusterConfigResult> {
    let controller_target = IngressControllerTarget::new(
        store,
        &config.ingress_controller_namespace,
        &config.ingress_controller_name,
    );
    let ingress_controller = create_or_merge(&controller_target, WhenAbsent::Fail, |ic| {
        ic.spec.default_certificate = Some(SecretNameReference::new(&certificate.name));
        Ok(())
    })
    .await?;
    if ingress_controller.is_changed() {
        info!(result = %ingress_controller, certificate = %certificate.name, "IngressController modified");
    }

    let apps_domain = config.apps_domain(domain);
    let routes = component_routes(config, domain, &certificate.name);
    let config_target = IngressConfigTarget::new(store, &config.ingress_config_name);
    let ingress_config = create_or_merge(&config_target, WhenAbsent::Fail, |ingress| {
        ingress.spec.apps_domain = Some(apps_domain.clone());
        ingress.spec.component_routes = Some(routes.clone());
        Ok(())
    })
    .await?;
    if ingress_config.is_changed() {
        info!(result = %ingress_config, apps_domain = %apps_domain, "Ingress domain aliases modified");
    }

    Ok(ClusterConfigResult {
        ingress_controller,
        ingress_config,
    })
}

/// Unset every field [`sync_cluster_config`] owns.
///
/// Safe to call when nothing was ever synced or a singleton is gone.
///
/// # Errors
///
/// Returns a store error if a read or write fails.
pub async fn revert_cluster_config(
    store: &dyn ClusterStore,
    config: &RelocationConfig,
) -> Result<ClusterConfigResult> {
    let controller_target = IngressControllerTarget::new(
        store,
        &config.ingress_controller_namespace,
        &config.ingress_controller_name,
    );
    let ingress_controller = create_or_merge(&controller_target, WhenAbsent::Skip, |ic| {
        ic.spec.default_certificate = None;
        Ok(())
    })
    .await?;
    if ingress_controller.is_changed() {
        info!(result = %ingress_controller, "IngressController reverted to original state");
    }

    let config_target = IngressConfigTarget::new(store, &config.ingress_config_name);
    let ingress_config = create_or_merge(&config_target, WhenAbsent::Skip, |ingress| {
        ingress.spec.apps_domain = None;
        ingress.spec.component_routes = None;
        Ok(())
    })
    .await?;
    if ingress_config.is_changed() {
        info!(result = %ingress_config, "Cluster Ingress reverted to original state");
    }

    Ok(ClusterConfigResult {
        ingress_controller,
        ingress_config,
    })
}

#[cfg(test)]
#[path = "cluster_config_tests.rs"]
mod cluster_config_tests;
