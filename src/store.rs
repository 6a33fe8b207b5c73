// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster store seam.
//!
//! Every cluster API call made by the reconcilers goes through [`ClusterStore`].
//! [`KubeStore`] is the production implementation on top of `kube::Api`; tests
//! substitute an in-memory store with the same merge-patch and
//! optimistic-concurrency semantics as the API server.
//!
//! Writes follow two shapes:
//!
//! - secrets are replaced whole, carrying the `resourceVersion` they were read at
//! - platform singletons are JSON merge-patched with only the fields the operator owns
//!
//! Both fail with [`StoreError::Conflict`] when the object changed underneath.

pub mod pagination;

#[cfg(test)]
pub(crate) mod memory;

use crate::constants::{FIELD_MANAGER, KIND_CLUSTER_RELOCATION};
use crate::crd::ClusterRelocation;
use crate::errors::{StoreError, StoreResult};
use crate::openshift::{ClusterOperator, IngressConfig, IngressController, Route};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use tracing::debug;

/// Cluster API operations used by the relocation reconcilers.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Fetch a secret, `None` if it does not exist.
    async fn get_secret(&self, namespace: &str, name: &str) -> StoreResult<Option<Secret>>;

    /// Create a secret. Fails with [`StoreError::AlreadyExists`] if it exists.
    async fn create_secret(&self, secret: &Secret) -> StoreResult<Secret>;

    /// Replace a secret. The object's `resourceVersion` is a precondition.
    async fn replace_secret(&self, secret: &Secret) -> StoreResult<Secret>;

    /// Fetch an `IngressController`, `None` if it does not exist.
    async fn get_ingress_controller(
        &self,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<IngressController>>;

    /// JSON merge-patch an `IngressController`.
    async fn patch_ingress_controller(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> StoreResult<()>;

    /// Fetch the cluster `Ingress` config, `None` if it does not exist.
    async fn get_ingress_config(&self, name: &str) -> StoreResult<Option<IngressConfig>>;

    /// JSON merge-patch the cluster `Ingress` config.
    async fn patch_ingress_config(&self, name: &str, patch: &serde_json::Value)
        -> StoreResult<()>;

    /// List routes in all namespaces.
    async fn list_routes(&self) -> StoreResult<Vec<Route>>;

    /// Delete a route.
    async fn delete_route(&self, namespace: &str, name: &str) -> StoreResult<()>;

    /// Fetch a `ClusterOperator`, `None` if it does not exist.
    async fn get_cluster_operator(&self, name: &str) -> StoreResult<Option<ClusterOperator>>;

    /// JSON merge-patch a `ClusterRelocation` (metadata such as finalizers).
    async fn patch_relocation(&self, name: &str, patch: &serde_json::Value) -> StoreResult<()>;

    /// JSON merge-patch the status subresource of a `ClusterRelocation`.
    async fn patch_relocation_status(
        &self,
        name: &str,
        patch: &serde_json::Value,
    ) -> StoreResult<()>;
}

/// [`ClusterStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn patch_params() -> PatchParams {
        PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }
}

fn qualified(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

#[async_trait]
impl ClusterStore for KubeStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> StoreResult<Option<Secret>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .map_err(|e| StoreError::from_kube(e, "Secret", &qualified(namespace, name)))
    }

    async fn create_secret(&self, secret: &Secret) -> StoreResult<Secret> {
        let namespace = secret.namespace().unwrap_or_default();
        let name = secret.name_any();
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
        debug!(namespace = %namespace, name = %name, "Creating Secret");
        api.create(&PostParams::default(), secret)
            .await
            .map_err(|e| StoreError::from_kube(e, "Secret", &qualified(&namespace, &name)))
    }

    async fn replace_secret(&self, secret: &Secret) -> StoreResult<Secret> {
        let namespace = secret.namespace().unwrap_or_default();
        let name = secret.name_any();
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
        debug!(namespace = %namespace, name = %name, "Replacing Secret");
        api.replace(&name, &PostParams::default(), secret)
            .await
            .map_err(|e| StoreError::from_kube(e, "Secret", &qualified(&namespace, &name)))
    }

    async fn get_ingress_controller(
        &self,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<IngressController>> {
        let api: Api<IngressController> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await.map_err(|e| {
            StoreError::from_kube(e, "IngressController", &qualified(namespace, name))
        })
    }

    async fn patch_ingress_controller(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> StoreResult<()> {
        let api: Api<IngressController> = Api::namespaced(self.client.clone(), namespace);
        api.patch(name, &Self::patch_params(), &Patch::Merge(patch))
            .await
            .map(|_| ())
            .map_err(|e| {
                StoreError::from_kube(e, "IngressController", &qualified(namespace, name))
            })
    }

    async fn get_ingress_config(&self, name: &str) -> StoreResult<Option<IngressConfig>> {
        let api: Api<IngressConfig> = Api::all(self.client.clone());
        api.get_opt(name)
            .await
            .map_err(|e| StoreError::from_kube(e, "Ingress", name))
    }

    async fn patch_ingress_config(
        &self,
        name: &str,
        patch: &serde_json::Value,
    ) -> StoreResult<()> {
        let api: Api<IngressConfig> = Api::all(self.client.clone());
        api.patch(name, &Self::patch_params(), &Patch::Merge(patch))
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, "Ingress", name))
    }

    async fn list_routes(&self) -> StoreResult<Vec<Route>> {
        let api: Api<Route> = Api::all(self.client.clone());
        pagination::list_all_paginated(&api, ListParams::default())
            .await
            .map_err(|e| StoreError::from_kube(e, "Route", "*"))
    }

    async fn delete_route(&self, namespace: &str, name: &str) -> StoreResult<()> {
        let api: Api<Route> = Api::namespaced(self.client.clone(), namespace);
        api.delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, "Route", &qualified(namespace, name)))
    }

    async fn get_cluster_operator(&self, name: &str) -> StoreResult<Option<ClusterOperator>> {
        let api: Api<ClusterOperator> = Api::all(self.client.clone());
        api.get_opt(name)
            .await
            .map_err(|e| StoreError::from_kube(e, "ClusterOperator", name))
    }

    async fn patch_relocation(&self, name: &str, patch: &serde_json::Value) -> StoreResult<()> {
        let api: Api<ClusterRelocation> = Api::all(self.client.clone());
        api.patch(name, &Self::patch_params(), &Patch::Merge(patch))
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, KIND_CLUSTER_RELOCATION, name))
    }

    async fn patch_relocation_status(
        &self,
        name: &str,
        patch: &serde_json::Value,
    ) -> StoreResult<()> {
        let api: Api<ClusterRelocation> = Api::all(self.client.clone());
        api.patch_status(name, &Self::patch_params(), &Patch::Merge(patch))
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, KIND_CLUSTER_RELOCATION, name))
    }
}
