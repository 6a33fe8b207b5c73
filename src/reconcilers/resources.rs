// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Idempotent read-modify-write helpers for cluster resources.
//!
//! Every write the operator performs goes through [`create_or_merge`]: read the
//! current object, apply a mutation to a copy, and write only if the copy differs.
//! The caller learns whether anything happened through [`OperationResult`].
//!
//! # Targets
//!
//! - [`SecretTarget`]: secrets are replaced whole, carrying the `resourceVersion` they were read at
//! - [`IngressControllerTarget`]: merge-patches `spec.defaultCertificate` only
//! - [`IngressConfigTarget`]: merge-patches `spec.appsDomain` and `spec.componentRoutes` only
//!
//! Platform singletons are never created; a missing singleton is either an error
//! or a no-op depending on [`WhenAbsent`].
//!
//! # Example
//!
//! ```rust,no_run
//! use ingress_relocator::reconcilers::resources::{
//!     create_or_merge, IngressControllerTarget, WhenAbsent,
//! };
//! use ingress_relocator::openshift::SecretNameReference;
//! use ingress_relocator::store::ClusterStore;
//!
//! async fn example(store: &dyn ClusterStore) -> ingress_relocator::errors::Result<()> {
//!     let target = IngressControllerTarget::new(store, "openshift-ingress-operator", "default");
//!     let result = create_or_merge(&target, WhenAbsent::Fail, |ic| {
//!         ic.spec.default_certificate = Some(SecretNameReference::new("generated-ingress-secret"));
//!         Ok(())
//!     })
//!     .await?;
//!     println!("IngressController {result}");
//!     Ok(())
//! }
//! ```

use super::retry::ConflictRetry;
use crate::errors::{RelocationError, Result, StoreError, StoreResult};
use crate::metrics;
use crate::openshift::{IngressConfig, IngressController};
use crate::store::ClusterStore;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, info};

/// Outcome of an idempotent write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationResult {
    /// The object did not exist and was created
    Created,
    /// The object existed and was changed
    Updated,
    /// Nothing was written
    Unchanged,
}

impl OperationResult {
    /// Returns `true` if a write reached the cluster.
    #[must_use]
    pub fn is_changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when the target object does not exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WhenAbsent {
    /// Build a new object, mutate it and create it
    Create,
    /// Fail with [`RelocationError::SingletonMissing`]
    Fail,
    /// Do nothing and report [`OperationResult::Unchanged`]
    Skip,
}

/// An object that can be read, created and written back.
#[async_trait]
pub trait MergeTarget: Send + Sync {
    /// Typed view of the object. Equality decides whether a write is needed.
    type Object: Clone + PartialEq + Send + Sync;

    /// Kind used in logs, errors and metrics.
    fn kind(&self) -> &'static str;

    /// Namespaced name used in logs and errors.
    fn display_name(&self) -> String;

    /// Skeleton for a new object, `None` if the kind must never be created.
    fn new_object(&self) -> Option<Self::Object>;

    async fn fetch(&self) -> StoreResult<Option<Self::Object>>;

    async fn create(&self, desired: &Self::Object) -> StoreResult<()>;

    /// Persist `desired`, using `current` for the concurrency precondition.
    async fn write(&self, current: &Self::Object, desired: &Self::Object) -> StoreResult<()>;
}

/// Read `target`, apply `mutate` to a copy and write it back only if it changed.
///
/// A write conflict restarts the whole read-modify-write from a fresh read, so
/// `mutate` may run more than once. It must derive the desired state from its
/// argument and the captured inputs only.
///
/// # Arguments
///
/// * `target` - The object to converge
/// * `when_absent` - Behavior when the object does not exist
/// * `mutate` - Brings a copy of the object to the desired state
///
/// # Returns
///
/// [`OperationResult::Created`], [`OperationResult::Updated`] or [`OperationResult::Unchanged`].
///
/// # Errors
///
/// Returns the error of `mutate`, [`RelocationError::SingletonMissing`] for
/// [`WhenAbsent::Fail`], [`RelocationError::ConflictRetriesExhausted`] when
/// every attempt conflicted, or the store error of a failed read or write.
pub async fn create_or_merge<T, F>(
    target: &T,
    when_absent: WhenAbsent,
    mut mutate: F,
) -> Result<OperationResult>
where
    T: MergeTarget,
    F: FnMut(&mut T::Object) -> Result<()> + Send,
{
    let kind = target.kind();
    let name = target.display_name();
    let mut retry = ConflictRetry::default();

    loop {
        match merge_once(target, when_absent, &mut mutate).await {
            Ok(result) => {
                if result.is_changed() {
                    info!("{} {} {}", kind, name, result);
                    metrics::record_resource_change(kind, result.as_str());
                } else {
                    debug!("{} {} unchanged", kind, name);
                }
                return Ok(result);
            }
            Err(err) => {
                let delay = retry.on_error(err, kind, &name)?;
                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn merge_once<T, F>(
    target: &T,
    when_absent: WhenAbsent,
    mutate: &mut F,
) -> Result<OperationResult>
where
    T: MergeTarget,
    F: FnMut(&mut T::Object) -> Result<()> + Send,
{
    let Some(current) = target.fetch().await? else {
        return match (when_absent, target.new_object()) {
            (WhenAbsent::Skip, _) => {
                debug!(
                    "{} {} does not exist, nothing to do",
                    target.kind(),
                    target.display_name()
                );
                Ok(OperationResult::Unchanged)
            }
            (WhenAbsent::Create, Some(mut desired)) => {
                mutate(&mut desired)?;
                target.create(&desired).await?;
                Ok(OperationResult::Created)
            }
            (WhenAbsent::Fail | WhenAbsent::Create, _) => Err(RelocationError::SingletonMissing {
                kind: target.kind().to_string(),
                name: target.display_name(),
            }),
        };
    };

    let mut desired = current.clone();
    mutate(&mut desired)?;
    if desired == current {
        return Ok(OperationResult::Unchanged);
    }

    target.write(&current, &desired).await?;
    Ok(OperationResult::Updated)
}

/// Merge patch for `spec` that only applies if the object is still at `resource_version`.
fn versioned_patch(resource_version: Option<&String>, spec: Value) -> Value {
    match resource_version {
        Some(version) => json!({
            "metadata": { "resourceVersion": version },
            "spec": spec,
        }),
        None => json!({ "spec": spec }),
    }
}

fn qualified(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

/// A namespaced secret.
pub struct SecretTarget<'a> {
    store: &'a dyn ClusterStore,
    namespace: &'a str,
    name: &'a str,
}

impl<'a> SecretTarget<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ClusterStore, namespace: &'a str, name: &'a str) -> Self {
        Self {
            store,
            namespace,
            name,
        }
    }
}

#[async_trait]
impl MergeTarget for SecretTarget<'_> {
    type Object = Secret;

    fn kind(&self) -> &'static str {
        "Secret"
    }

    fn display_name(&self) -> String {
        qualified(self.namespace, self.name)
    }

    fn new_object(&self) -> Option<Secret> {
        Some(Secret {
            metadata: ObjectMeta {
                name: Some(self.name.to_string()),
                namespace: Some(self.namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn fetch(&self) -> StoreResult<Option<Secret>> {
        self.store.get_secret(self.namespace, self.name).await
    }

    async fn create(&self, desired: &Secret) -> StoreResult<()> {
        self.store.create_secret(desired).await.map(|_| ())
    }

    async fn write(&self, _current: &Secret, desired: &Secret) -> StoreResult<()> {
        // desired still carries the resourceVersion it was read at
        self.store.replace_secret(desired).await.map(|_| ())
    }
}

/// The `IngressController` singleton; only `spec.defaultCertificate` is written.
pub struct IngressControllerTarget<'a> {
    store: &'a dyn ClusterStore,
    namespace: &'a str,
    name: &'a str,
}

impl<'a> IngressControllerTarget<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ClusterStore, namespace: &'a str, name: &'a str) -> Self {
        Self {
            store,
            namespace,
            name,
        }
    }
}

#[async_trait]
impl MergeTarget for IngressControllerTarget<'_> {
    type Object = IngressController;

    fn kind(&self) -> &'static str {
        "IngressController"
    }

    fn display_name(&self) -> String {
        qualified(self.namespace, self.name)
    }

    fn new_object(&self) -> Option<IngressController> {
        None
    }

    async fn fetch(&self) -> StoreResult<Option<IngressController>> {
        self.store
            .get_ingress_controller(self.namespace, self.name)
            .await
    }

    async fn create(&self, _desired: &IngressController) -> StoreResult<()> {
        Err(StoreError::Api {
            code: 405,
            message: format!("IngressController {} is never created", self.display_name()),
        })
    }

    async fn write(&self, current: &IngressController, desired: &IngressController) -> StoreResult<()> {
        let patch = versioned_patch(
            current.metadata.resource_version.as_ref(),
            json!({ "defaultCertificate": serde_json::to_value(&desired.spec.default_certificate)? }),
        );
        self.store
            .patch_ingress_controller(self.namespace, self.name, &patch)
            .await
    }
}

/// The cluster `Ingress` config singleton; only `spec.appsDomain` and `spec.componentRoutes` are written.
pub struct IngressConfigTarget<'a> {
    store: &'a dyn ClusterStore,
    name: &'a str,
}

impl<'a> IngressConfigTarget<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ClusterStore, name: &'a str) -> Self {
        Self { store, name }
    }
}

#[async_trait]
impl MergeTarget for IngressConfigTarget<'_> {
    type Object = IngressConfig;

    fn kind(&self) -> &'static str {
        "Ingress"
    }

    fn display_name(&self) -> String {
        self.name.to_string()
    }

    fn new_object(&self) -> Option<IngressConfig> {
        None
    }

    async fn fetch(&self) -> StoreResult<Option<IngressConfig>> {
        self.store.get_ingress_config(self.name).await
    }

    async fn create(&self, _desired: &IngressConfig) -> StoreResult<()> {
        Err(StoreError::Api {
            code: 405,
            message: format!("Ingress {} is never created", self.name),
        })
    }

    async fn write(&self, current: &IngressConfig, desired: &IngressConfig) -> StoreResult<()> {
        let patch = versioned_patch(
            current.metadata.resource_version.as_ref(),
            json!({
                "appsDomain": serde_json::to_value(&desired.spec.apps_domain)?,
                "componentRoutes": serde_json::to_value(&desired.spec.component_routes)?,
            }),
        );
        self.store.patch_ingress_config(self.name, &patch).await
    }
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
