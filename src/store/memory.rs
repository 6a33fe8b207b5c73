// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`ClusterStore`] for unit tests.
//!
//! Objects are kept as JSON so that fields the typed views do not model survive
//! merge patches, exactly as on a real API server. Every write is recorded so
//! tests can assert that a converged reconcile performs none.

use super::ClusterStore;
use crate::crd::ClusterRelocation;
use crate::errors::{StoreError, StoreResult};
use crate::openshift::{ClusterOperator, IngressConfig, IngressController, Route};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub(crate) const KIND_SECRET: &str = "Secret";
pub(crate) const KIND_INGRESS_CONTROLLER: &str = "IngressController";
pub(crate) const KIND_INGRESS_CONFIG: &str = "Ingress";
pub(crate) const KIND_ROUTE: &str = "Route";
pub(crate) const KIND_CLUSTER_OPERATOR: &str = "ClusterOperator";
pub(crate) const KIND_CLUSTER_RELOCATION: &str = "ClusterRelocation";

/// A write that reached the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Mutation {
    Create { kind: String, name: String },
    Replace { kind: String, name: String },
    Patch { kind: String, name: String },
    Delete { kind: String, name: String },
}

impl Mutation {
    pub(crate) fn kind(&self) -> &str {
        match self {
            Self::Create { kind, .. }
            | Self::Replace { kind, .. }
            | Self::Patch { kind, .. }
            | Self::Delete { kind, .. } => kind,
        }
    }
}

type Key = (String, String, String);

#[derive(Default)]
struct State {
    objects: BTreeMap<Key, Value>,
    next_version: u64,
    mutations: Vec<Mutation>,
    pending_conflicts: BTreeMap<String, u32>,
    failures: BTreeMap<String, StoreError>,
}

impl State {
    fn bump_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }

    fn take_failure(&self, operation: &str) -> StoreResult<()> {
        match self.failures.get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Simulate a concurrent writer: the stored object moves to a new version and this write loses.
    fn take_conflict(&mut self, key: &Key) -> StoreResult<()> {
        let remaining = self.pending_conflicts.get(&key.0).copied().unwrap_or(0);
        if remaining == 0 {
            return Ok(());
        }
        self.pending_conflicts.insert(key.0.clone(), remaining - 1);
        let version = self.bump_version();
        if let Some(object) = self.objects.get_mut(key) {
            object["metadata"]["resourceVersion"] = Value::String(version);
        }
        Err(StoreError::Conflict {
            kind: key.0.clone(),
            name: display_name(key),
        })
    }
}

fn key(kind: &str, namespace: &str, name: &str) -> Key {
    (kind.to_string(), namespace.to_string(), name.to_string())
}

fn display_name(key: &Key) -> String {
    if key.1.is_empty() {
        key.2.clone()
    } else {
        format!("{}/{}", key.1, key.2)
    }
}

fn resource_version(object: &Value) -> Option<&str> {
    object["metadata"]["resourceVersion"].as_str()
}

/// RFC 7386 JSON merge patch.
pub(crate) fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target_map) = target {
        for (field, value) in patch_map {
            if value.is_null() {
                target_map.remove(field);
            } else {
                merge_patch(
                    target_map.entry(field.clone()).or_insert(Value::Null),
                    value,
                );
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an object without recording a mutation.
    pub(crate) fn seed(&self, kind: &str, namespace: &str, name: &str, mut object: Value) {
        let mut state = self.state.lock().unwrap();
        let version = state.bump_version();
        object["metadata"]["name"] = Value::String(name.to_string());
        if !namespace.is_empty() {
            object["metadata"]["namespace"] = Value::String(namespace.to_string());
        }
        object["metadata"]["resourceVersion"] = Value::String(version);
        state.objects.insert(key(kind, namespace, name), object);
    }

    pub(crate) fn seed_secret(&self, secret: &Secret) {
        let namespace = secret.metadata.namespace.clone().unwrap_or_default();
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.seed(
            KIND_SECRET,
            &namespace,
            &name,
            serde_json::to_value(secret).unwrap(),
        );
    }

    pub(crate) fn seed_route(&self, namespace: &str, name: &str, router_name: &str, host: &str) {
        self.seed(
            KIND_ROUTE,
            namespace,
            name,
            json!({
                "apiVersion": "route.openshift.io/v1",
                "kind": "Route",
                "metadata": {},
                "spec": { "host": host, "to": { "kind": "Service", "name": name } },
                "status": { "ingress": [ { "host": host, "routerName": router_name } ] }
            }),
        );
    }

    pub(crate) fn seed_ingress_controller(&self, namespace: &str, name: &str, spec: Value) {
        self.seed(
            KIND_INGRESS_CONTROLLER,
            namespace,
            name,
            json!({
                "apiVersion": "operator.openshift.io/v1",
                "kind": "IngressController",
                "metadata": {},
                "spec": spec
            }),
        );
    }

    pub(crate) fn seed_ingress_config(&self, name: &str, spec: Value) {
        self.seed(
            KIND_INGRESS_CONFIG,
            "",
            name,
            json!({
                "apiVersion": "config.openshift.io/v1",
                "kind": "Ingress",
                "metadata": {},
                "spec": spec
            }),
        );
    }

    pub(crate) fn seed_cluster_operator(&self, name: &str, available: bool, progressing: bool) {
        let flag = |b: bool| if b { "True" } else { "False" };
        self.seed(
            KIND_CLUSTER_OPERATOR,
            "",
            name,
            json!({
                "apiVersion": "config.openshift.io/v1",
                "kind": "ClusterOperator",
                "metadata": {},
                "spec": {},
                "status": { "conditions": [
                    { "type": "Available", "status": flag(available) },
                    { "type": "Progressing", "status": flag(progressing) },
                    { "type": "Degraded", "status": "False" }
                ] }
            }),
        );
    }

    pub(crate) fn seed_relocation(&self, relocation: &ClusterRelocation) {
        let name = relocation.metadata.name.clone().unwrap_or_default();
        self.seed(
            KIND_CLUSTER_RELOCATION,
            "",
            &name,
            serde_json::to_value(relocation).unwrap(),
        );
    }

    pub(crate) fn relocation(&self, name: &str) -> Option<ClusterRelocation> {
        self.object(KIND_CLUSTER_RELOCATION, "", name)
            .map(|v| serde_json::from_value(v).unwrap())
    }

    pub(crate) fn object(&self, kind: &str, namespace: &str, name: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state.objects.get(&key(kind, namespace, name)).cloned()
    }

    pub(crate) fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.object(KIND_SECRET, namespace, name)
            .map(|v| serde_json::from_value(v).unwrap())
    }

    pub(crate) fn contains(&self, kind: &str, namespace: &str, name: &str) -> bool {
        self.object(kind, namespace, name).is_some()
    }

    pub(crate) fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub(crate) fn clear_mutations(&self) {
        self.state.lock().unwrap().mutations.clear();
    }

    /// The next `count` writes to objects of `kind` lose an optimistic-concurrency race.
    pub(crate) fn inject_conflicts(&self, kind: &str, count: u32) {
        self.state
            .lock()
            .unwrap()
            .pending_conflicts
            .insert(kind.to_string(), count);
    }

    /// Every call of `operation` (a [`ClusterStore`] method name) fails with `err`.
    pub(crate) fn fail(&self, operation: &str, err: StoreError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(operation.to_string(), err);
    }

    fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<T>> {
        let state = self.state.lock().unwrap();
        state.take_failure(operation)?;
        state
            .objects
            .get(&key(kind, namespace, name))
            .map(|v| serde_json::from_value(v.clone()).map_err(StoreError::from))
            .transpose()
    }

    fn patch(
        &self,
        operation: &str,
        kind: &str,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.take_failure(operation)?;
        let key = key(kind, namespace, name);
        state.take_conflict(&key)?;
        let version = state.bump_version();
        let Some(object) = state.objects.get_mut(&key) else {
            return Err(StoreError::NotFound {
                kind: kind.to_string(),
                name: display_name(&key),
            });
        };
        if let Some(expected) = patch["metadata"]["resourceVersion"].as_str() {
            if resource_version(object) != Some(expected) {
                return Err(StoreError::Conflict {
                    kind: kind.to_string(),
                    name: display_name(&key),
                });
            }
        }
        merge_patch(object, patch);
        object["metadata"]["resourceVersion"] = Value::String(version);
        state.mutations.push(Mutation::Patch {
            kind: kind.to_string(),
            name: display_name(&key),
        });
        Ok(())
    }
}

#[async_trait]
impl ClusterStore for MemoryStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> StoreResult<Option<Secret>> {
        self.get("get_secret", KIND_SECRET, namespace, name)
    }

    async fn create_secret(&self, secret: &Secret) -> StoreResult<Secret> {
        let mut state = self.state.lock().unwrap();
        state.take_failure("create_secret")?;
        let namespace = secret.metadata.namespace.clone().unwrap_or_default();
        let name = secret.metadata.name.clone().unwrap_or_default();
        let key = key(KIND_SECRET, &namespace, &name);
        if state.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: KIND_SECRET.to_string(),
                name: display_name(&key),
            });
        }
        let mut created = secret.clone();
        created.metadata.resource_version = Some(state.bump_version());
        state.objects.insert(key.clone(), serde_json::to_value(&created)?);
        state.mutations.push(Mutation::Create {
            kind: KIND_SECRET.to_string(),
            name: display_name(&key),
        });
        Ok(created)
    }

    async fn replace_secret(&self, secret: &Secret) -> StoreResult<Secret> {
        let mut state = self.state.lock().unwrap();
        state.take_failure("replace_secret")?;
        let namespace = secret.metadata.namespace.clone().unwrap_or_default();
        let name = secret.metadata.name.clone().unwrap_or_default();
        let key = key(KIND_SECRET, &namespace, &name);
        state.take_conflict(&key)?;
        let Some(current) = state.objects.get(&key) else {
            return Err(StoreError::NotFound {
                kind: KIND_SECRET.to_string(),
                name: display_name(&key),
            });
        };
        if secret.metadata.resource_version.as_deref() != resource_version(current) {
            return Err(StoreError::Conflict {
                kind: KIND_SECRET.to_string(),
                name: display_name(&key),
            });
        }
        let mut replaced = secret.clone();
        replaced.metadata.resource_version = Some(state.bump_version());
        state.objects.insert(key.clone(), serde_json::to_value(&replaced)?);
        state.mutations.push(Mutation::Replace {
            kind: KIND_SECRET.to_string(),
            name: display_name(&key),
        });
        Ok(replaced)
    }

    async fn get_ingress_controller(
        &self,
        namespace: &str,
        name: &str,
    ) -> StoreResult<Option<IngressController>> {
        self.get(
            "get_ingress_controller",
            KIND_INGRESS_CONTROLLER,
            namespace,
            name,
        )
    }

    async fn patch_ingress_controller(
        &self,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> StoreResult<()> {
        self.patch(
            "patch_ingress_controller",
            KIND_INGRESS_CONTROLLER,
            namespace,
            name,
            patch,
        )
    }

    async fn get_ingress_config(&self, name: &str) -> StoreResult<Option<IngressConfig>> {
        self.get("get_ingress_config", KIND_INGRESS_CONFIG, "", name)
    }

    async fn patch_ingress_config(&self, name: &str, patch: &Value) -> StoreResult<()> {
        self.patch("patch_ingress_config", KIND_INGRESS_CONFIG, "", name, patch)
    }

    async fn list_routes(&self) -> StoreResult<Vec<Route>> {
        let state = self.state.lock().unwrap();
        state.take_failure("list_routes")?;
        state
            .objects
            .iter()
            .filter(|((kind, _, _), _)| kind == KIND_ROUTE)
            .map(|(_, v)| serde_json::from_value(v.clone()).map_err(StoreError::from))
            .collect()
    }

    async fn delete_route(&self, namespace: &str, name: &str) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.take_failure("delete_route")?;
        let key = key(KIND_ROUTE, namespace, name);
        if state.objects.remove(&key).is_none() {
            return Err(StoreError::NotFound {
                kind: KIND_ROUTE.to_string(),
                name: display_name(&key),
            });
        }
        state.mutations.push(Mutation::Delete {
            kind: KIND_ROUTE.to_string(),
            name: display_name(&key),
        });
        Ok(())
    }

    async fn get_cluster_operator(&self, name: &str) -> StoreResult<Option<ClusterOperator>> {
        self.get("get_cluster_operator", KIND_CLUSTER_OPERATOR, "", name)
    }

    async fn patch_relocation(&self, name: &str, patch: &Value) -> StoreResult<()> {
        self.patch("patch_relocation", KIND_CLUSTER_RELOCATION, "", name, patch)
    }

    async fn patch_relocation_status(&self, name: &str, patch: &Value) -> StoreResult<()> {
        self.patch(
            "patch_relocation_status",
            KIND_CLUSTER_RELOCATION,
            "",
            name,
            patch,
        )
    }
}
