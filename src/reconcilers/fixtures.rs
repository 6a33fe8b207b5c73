// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared builders for reconciler unit tests.

use crate::certificates::{generate_tls_key_pair, SECRET_TYPE_TLS};
use crate::crd::{ClusterRelocation, ClusterRelocationSpec, SecretReference};
use crate::store::memory::MemoryStore;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use serde_json::json;
use std::collections::BTreeMap;

pub(crate) const RELOCATION_NAME: &str = "cluster";
pub(crate) const RELOCATION_UID: &str = "9f6c1d2e-0000-4000-8000-000000000001";

/// A persisted relocation for `domain` with an optional certificate reference.
pub(crate) fn relocation(domain: &str, cert_ref: Option<(&str, &str)>) -> ClusterRelocation {
    let mut relocation = ClusterRelocation::new(
        RELOCATION_NAME,
        ClusterRelocationSpec {
            domain: domain.to_string(),
            ingress_cert_ref: cert_ref.map(|(name, namespace)| SecretReference::new(name, namespace)),
        },
    );
    relocation.metadata.uid = Some(RELOCATION_UID.to_string());
    relocation.metadata.generation = Some(1);
    relocation
}

/// A `kubernetes.io/tls` secret holding a fresh key pair for `*.apps.<domain>`.
pub(crate) fn tls_secret(namespace: &str, name: &str, domain: &str) -> Secret {
    let pair = generate_tls_key_pair(domain, "*.apps").unwrap();
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(pair.into_secret_data()),
        type_: Some(SECRET_TYPE_TLS.to_string()),
        ..Default::default()
    }
}

pub(crate) fn opaque_secret(namespace: &str, name: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            "password".to_string(),
            ByteString(b"hunter2".to_vec()),
        )])),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

/// A cluster with both ingress singletons (carrying fields the operator does not own)
/// and a settled `openshift-apiserver`.
pub(crate) fn seeded_cluster() -> MemoryStore {
    let store = MemoryStore::new();
    store.seed_ingress_controller(
        "openshift-ingress-operator",
        "default",
        json!({ "replicas": 2, "domain": "apps.original.example" }),
    );
    store.seed_ingress_config(
        "cluster",
        json!({ "domain": "apps.original.example", "loadBalancer": { "platform": { "type": "" } } }),
    );
    store.seed_cluster_operator("openshift-apiserver", true, false);
    store
}
