// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Ingress certificate provisioning.
//!
//! Produces the canonical certificate secret the router and the platform
//! component routes are pointed at. Two provenances exist:
//!
//! - **Generated**: no `ingressCertRef`. A self-signed `*.apps.<domain>` key pair is
//!   kept in a well-known secret owned by the relocation, and regenerated whenever
//!   its common name no longer matches the domain.
//! - **Supplied**: `ingressCertRef` points at an existing TLS secret. It is never
//!   modified, only copied under a fixed name so it cannot collide with anything in
//!   the target namespaces.

use super::resources::{create_or_merge, SecretTarget, WhenAbsent};
use super::secrets::{
    copy_secret, relocation_owner_reference, set_owner_reference, validate_secret_type,
    OwnershipPolicy,
};
use crate::certificates::{
    cert_common_name, generate_tls_key_pair, wildcard_name, SECRET_TYPE_TLS, TLS_CERT_KEY,
    TLS_PRIVATE_KEY_KEY,
};
use crate::context::RelocationConfig;
use crate::crd::{ClusterRelocation, SecretReference};
use crate::errors::{RelocationError, Result};
use crate::metrics;
use crate::store::ClusterStore;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use tracing::{debug, info, warn};

/// The secret the ingress configuration should reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalSecret {
    pub name: String,
    pub namespace: String,
}

/// Ensure TLS material for the relocation's domain exists and is replicated.
///
/// # Returns
///
/// The canonical secret (name, namespace), always in the ingress namespace.
///
/// # Errors
///
/// - [`RelocationError::EmptyDomain`] if the domain is empty
/// - [`RelocationError::IncompleteCertificateRef`] if `ingressCertRef` lacks a name or namespace
/// - [`RelocationError::CertificateSecretMissing`] / [`RelocationError::WrongSecretType`]
///   if the referenced secret is unusable
/// - [`RelocationError::AlreadyOwned`] if a secret to be controlled has another controller
/// - [`RelocationError::Generation`] if a key pair cannot be generated
/// - store errors from reads and writes
pub async fn provision_certificate(
    store: &dyn ClusterStore,
    config: &RelocationConfig,
    relocation: &ClusterRelocation,
) -> Result<CanonicalSecret> {
    let domain = relocation.spec.domain.as_str();
    if domain.is_empty() {
        return Err(RelocationError::EmptyDomain);
    }

    match &relocation.spec.ingress_cert_ref {
        None => provision_generated(store, config, relocation, domain).await,
        Some(reference) => provision_supplied(store, config, relocation, reference).await,
    }
}

/// Whether `secret` lacks a usable certificate for `expected_cn`.
fn needs_new_certificate(secret: &Secret, expected_cn: &str) -> bool {
    let Some(data) = secret.data.as_ref() else {
        return true;
    };
    if !data.contains_key(TLS_PRIVATE_KEY_KEY) {
        return true;
    }
    let Some(cert) = data.get(TLS_CERT_KEY) else {
        return true;
    };

    match cert_common_name(&cert.0) {
        Ok(common_name) if common_name == expected_cn => false,
        Ok(common_name) => {
            info!(
                current = %common_name,
                expected = %expected_cn,
                "Domain changed, regenerating ingress certificate"
            );
            true
        }
        Err(e) => {
            warn!(error = %e, "Stored ingress certificate is unreadable, regenerating");
            true
        }
    }
}

async fn provision_generated(
    store: &dyn ClusterStore,
    config: &RelocationConfig,
    relocation: &ClusterRelocation,
    domain: &str,
) -> Result<CanonicalSecret> {
    let namespace = config.ingress_namespace.as_str();
    let name = config.generated_secret_name.as_str();
    let expected_cn = wildcard_name(&config.wildcard_prefix, domain);
    let owner = relocation_owner_reference(relocation, true);

    let target = SecretTarget::new(store, namespace, name);
    let result = create_or_merge(&target, WhenAbsent::Create, |secret| {
        if let Some(owner) = &owner {
            set_owner_reference(&mut secret.metadata, owner)?;
        }
        if needs_new_certificate(secret, &expected_cn) {
            info!(common_name = %expected_cn, "Generating self-signed ingress certificate");
            let pair = generate_tls_key_pair(domain, &config.wildcard_prefix)?;
            secret.data = Some(pair.into_secret_data());
            metrics::record_certificate_generated();
        } else {
            debug!(common_name = %expected_cn, "Ingress certificate matches domain");
        }
        secret.type_ = Some(SECRET_TYPE_TLS.to_string());
        Ok(())
    })
    .await?;

    if result.is_changed() {
        info!(
            relocation = %relocation.name_any(),
            secret = %format!("{namespace}/{name}"),
            result = %result,
            "Self-signed ingress certificate modified"
        );
    }

    let source = SecretReference::new(name, namespace);
    copy_secret(
        store,
        relocation,
        &source,
        name,
        &config.config_namespace,
        OwnershipPolicy::GeneratedOwned,
    )
    .await?;

    Ok(CanonicalSecret {
        name: name.to_string(),
        namespace: namespace.to_string(),
    })
}

async fn provision_supplied(
    store: &dyn ClusterStore,
    config: &RelocationConfig,
    relocation: &ClusterRelocation,
    reference: &SecretReference,
) -> Result<CanonicalSecret> {
    if reference.name.is_empty() || reference.namespace.is_empty() {
        return Err(RelocationError::IncompleteCertificateRef);
    }
    validate_secret_type(store, reference, SECRET_TYPE_TLS).await?;

    info!(
        relocation = %relocation.name_any(),
        secret = %reference,
        "Using user provided ingress certificate"
    );

    let name = config.copied_secret_name.as_str();
    for namespace in [&config.ingress_namespace, &config.config_namespace] {
        copy_secret(
            store,
            relocation,
            reference,
            name,
            namespace,
            OwnershipPolicy::ForeignReadOnly,
        )
        .await?;
    }

    Ok(CanonicalSecret {
        name: name.to_string(),
        namespace: config.ingress_namespace.clone(),
    })
}

#[cfg(test)]
#[path = "certificate_tests.rs"]
mod certificate_tests;
