// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Secret replication across namespaces.
//!
//! The ingress stack reads certificates from fixed namespaces, so a certificate
//! secret is copied wherever it is needed. Who owns which copy is decided by an
//! [`OwnershipPolicy`]:
//!
//! | Policy            | Original                    | Destination      |
//! |-------------------|-----------------------------|------------------|
//! | `GeneratedOwned`  | untouched                   | controller owner |
//! | `ForeignReadOnly` | owner (not controller)      | controller owner |
//!
//! A non-controller owner reference on a user-supplied original lets the
//! controller watch it without ever making it eligible for garbage collection
//! through the relocation.

use super::resources::{create_or_merge, OperationResult, SecretTarget, WhenAbsent};
use crate::crd::{ClusterRelocation, SecretReference};
use crate::errors::{RelocationError, Result};
use crate::store::ClusterStore;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Resource;
use tracing::{debug, info};

/// Which copies of a secret receive an owner reference to the relocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnershipFlags {
    own_original: bool,
    original_owned_by_controller: bool,
    own_destination: bool,
    destination_owned_by_controller: bool,
}

impl OwnershipFlags {
    /// Validate a combination of flags.
    ///
    /// # Errors
    ///
    /// Returns [`RelocationError::InvalidOwnershipPolicy`] when a copy would be
    /// controller-owned without being owned at all.
    pub fn new(
        own_original: bool,
        original_owned_by_controller: bool,
        own_destination: bool,
        destination_owned_by_controller: bool,
    ) -> Result<Self> {
        if original_owned_by_controller && !own_original {
            return Err(RelocationError::InvalidOwnershipPolicy(
                "original cannot be controller-owned without being owned".to_string(),
            ));
        }
        if destination_owned_by_controller && !own_destination {
            return Err(RelocationError::InvalidOwnershipPolicy(
                "destination cannot be controller-owned without being owned".to_string(),
            ));
        }
        Ok(Self {
            own_original,
            original_owned_by_controller,
            own_destination,
            destination_owned_by_controller,
        })
    }

    #[must_use]
    pub fn own_original(&self) -> bool {
        self.own_original
    }

    #[must_use]
    pub fn original_owned_by_controller(&self) -> bool {
        self.original_owned_by_controller
    }

    #[must_use]
    pub fn own_destination(&self) -> bool {
        self.own_destination
    }

    #[must_use]
    pub fn destination_owned_by_controller(&self) -> bool {
        self.destination_owned_by_controller
    }
}

/// Ownership of the original and the replica of a copied secret.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OwnershipPolicy {
    /// The original is already owned by the relocation; the replica is controller-owned.
    GeneratedOwned,
    /// The original belongs to someone else and is only watched; the replica is controller-owned.
    ForeignReadOnly,
    /// Any other validated combination.
    Custom(OwnershipFlags),
}

impl OwnershipPolicy {
    #[must_use]
    pub fn flags(self) -> OwnershipFlags {
        match self {
            Self::GeneratedOwned => OwnershipFlags {
                own_original: false,
                original_owned_by_controller: false,
                own_destination: true,
                destination_owned_by_controller: true,
            },
            Self::ForeignReadOnly => OwnershipFlags {
                own_original: true,
                original_owned_by_controller: false,
                own_destination: true,
                destination_owned_by_controller: true,
            },
            Self::Custom(flags) => flags,
        }
    }
}

/// Owner reference to `relocation`, `None` if it has not been persisted yet (no uid).
#[must_use]
pub fn relocation_owner_reference(
    relocation: &ClusterRelocation,
    controller: bool,
) -> Option<OwnerReference> {
    if controller {
        relocation.controller_owner_ref(&())
    } else {
        relocation.owner_ref(&())
    }
}

/// Add `owner` to `meta`, replacing a stale reference to the same uid.
///
/// An object can have a single controller.
///
/// # Errors
///
/// Returns [`RelocationError::AlreadyOwned`] if `owner` is a controller reference
/// and the object is already controlled by a different owner.
pub fn set_owner_reference(meta: &mut ObjectMeta, owner: &OwnerReference) -> Result<()> {
    let refs = meta.owner_references.get_or_insert_with(Vec::new);
    if owner.controller == Some(true) {
        if let Some(other) = refs
            .iter()
            .find(|r| r.uid != owner.uid && r.controller == Some(true))
        {
            return Err(RelocationError::AlreadyOwned {
                object: format!(
                    "{}/{}",
                    meta.namespace.as_deref().unwrap_or_default(),
                    meta.name.as_deref().unwrap_or_default()
                ),
                owner_kind: other.kind.clone(),
                owner_name: other.name.clone(),
            });
        }
    }
    match refs.iter_mut().find(|r| r.uid == owner.uid) {
        Some(existing) => existing.clone_from(owner),
        None => refs.push(owner.clone()),
    }
    Ok(())
}

/// Secret type as reported by the API server; unset means `Opaque`.
fn secret_type(secret: &k8s_openapi::api::core::v1::Secret) -> &str {
    secret.type_.as_deref().unwrap_or("Opaque")
}

/// Check that the secret referenced by `reference` exists and has type `expected_type`.
///
/// # Errors
///
/// Returns [`RelocationError::CertificateSecretMissing`] if it does not exist,
/// [`RelocationError::WrongSecretType`] if its type differs, or a store error.
pub async fn validate_secret_type(
    store: &dyn ClusterStore,
    reference: &SecretReference,
    expected_type: &str,
) -> Result<()> {
    let secret = store
        .get_secret(&reference.namespace, &reference.name)
        .await?
        .ok_or_else(|| RelocationError::CertificateSecretMissing {
            namespace: reference.namespace.clone(),
            name: reference.name.clone(),
        })?;

    let actual = secret_type(&secret);
    if actual != expected_type {
        return Err(RelocationError::WrongSecretType {
            namespace: reference.namespace.clone(),
            name: reference.name.clone(),
            expected: expected_type.to_string(),
            actual: actual.to_string(),
        });
    }

    debug!(secret = %reference, secret_type = %actual, "Secret type validated");
    Ok(())
}

/// Copy the secret `source` to `dest_namespace`/`dest_name`.
///
/// Always attempts the copy: the merge primitive turns an up-to-date replica
/// into a no-op. Only `data` and `type` are copied. The original's data is never
/// modified; at most an owner reference is added to its metadata.
///
/// # Arguments
///
/// * `store` - Cluster store
/// * `owner` - Relocation the copies are attributed to
/// * `source` - Secret to copy
/// * `dest_name` - Name of the replica
/// * `dest_namespace` - Namespace of the replica
/// * `policy` - Which copies get an owner reference
///
/// # Returns
///
/// The outcome of the write to the replica.
///
/// # Errors
///
/// Returns [`RelocationError::CertificateSecretMissing`] if `source` does not
/// exist, or the error of a failed read or write.
pub async fn copy_secret(
    store: &dyn ClusterStore,
    owner: &ClusterRelocation,
    source: &SecretReference,
    dest_name: &str,
    dest_namespace: &str,
    policy: OwnershipPolicy,
) -> Result<OperationResult> {
    let flags = policy.flags();
    let missing_source = || RelocationError::CertificateSecretMissing {
        namespace: source.namespace.clone(),
        name: source.name.clone(),
    };

    if flags.own_original() {
        if let Some(owner_ref) =
            relocation_owner_reference(owner, flags.original_owned_by_controller())
        {
            let original = SecretTarget::new(store, &source.namespace, &source.name);
            create_or_merge(&original, WhenAbsent::Fail, |secret| {
                set_owner_reference(&mut secret.metadata, &owner_ref)
            })
            .await
            .map_err(|e| match e {
                RelocationError::SingletonMissing { .. } => missing_source(),
                other => other,
            })?;
        }
    }

    if source.namespace == dest_namespace && source.name == dest_name {
        debug!(secret = %source, "Source and destination are the same secret, nothing to copy");
        return Ok(OperationResult::Unchanged);
    }

    let original = store
        .get_secret(&source.namespace, &source.name)
        .await?
        .ok_or_else(missing_source)?;

    let destination_owner = if flags.own_destination() {
        relocation_owner_reference(owner, flags.destination_owned_by_controller())
    } else {
        None
    };

    let destination = SecretTarget::new(store, dest_namespace, dest_name);
    let result = create_or_merge(&destination, WhenAbsent::Create, |secret| {
        secret.data.clone_from(&original.data);
        secret.type_.clone_from(&original.type_);
        if let Some(owner_ref) = &destination_owner {
            set_owner_reference(&mut secret.metadata, owner_ref)?;
        }
        Ok(())
    })
    .await?;

    if result.is_changed() {
        info!(
            source = %source,
            destination = %format!("{dest_namespace}/{dest_name}"),
            result = %result,
            "Secret copied"
        );
    }

    Ok(result)
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod secrets_tests;
