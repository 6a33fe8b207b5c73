// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for ingress relocation.
//!
//! Errors fall into three classes that drive how the controller reacts:
//!
//! - **Validation** - the request cannot succeed until the user changes it
//!   (missing certificate reference fields, wrong secret type). Never retried
//!   automatically.
//! - **Dependency** - a cluster API call or readiness wait failed. Transient,
//!   propagated so the controller can back off and retry.
//! - **Generation** - creating a key pair failed. Fatal for the current cycle.
//!
//! [`StoreError`] is the narrower error of the cluster store seam; it converts
//! into [`RelocationError::Store`].

use crate::status_reasons::{
    REASON_ALREADY_OWNED, REASON_CERTIFICATE_GENERATION_FAILED, REASON_CERTIFICATE_SECRET_MISSING,
    REASON_CLUSTER_OPERATOR_MISSING, REASON_INVALID_OWNERSHIP_POLICY, REASON_INVALID_SPEC,
    REASON_KUBERNETES_API_ERROR, REASON_PLATFORM_RESOURCE_MISSING, REASON_WRITE_CONFLICT,
    REASON_WRONG_SECRET_TYPE,
};
use thiserror::Error;

/// Errors returned by a [`crate::store::ClusterStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The object does not exist (HTTP 404).
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Kind of the missing object
        kind: String,
        /// Namespaced name of the missing object
        name: String,
    },

    /// The write was based on a stale `resourceVersion` (HTTP 409 on update).
    #[error("conflict writing {kind} '{name}': object was modified concurrently")]
    Conflict {
        /// Kind of the object
        kind: String,
        /// Namespaced name of the object
        name: String,
    },

    /// A create raced with another writer (HTTP 409 on create).
    #[error("{kind} '{name}' already exists")]
    AlreadyExists {
        /// Kind of the object
        kind: String,
        /// Namespaced name of the object
        name: String,
    },

    /// Any other API server rejection.
    #[error("Kubernetes API error (HTTP {code}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Message returned by the API server
        message: String,
    },

    /// The API server could not be reached.
    #[error("Kubernetes API transport error: {0}")]
    Transport(String),

    /// An object could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns `true` for optimistic-concurrency failures that warrant restarting a read-modify-write.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::AlreadyExists { .. })
    }

    /// Returns `true` if the object did not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Map a `kube::Error` for an operation on `kind` `name`.
    #[must_use]
    pub fn from_kube(err: kube::Error, kind: &str, name: &str) -> Self {
        match &err {
            kube::Error::Api(ae) if ae.code == 404 => Self::NotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists" => {
                Self::AlreadyExists {
                    kind: kind.to_string(),
                    name: name.to_string(),
                }
            }
            kube::Error::Api(ae) if ae.code == 409 => Self::Conflict {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(ae) => Self::Api {
                code: ae.code,
                message: err.to_string(),
            },
            kube::Error::SerdeError(e) => Self::Serialization(e.to_string()),
            _ => Self::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors that can occur while relocating or reverting the ingress identity.
#[derive(Error, Debug, Clone)]
pub enum RelocationError {
    /// The relocation domain is empty.
    #[error("relocation domain must not be empty")]
    EmptyDomain,

    /// `ingressCertRef` was given without both a name and a namespace.
    #[error("ingressCertRef must specify secret name and namespace")]
    IncompleteCertificateRef,

    /// The referenced certificate secret does not exist yet.
    #[error("secret {namespace}/{name} referenced by ingressCertRef does not exist")]
    CertificateSecretMissing {
        /// Namespace of the referenced secret
        namespace: String,
        /// Name of the referenced secret
        name: String,
    },

    /// The referenced secret is not of the expected type.
    #[error("secret {namespace}/{name} has type '{actual}', expected '{expected}'")]
    WrongSecretType {
        /// Namespace of the referenced secret
        namespace: String,
        /// Name of the referenced secret
        name: String,
        /// Required secret type
        expected: String,
        /// Type found on the secret
        actual: String,
    },

    /// The object already has a controller owner other than the relocation.
    #[error("{object} is already controlled by {owner_kind} '{owner_name}'")]
    AlreadyOwned {
        /// Namespaced name of the object
        object: String,
        /// Kind of the existing controller
        owner_kind: String,
        /// Name of the existing controller
        owner_name: String,
    },

    /// An ownership policy combination that would let garbage collection act on an unowned copy.
    #[error("invalid ownership policy: {0}")]
    InvalidOwnershipPolicy(String),

    /// Generating or parsing certificate material failed.
    #[error("certificate generation failed: {0}")]
    Generation(String),

    /// A platform singleton that must pre-exist was not found.
    #[error("{kind} '{name}' does not exist; it is managed by the platform and is never created by this operator")]
    SingletonMissing {
        /// Kind of the singleton
        kind: String,
        /// Namespaced name of the singleton
        name: String,
    },

    /// The cluster operator used as a readiness gate does not exist.
    #[error("cluster operator '{0}' not found")]
    ClusterOperatorMissing(String),

    /// A write kept conflicting after every retry.
    #[error("gave up writing {kind} '{name}' after {attempts} conflicting attempts")]
    ConflictRetriesExhausted {
        /// Kind of the object
        kind: String,
        /// Namespaced name of the object
        name: String,
        /// Number of attempts made
        attempts: u32,
    },

    /// A cluster API call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RelocationError {
    /// Returns `true` for errors only the user can fix by editing the request.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyDomain
                | Self::IncompleteCertificateRef
                | Self::WrongSecretType { .. }
                | Self::InvalidOwnershipPolicy(_)
        )
    }

    /// Returns `true` for errors worth retrying with backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SingletonMissing { .. }
                | Self::CertificateSecretMissing { .. }
                | Self::AlreadyOwned { .. }
                | Self::ClusterOperatorMissing(_)
                | Self::ConflictRetriesExhausted { .. }
                | Self::Store(_)
        )
    }

    /// Short `CamelCase` reason used in status conditions and metrics labels.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EmptyDomain | Self::IncompleteCertificateRef => REASON_INVALID_SPEC,
            Self::CertificateSecretMissing { .. } => REASON_CERTIFICATE_SECRET_MISSING,
            Self::WrongSecretType { .. } => REASON_WRONG_SECRET_TYPE,
            Self::AlreadyOwned { .. } => REASON_ALREADY_OWNED,
            Self::InvalidOwnershipPolicy(_) => REASON_INVALID_OWNERSHIP_POLICY,
            Self::Generation(_) => REASON_CERTIFICATE_GENERATION_FAILED,
            Self::SingletonMissing { .. } => REASON_PLATFORM_RESOURCE_MISSING,
            Self::ClusterOperatorMissing(_) => REASON_CLUSTER_OPERATOR_MISSING,
            Self::ConflictRetriesExhausted { .. } => REASON_WRITE_CONFLICT,
            Self::Store(_) => REASON_KUBERNETES_API_ERROR,
        }
    }
}

/// Result type for relocation operations.
pub type Result<T, E = RelocationError> = std::result::Result<T, E>;

/// Result type for cluster store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
