// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition types and reasons for `ClusterRelocation` resources.
//!
//! Reasons are programmatic identifiers in `CamelCase` that explain why a
//! condition has a particular status.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   observedGeneration: 3
//!   conditions:
//!     - type: Ready
//!       status: "True"
//!       reason: Relocated
//!       message: "Ingress relocated to apps.example.com using openshift-ingress/generated-ingress-secret"
//! ```
//!
//! A failed cycle reports `status: "False"` with one of the failure reasons
//! below and the error text as the message.

/// The single encompassing condition of a relocation.
pub const CONDITION_TYPE_READY: &str = "Ready";

// ============================================================================
// Success Reasons
// ============================================================================

/// Certificate, cluster config and routes all match the requested domain.
pub const REASON_RELOCATED: &str = "Relocated";

// ============================================================================
// Failure Reasons
// ============================================================================

/// The domain is empty or `ingressCertRef` is incomplete.
pub const REASON_INVALID_SPEC: &str = "InvalidSpec";

/// The secret named by `ingressCertRef` does not exist.
pub const REASON_CERTIFICATE_SECRET_MISSING: &str = "CertificateSecretMissing";

/// The secret named by `ingressCertRef` is not a `kubernetes.io/tls` secret.
pub const REASON_WRONG_SECRET_TYPE: &str = "WrongSecretType";

/// A secret the operator must control is already controlled by another owner.
pub const REASON_ALREADY_OWNED: &str = "AlreadyOwned";

/// A secret copy was requested with contradictory ownership flags.
pub const REASON_INVALID_OWNERSHIP_POLICY: &str = "InvalidOwnershipPolicy";

/// The self-signed certificate could not be generated or parsed.
pub const REASON_CERTIFICATE_GENERATION_FAILED: &str = "CertificateGenerationFailed";

/// The `IngressController` or cluster `Ingress` config does not exist.
pub const REASON_PLATFORM_RESOURCE_MISSING: &str = "PlatformResourceMissing";

/// The cluster operator gating route invalidation does not exist.
pub const REASON_CLUSTER_OPERATOR_MISSING: &str = "ClusterOperatorMissing";

/// A write kept conflicting with concurrent writers.
pub const REASON_WRITE_CONFLICT: &str = "WriteConflict";

/// A Kubernetes API call failed.
pub const REASON_KUBERNETES_API_ERROR: &str = "KubernetesApiError";

/// The cycle did not finish within the configured timeout.
pub const REASON_CYCLE_TIMEOUT: &str = "CycleTimeout";
