// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `secrets.rs`

#[cfg(test)]
mod tests {
    use super::super::{
        copy_secret, relocation_owner_reference, set_owner_reference, validate_secret_type,
        OwnershipFlags, OwnershipPolicy,
    };
    use crate::crd::SecretReference;
    use crate::errors::RelocationError;
    use crate::reconcilers::fixtures::{
        opaque_secret, relocation, tls_secret, RELOCATION_UID,
    };
    use crate::reconcilers::resources::OperationResult;
    use crate::store::memory::{MemoryStore, Mutation, KIND_SECRET};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

    fn foreign_owner(controller: bool) -> OwnerReference {
        OwnerReference {
            api_version: "cert-manager.io/v1".to_string(),
            kind: "Certificate".to_string(),
            name: "wildcard".to_string(),
            uid: "cert-manager-uid".to_string(),
            controller: Some(controller),
            block_owner_deletion: Some(true),
        }
    }

    // =====================================================
    // Ownership policy
    // =====================================================

    #[test]
    fn test_generated_owned_preset() {
        let flags = OwnershipPolicy::GeneratedOwned.flags();
        assert!(!flags.own_original());
        assert!(!flags.original_owned_by_controller());
        assert!(flags.own_destination());
        assert!(flags.destination_owned_by_controller());
    }

    #[test]
    fn test_foreign_read_only_preset() {
        let flags = OwnershipPolicy::ForeignReadOnly.flags();
        assert!(flags.own_original());
        assert!(!flags.original_owned_by_controller());
        assert!(flags.own_destination());
        assert!(flags.destination_owned_by_controller());
    }

    #[test]
    fn test_controller_without_ownership_is_rejected() {
        assert!(matches!(
            OwnershipFlags::new(false, true, true, true),
            Err(RelocationError::InvalidOwnershipPolicy(_))
        ));
        assert!(matches!(
            OwnershipFlags::new(true, false, false, true),
            Err(RelocationError::InvalidOwnershipPolicy(_))
        ));
    }

    #[test]
    fn test_valid_custom_flags() {
        let flags = OwnershipFlags::new(true, true, false, false).unwrap();
        assert_eq!(OwnershipPolicy::Custom(flags).flags(), flags);
    }

    // =====================================================
    // Owner references
    // =====================================================

    #[test]
    fn test_owner_reference_requires_uid() {
        let mut unsaved = relocation("example.com", None);
        unsaved.metadata.uid = None;
        assert!(relocation_owner_reference(&unsaved, true).is_none());
    }

    #[test]
    fn test_controller_owner_reference() {
        let owner = relocation_owner_reference(&relocation("example.com", None), true).unwrap();
        assert_eq!(owner.kind, "ClusterRelocation");
        assert_eq!(owner.api_version, "rhsyseng.github.io/v1beta1");
        assert_eq!(owner.uid, RELOCATION_UID);
        assert_eq!(owner.controller, Some(true));
    }

    #[test]
    fn test_set_owner_reference_is_idempotent() {
        let owner = relocation_owner_reference(&relocation("example.com", None), true).unwrap();
        let mut meta = ObjectMeta::default();

        set_owner_reference(&mut meta, &owner).unwrap();
        set_owner_reference(&mut meta, &owner).unwrap();

        assert_eq!(meta.owner_references.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_set_controller_reference_rejects_other_controller() {
        let owner = relocation_owner_reference(&relocation("example.com", None), true).unwrap();
        let mut meta = ObjectMeta {
            name: Some("generated-ingress-secret".to_string()),
            namespace: Some("openshift-ingress".to_string()),
            owner_references: Some(vec![foreign_owner(true)]),
            ..Default::default()
        };

        let err = set_owner_reference(&mut meta, &owner).unwrap_err();

        match &err {
            RelocationError::AlreadyOwned {
                object,
                owner_kind,
                owner_name,
            } => {
                assert_eq!(object, "openshift-ingress/generated-ingress-secret");
                assert_eq!(owner_kind, "Certificate");
                assert_eq!(owner_name, "wildcard");
            }
            other => panic!("expected AlreadyOwned, got {other:?}"),
        }
        assert!(err.is_retryable());
        let refs = meta.owner_references.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].uid, "cert-manager-uid");
    }

    #[test]
    fn test_set_controller_reference_keeps_foreign_non_controller() {
        let owner = relocation_owner_reference(&relocation("example.com", None), true).unwrap();
        let mut meta = ObjectMeta {
            owner_references: Some(vec![foreign_owner(false)]),
            ..Default::default()
        };

        set_owner_reference(&mut meta, &owner).unwrap();

        let refs = meta.owner_references.unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].uid, RELOCATION_UID);
        assert_eq!(refs[1].controller, Some(true));
    }

    #[test]
    fn test_non_controller_reference_keeps_foreign_controller() {
        let owner = relocation_owner_reference(&relocation("example.com", None), false).unwrap();
        let mut meta = ObjectMeta {
            owner_references: Some(vec![foreign_owner(true)]),
            ..Default::default()
        };

        set_owner_reference(&mut meta, &owner).unwrap();

        let refs = meta.owner_references.unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].uid, "cert-manager-uid");
        assert_eq!(refs[0].controller, Some(true));
        assert_ne!(refs[1].controller, Some(true));
    }

    // =====================================================
    // validate_secret_type
    // =====================================================

    #[tokio::test]
    async fn test_validate_tls_secret() {
        let store = MemoryStore::new();
        store.seed_secret(&tls_secret("cert-manager", "wildcard", "example.com"));

        let reference = SecretReference::new("wildcard", "cert-manager");
        validate_secret_type(&store, &reference, "kubernetes.io/tls")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_validate_wrong_type() {
        let store = MemoryStore::new();
        store.seed_secret(&opaque_secret("cert-manager", "wildcard"));

        let reference = SecretReference::new("wildcard", "cert-manager");
        let err = validate_secret_type(&store, &reference, "kubernetes.io/tls")
            .await
            .unwrap_err();

        match &err {
            RelocationError::WrongSecretType {
                expected, actual, ..
            } => {
                assert_eq!(expected, "kubernetes.io/tls");
                assert_eq!(actual, "Opaque");
            }
            other => panic!("expected WrongSecretType, got {other:?}"),
        }
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_validate_missing_secret() {
        let store = MemoryStore::new();
        let reference = SecretReference::new("wildcard", "cert-manager");

        let err = validate_secret_type(&store, &reference, "kubernetes.io/tls")
            .await
            .unwrap_err();

        assert!(matches!(err, RelocationError::CertificateSecretMissing { .. }));
        assert!(err.to_string().contains("cert-manager/wildcard"));
    }

    // =====================================================
    // copy_secret
    // =====================================================

    #[tokio::test]
    async fn test_copy_generated_secret() {
        let store = MemoryStore::new();
        let owner = relocation("example.com", None);
        store.seed_secret(&tls_secret("openshift-ingress", "generated-ingress-secret", "example.com"));

        let result = copy_secret(
            &store,
            &owner,
            &SecretReference::new("generated-ingress-secret", "openshift-ingress"),
            "generated-ingress-secret",
            "openshift-config",
            OwnershipPolicy::GeneratedOwned,
        )
        .await
        .unwrap();

        assert_eq!(result, OperationResult::Created);
        let source = store
            .secret("openshift-ingress", "generated-ingress-secret")
            .unwrap();
        let copy = store
            .secret("openshift-config", "generated-ingress-secret")
            .unwrap();
        assert_eq!(copy.data, source.data);
        assert_eq!(copy.type_.as_deref(), Some("kubernetes.io/tls"));
        let refs = copy.metadata.owner_references.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].controller, Some(true));
        // GeneratedOwned leaves the original alone
        assert!(source.metadata.owner_references.is_none());
    }

    #[tokio::test]
    async fn test_copy_is_idempotent() {
        let store = MemoryStore::new();
        let owner = relocation("example.com", None);
        store.seed_secret(&tls_secret("cert-manager", "wildcard", "example.com"));
        let source = SecretReference::new("wildcard", "cert-manager");

        copy_secret(
            &store,
            &owner,
            &source,
            "copied-ingress-secret",
            "openshift-ingress",
            OwnershipPolicy::ForeignReadOnly,
        )
        .await
        .unwrap();
        store.clear_mutations();

        let result = copy_secret(
            &store,
            &owner,
            &source,
            "copied-ingress-secret",
            "openshift-ingress",
            OwnershipPolicy::ForeignReadOnly,
        )
        .await
        .unwrap();

        assert_eq!(result, OperationResult::Unchanged);
        assert!(store.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_original_gets_non_controller_owner_only() {
        let store = MemoryStore::new();
        let owner = relocation("example.com", None);
        let mut original = tls_secret("cert-manager", "wildcard", "example.com");
        original.metadata.owner_references = Some(vec![foreign_owner(true)]);
        let original_data = original.data.clone();
        store.seed_secret(&original);

        copy_secret(
            &store,
            &owner,
            &SecretReference::new("wildcard", "cert-manager"),
            "copied-ingress-secret",
            "openshift-config",
            OwnershipPolicy::ForeignReadOnly,
        )
        .await
        .unwrap();

        let original = store.secret("cert-manager", "wildcard").unwrap();
        assert_eq!(original.data, original_data);
        let refs = original.metadata.owner_references.unwrap();
        assert_eq!(refs.len(), 2);
        let ours = refs.iter().find(|r| r.uid == RELOCATION_UID).unwrap();
        assert_ne!(ours.controller, Some(true));
        let theirs = refs.iter().find(|r| r.uid == "cert-manager-uid").unwrap();
        assert_eq!(theirs.controller, Some(true));
    }

    #[tokio::test]
    async fn test_copy_follows_source_rotation() {
        let store = MemoryStore::new();
        let owner = relocation("example.com", None);
        let source = SecretReference::new("wildcard", "cert-manager");
        store.seed_secret(&tls_secret("cert-manager", "wildcard", "example.com"));
        copy_secret(
            &store,
            &owner,
            &source,
            "copied-ingress-secret",
            "openshift-config",
            OwnershipPolicy::ForeignReadOnly,
        )
        .await
        .unwrap();

        // cert-manager renews the certificate in place
        let mut renewed = tls_secret("cert-manager", "wildcard", "example.com");
        renewed.metadata.owner_references = store
            .secret("cert-manager", "wildcard")
            .unwrap()
            .metadata
            .owner_references;
        store.seed_secret(&renewed);
        store.clear_mutations();

        let result = copy_secret(
            &store,
            &owner,
            &source,
            "copied-ingress-secret",
            "openshift-config",
            OwnershipPolicy::ForeignReadOnly,
        )
        .await
        .unwrap();

        assert_eq!(result, OperationResult::Updated);
        assert_eq!(
            store.mutations(),
            vec![Mutation::Replace {
                kind: KIND_SECRET.to_string(),
                name: "openshift-config/copied-ingress-secret".to_string()
            }]
        );
        assert_eq!(
            store
                .secret("openshift-config", "copied-ingress-secret")
                .unwrap()
                .data,
            renewed.data
        );
    }

    #[tokio::test]
    async fn test_copy_missing_source() {
        let store = MemoryStore::new();
        let owner = relocation("example.com", None);

        let err = copy_secret(
            &store,
            &owner,
            &SecretReference::new("wildcard", "cert-manager"),
            "copied-ingress-secret",
            "openshift-ingress",
            OwnershipPolicy::ForeignReadOnly,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RelocationError::CertificateSecretMissing { .. }));
        assert!(store.mutations().is_empty());
    }
}
