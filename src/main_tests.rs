// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `main.rs` - argument parsing and requeue policy

#[cfg(test)]
mod tests {
    use super::super::{requeue_action, Args, ReconcileError};
    use clap::Parser;
    use ingress_relocator::errors::{RelocationError, StoreError};
    use kube::runtime::controller::Action;
    use std::time::Duration;

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["ingress-relocator"]).unwrap();

        assert!(args.config.is_none());
        assert_eq!(args.metrics_addr.port(), 8080);
        assert_eq!(args.cycle_timeout_secs, 900);
        assert_eq!(args.requeue_secs, 300);
    }

    #[test]
    fn test_explicit_args() {
        let args = Args::try_parse_from([
            "ingress-relocator",
            "--config",
            "/etc/ingress-relocator/config.yaml",
            "--log-format",
            "json",
            "--metrics-addr",
            "127.0.0.1:9090",
            "--cycle-timeout-secs",
            "60",
        ])
        .unwrap();

        assert_eq!(
            args.config.unwrap().to_str(),
            Some("/etc/ingress-relocator/config.yaml")
        );
        assert_eq!(args.log_format, "json");
        assert_eq!(args.metrics_addr.to_string(), "127.0.0.1:9090");
        assert_eq!(args.cycle_timeout_secs, 60);
    }

    #[test]
    fn test_validation_errors_wait_for_change() {
        let err = ReconcileError::from(anyhow::Error::new(
            RelocationError::IncompleteCertificateRef,
        ));

        assert_eq!(requeue_action(&err), Action::await_change());
    }

    #[test]
    fn test_dependency_errors_are_requeued() {
        let err = ReconcileError::from(anyhow::Error::new(RelocationError::Store(
            StoreError::Transport("connection reset".to_string()),
        )));

        assert_eq!(
            requeue_action(&err),
            Action::requeue(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_missing_certificate_secret_is_requeued() {
        let err = ReconcileError::from(anyhow::Error::new(
            RelocationError::CertificateSecretMissing {
                namespace: "cert-manager".to_string(),
                name: "wildcard-apps".to_string(),
            },
        ));

        assert_eq!(
            requeue_action(&err),
            Action::requeue(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_timeouts_are_requeued() {
        let err = ReconcileError::from(anyhow::anyhow!("reconciliation did not finish"));

        assert_eq!(
            requeue_action(&err),
            Action::requeue(Duration::from_secs(30))
        );
    }
}
