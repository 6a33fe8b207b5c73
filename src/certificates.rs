// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TLS key pair generation and certificate inspection.
//!
//! The operator only needs two primitives: generate a self-signed wildcard
//! certificate for `<prefix>.<domain>`, and read back the subject common name of
//! a stored certificate to decide whether it still matches the requested domain.

use crate::constants::{GENERATED_CERT_ORGANIZATION, GENERATED_CERT_VALIDITY_DAYS};
use crate::errors::{RelocationError, Result};
use k8s_openapi::ByteString;
use rcgen::{CertificateParams, DistinguishedName, DnType, DnValue, KeyPair, KeyUsagePurpose};
use std::collections::BTreeMap;
use x509_parser::prelude::*;

/// Key of the certificate in a `kubernetes.io/tls` secret.
pub const TLS_CERT_KEY: &str = "tls.crt";

/// Key of the private key in a `kubernetes.io/tls` secret.
pub const TLS_PRIVATE_KEY_KEY: &str = "tls.key";

/// Secret type of TLS secrets.
pub const SECRET_TYPE_TLS: &str = "kubernetes.io/tls";

/// A PEM encoded certificate and its private key.
#[derive(Clone, Debug)]
pub struct TlsKeyPair {
    pub cert_pem: String,
    pub key_pem: String,
}

impl TlsKeyPair {
    /// Secret `data` holding this pair under the standard TLS keys.
    #[must_use]
    pub fn into_secret_data(self) -> BTreeMap<String, ByteString> {
        BTreeMap::from([
            (
                TLS_CERT_KEY.to_string(),
                ByteString(self.cert_pem.into_bytes()),
            ),
            (
                TLS_PRIVATE_KEY_KEY.to_string(),
                ByteString(self.key_pem.into_bytes()),
            ),
        ])
    }
}

/// The wildcard name a certificate for `domain` must carry, e.g. `*.apps.example.com`.
#[must_use]
pub fn wildcard_name(wildcard_prefix: &str, domain: &str) -> String {
    format!("{wildcard_prefix}.{domain}")
}

/// Generate a self-signed key pair whose common name and only SAN are `<wildcard_prefix>.<domain>`.
///
/// # Errors
///
/// Returns [`RelocationError::Generation`] if the name is not a valid DNS name or
/// key or certificate generation fails.
pub fn generate_tls_key_pair(domain: &str, wildcard_prefix: &str) -> Result<TlsKeyPair> {
    let common_name = wildcard_name(wildcard_prefix, domain);

    let mut params = CertificateParams::new(vec![common_name.clone()]).map_err(|e| {
        RelocationError::Generation(format!("invalid DNS name '{common_name}': {e}"))
    })?;

    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, DnValue::Utf8String(common_name.clone()));
    dn.push(
        DnType::OrganizationName,
        DnValue::Utf8String(GENERATED_CERT_ORGANIZATION.to_string()),
    );
    params.distinguished_name = dn;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![rcgen::ExtendedKeyUsagePurpose::ServerAuth];

    let now = ::time::OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + ::time::Duration::days(GENERATED_CERT_VALIDITY_DAYS);

    let key_pair = KeyPair::generate()
        .map_err(|e| RelocationError::Generation(format!("failed to generate key: {e}")))?;
    let cert = params.self_signed(&key_pair).map_err(|e| {
        RelocationError::Generation(format!("failed to self-sign '{common_name}': {e}"))
    })?;

    Ok(TlsKeyPair {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
    })
}

/// Read the subject common name of a PEM encoded certificate.
///
/// A certificate without a common name yields an empty string.
///
/// # Errors
///
/// Returns [`RelocationError::Generation`] if the bytes are not a PEM encoded X.509 certificate.
pub fn cert_common_name(cert_pem: &[u8]) -> Result<String> {
    let pem = ::pem::parse(cert_pem)
        .map_err(|e| RelocationError::Generation(format!("failed to parse PEM: {e}")))?;
    let (_, cert) = X509Certificate::from_der(pem.contents()).map_err(|e| {
        RelocationError::Generation(format!("failed to parse certificate: {e}"))
    })?;

    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or("")
        .to_string();
    Ok(common_name)
}
