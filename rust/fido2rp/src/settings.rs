// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Root-certificate configuration.
//!
//! Roots are pinned per attestation format (plus the `mds` slot) and tried
//! one by one during certificate-path validation. The store is a plain
//! value: configure it once at startup, then pass `&store` into every
//! verification call. Nothing here mutates during verification, so one
//! store can serve concurrent ceremonies.

use std::collections::HashMap;

use fido2rp_abstractions::{RootCertificateIdentifier, RootCertificateSource};
use fido2rp_x509::der_to_pem;

/// A root certificate in either encoding; DER is converted to PEM when
/// registered.
#[derive(Debug, Clone)]
pub enum RootCertificate {
    Der(Vec<u8>),
    Pem(String),
}

impl From<Vec<u8>> for RootCertificate {
    fn from(der: Vec<u8>) -> Self {
        RootCertificate::Der(der)
    }
}

impl From<String> for RootCertificate {
    fn from(pem: String) -> Self {
        RootCertificate::Pem(pem)
    }
}

impl From<&str> for RootCertificate {
    fn from(pem: &str) -> Self {
        RootCertificate::Pem(pem.to_string())
    }
}

/// Per-identifier root-certificate lists, stored as PEM.
#[derive(Debug, Default, Clone)]
pub struct RootCertificateStore {
    certificates: HashMap<RootCertificateIdentifier, Vec<String>>,
}

impl RootCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the roots for `identifier`. An empty list removes pinned
    /// trust for that identifier.
    pub fn set_root_certificates(
        &mut self,
        identifier: RootCertificateIdentifier,
        certificates: impl IntoIterator<Item = RootCertificate>,
    ) {
        let pems = certificates
            .into_iter()
            .map(|cert| match cert {
                RootCertificate::Der(der) => der_to_pem(&der),
                RootCertificate::Pem(pem) => pem,
            })
            .collect();
        self.certificates.insert(identifier, pems);
    }

    /// Registered roots for `identifier`; empty when none are pinned.
    pub fn get_root_certificates(&self, identifier: RootCertificateIdentifier) -> Vec<String> {
        self.certificates
            .get(&identifier)
            .cloned()
            .unwrap_or_default()
    }
}

impl RootCertificateSource for RootCertificateStore {
    fn root_certificates(&self, identifier: RootCertificateIdentifier) -> Vec<String> {
        self.get_root_certificates(identifier)
    }
}
