// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared interfaces and datatypes for the fido2rp WebAuthn relying-party crates.
//!
//! This crate exists to prevent circular dependencies across:
//! - high-level facade (`fido2rp`)
//! - the codec, signature, chain and attestation crates (`fido2rp-common`,
//!   `fido2rp-validation`, `fido2rp-x509`, `fido2rp-attestation`, `fido2rp-mds`)
//!
//! It is intentionally kept small and stable.

pub mod attestation;
pub mod backup;
pub mod cose;
pub mod error;
pub mod root_source;

pub use attestation::{Aaguid, AttestationFormat, AttestationStatement};
pub use backup::{parse_backup_flags, BackupFlags, CredentialDeviceType};
pub use cose::{CoseAlgorithm, CoseEllipticCurve, CoseKey};
pub use error::VerifyError;
pub use root_source::{NoRootCertificates, RootCertificateIdentifier, RootCertificateSource};
