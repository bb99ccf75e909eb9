// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared helpers for attestation verifier integration tests.
//!
//! The tests build synthetic but structurally faithful ceremony inputs:
//! real P-256 keys and certificates (via `rcgen`), real CBOR (via
//! `minicbor`), and hand-rolled DER for the vendor certificate extensions
//! the formats inspect.

#![allow(dead_code)]

use std::collections::HashMap;

use p256::elliptic_curve::sec1::ToEncodedPoint as _;
use p256::pkcs8::DecodePrivateKey as _;
use sha2::{Digest as _, Sha256};

use fido2rp_abstractions::{RootCertificateIdentifier, RootCertificateSource};

/// A fixed "client data hash" for tests that don't exercise client data.
pub(crate) fn client_data_hash() -> [u8; 32] {
    Sha256::digest(b"test client data").into()
}

/// Key material shared between an rcgen certificate and p256 signing.
pub(crate) struct TestKey {
    pub(crate) key_pair: rcgen::KeyPair,
    pub(crate) signing_key: p256::ecdsa::SigningKey,
}

impl TestKey {
    pub(crate) fn generate() -> Self {
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let signing_key =
            p256::ecdsa::SigningKey::from_pkcs8_der(&key_pair.serialize_der()).unwrap();
        Self { key_pair, signing_key }
    }

    /// Affine coordinates of the public key.
    pub(crate) fn coordinates(&self) -> (Vec<u8>, Vec<u8>) {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        (point.x().unwrap().to_vec(), point.y().unwrap().to_vec())
    }

    /// The public key as an EC2/ES256 COSE key.
    pub(crate) fn cose_key_bytes(&self) -> Vec<u8> {
        let (x, y) = self.coordinates();
        let mut enc = minicbor::Encoder::new(Vec::new());
        enc.map(5).unwrap();
        enc.i64(1).unwrap().i64(2).unwrap();
        enc.i64(3).unwrap().i64(-7).unwrap();
        enc.i64(-1).unwrap().i64(1).unwrap();
        enc.i64(-2).unwrap().bytes(&x).unwrap();
        enc.i64(-3).unwrap().bytes(&y).unwrap();
        enc.into_writer()
    }

    /// DER ECDSA signature over `message`.
    pub(crate) fn sign_der(&self, message: &[u8]) -> Vec<u8> {
        use signature::Signer as _;
        let sig: p256::ecdsa::Signature = self.signing_key.sign(message);
        sig.to_der().as_bytes().to_vec()
    }

    /// Raw `r ‖ s` ECDSA signature over `message` (JWS form).
    pub(crate) fn sign_raw(&self, message: &[u8]) -> Vec<u8> {
        use signature::Signer as _;
        let sig: p256::ecdsa::Signature = self.signing_key.sign(message);
        sig.to_bytes().as_slice().to_vec()
    }
}

/// Builds registration authenticator data: UP|UV|AT flags, the given
/// AAGUID/credential ID, and the COSE key bytes appended.
pub(crate) fn registration_auth_data(
    rp_id: &str,
    aaguid: [u8; 16],
    credential_id: &[u8],
    cose_key_bytes: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&Sha256::digest(rp_id.as_bytes()));
    out.push(0x45); // UP | UV | AT
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&aaguid);
    out.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
    out.extend_from_slice(credential_id);
    out.extend_from_slice(cose_key_bytes);
    out
}

/// In-memory root source keyed by identifier.
#[derive(Default)]
pub(crate) struct TestRoots {
    roots: HashMap<RootCertificateIdentifier, Vec<String>>,
}

impl TestRoots {
    pub(crate) fn none() -> Self {
        Self::default()
    }

    pub(crate) fn with(identifier: RootCertificateIdentifier, pems: Vec<String>) -> Self {
        let mut roots = HashMap::new();
        roots.insert(identifier, pems);
        Self { roots }
    }
}

impl RootCertificateSource for TestRoots {
    fn root_certificates(&self, identifier: RootCertificateIdentifier) -> Vec<String> {
        self.roots.get(&identifier).cloned().unwrap_or_default()
    }
}

// Minimal DER construction for vendor extension payloads.

pub(crate) fn der_len(len: usize) -> Vec<u8> {
    if len < 128 {
        vec![len as u8]
    } else {
        let bytes = (len as u32).to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(3);
        let mut out = vec![0x80 | (4 - first) as u8];
        out.extend_from_slice(&bytes[first..]);
        out
    }
}

pub(crate) fn der_node(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&der_len(content.len()));
    out.extend_from_slice(content);
    out
}

pub(crate) fn der_sequence(content: &[u8]) -> Vec<u8> {
    der_node(0x30, content)
}

pub(crate) fn der_integer(value: u8) -> Vec<u8> {
    der_node(0x02, &[value])
}

pub(crate) fn der_enumerated(value: u8) -> Vec<u8> {
    der_node(0x0a, &[value])
}

pub(crate) fn der_octet_string(content: &[u8]) -> Vec<u8> {
    der_node(0x04, content)
}
