// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE key and algorithm model.
//!
//! WebAuthn carries credential public keys as COSE_Key maps (RFC 9052 §7).
//! This module defines the normalized key descriptor the signature verifier
//! consumes. Decoding from CBOR lives in `fido2rp-common`; this crate only
//! holds the types so every layer can share them.
//!
//! Algorithm and curve identifiers are modeled as closed enums with an
//! exhaustive mapping, so an unmapped integer can never be accepted by
//! accident.

use crate::error::VerifyError;

/// Supported COSE algorithms (IANA COSE Algorithms registry).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i64)]
pub enum CoseAlgorithm {
    /// ECDSA w/ SHA-256 over P-256.
    ES256 = -7,
    /// EdDSA over Ed25519.
    EdDsa = -8,
    /// ECDSA w/ SHA-384 over P-384.
    ES384 = -35,
    /// ECDSA w/ SHA-512 over P-521.
    ES512 = -36,
    /// RSASSA-PKCS1v1.5 w/ SHA-256.
    RS256 = -257,
}

impl CoseAlgorithm {
    /// Maps a raw COSE `alg` integer to a supported algorithm.
    ///
    /// Anything outside the supported set fails closed.
    pub fn from_i64(v: i64) -> Result<Self, VerifyError> {
        match v {
            -7 => Ok(CoseAlgorithm::ES256),
            -8 => Ok(CoseAlgorithm::EdDsa),
            -35 => Ok(CoseAlgorithm::ES384),
            -36 => Ok(CoseAlgorithm::ES512),
            -257 => Ok(CoseAlgorithm::RS256),
            other => Err(VerifyError::UnsupportedAlgorithm(format!(
                "COSE alg {other}"
            ))),
        }
    }
}

/// Supported COSE elliptic curves (IANA COSE Elliptic Curves registry).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i64)]
pub enum CoseEllipticCurve {
    P256 = 1,
    P384 = 2,
    P521 = 3,
    Ed25519 = 6,
}

impl CoseEllipticCurve {
    pub fn from_i64(v: i64) -> Result<Self, VerifyError> {
        match v {
            1 => Ok(CoseEllipticCurve::P256),
            2 => Ok(CoseEllipticCurve::P384),
            3 => Ok(CoseEllipticCurve::P521),
            6 => Ok(CoseEllipticCurve::Ed25519),
            other => Err(VerifyError::UnsupportedAlgorithm(format!(
                "COSE curve {other}"
            ))),
        }
    }
}

/// A normalized credential public key.
///
/// The curve/algorithm pairing has already been validated when a value of
/// this type exists: `Ec2` keys pair P-256/ES256, P-384/ES384 and
/// P-521/ES512; `Okp` keys pair Ed25519/EdDSA; `Rsa` keys use RS256.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoseKey {
    /// Elliptic-curve key with affine coordinates (kty 2).
    Ec2 {
        alg: CoseAlgorithm,
        crv: CoseEllipticCurve,
        x: Vec<u8>,
        y: Vec<u8>,
    },
    /// RSA modulus/exponent key (kty 3).
    Rsa {
        alg: CoseAlgorithm,
        n: Vec<u8>,
        e: Vec<u8>,
    },
    /// Octet key pair, Edwards curve (kty 1).
    Okp {
        alg: CoseAlgorithm,
        crv: CoseEllipticCurve,
        x: Vec<u8>,
    },
}

impl CoseKey {
    /// The COSE algorithm this key verifies with.
    pub fn alg(&self) -> CoseAlgorithm {
        match self {
            CoseKey::Ec2 { alg, .. } | CoseKey::Rsa { alg, .. } | CoseKey::Okp { alg, .. } => *alg,
        }
    }

    /// SEC1 uncompressed point (`0x04 ‖ x ‖ y`) for EC2 keys.
    ///
    /// The legacy U2F registration payload embeds the credential key in this
    /// form. Non-EC2 keys have no uncompressed point.
    pub fn uncompressed_point(&self) -> Result<Vec<u8>, VerifyError> {
        match self {
            CoseKey::Ec2 { x, y, .. } => {
                let mut out = Vec::with_capacity(1 + x.len() + y.len());
                out.push(0x04);
                out.extend_from_slice(x);
                out.extend_from_slice(y);
                Ok(out)
            }
            _ => Err(VerifyError::UnsupportedAlgorithm(
                "uncompressed point requires an EC2 key".to_string(),
            )),
        }
    }
}
