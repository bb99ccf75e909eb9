// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Algorithm-dispatched signature checks.
//!
//! Public key inputs are flexible to support common calling patterns:
//! - a decoded COSE credential key ([`verify_signature`])
//! - a DER X.509 certificate or DER SubjectPublicKeyInfo
//!   ([`verify_signature_with_certificate`], [`verify_jws_signature`])
//!
//! Each verifier pairs the curve with its registered hash (P-256/SHA-256,
//! P-384/SHA-384, P-521/SHA-512, RSA/SHA-256); there is no caller-chosen
//! hash, which removes a whole class of negotiation mistakes.

use p256::elliptic_curve::sec1::ToEncodedPoint as _;
use rsa::pkcs1v15;
use rsa::pkcs8::DecodePublicKey as _;
use rsa::traits::PublicKeyParts as _;
use rsa::{BigUint, RsaPublicKey};
use sha2::Sha256;
use signature::Verifier as _;
use x509_parser::prelude::FromDer as _;

use fido2rp_abstractions::{CoseAlgorithm, CoseEllipticCurve, CoseKey, VerifyError};

/// Verifies a WebAuthn-wire signature (DER ECDSA / PKCS#1 v1.5 RSA / raw
/// Ed25519) using a decoded COSE credential key.
pub fn verify_signature(key: &CoseKey, message: &[u8], sig: &[u8]) -> Result<(), VerifyError> {
    match key {
        CoseKey::Ec2 { alg, crv, x, y } => match (alg, crv) {
            (CoseAlgorithm::ES256, CoseEllipticCurve::P256) => {
                let vk = p256_key_from_coordinates(x, y)?;
                let signature = p256::ecdsa::Signature::from_der(sig)
                    .map_err(|e| VerifyError::SignatureInvalid(format!("bad ES256 signature: {e}")))?;
                vk.verify(message, &signature).map_err(signature_failed)
            }
            (CoseAlgorithm::ES384, CoseEllipticCurve::P384) => {
                let vk = p384_key_from_coordinates(x, y)?;
                let signature = p384::ecdsa::Signature::from_der(sig)
                    .map_err(|e| VerifyError::SignatureInvalid(format!("bad ES384 signature: {e}")))?;
                vk.verify(message, &signature).map_err(signature_failed)
            }
            (CoseAlgorithm::ES512, CoseEllipticCurve::P521) => {
                let vk = p521_key_from_coordinates(x, y)?;
                let signature = p521::ecdsa::Signature::from_der(sig)
                    .map_err(|e| VerifyError::SignatureInvalid(format!("bad ES512 signature: {e}")))?;
                vk.verify(message, &signature).map_err(signature_failed)
            }
            (alg, crv) => Err(VerifyError::UnsupportedAlgorithm(format!(
                "EC2 pairing {alg:?}/{crv:?}"
            ))),
        },
        CoseKey::Rsa { n, e, .. } => {
            let vk = rsa_key_from_parts(n, e)?;
            let signature = pkcs1v15::Signature::try_from(sig)
                .map_err(|e| VerifyError::SignatureInvalid(format!("bad RS256 signature: {e}")))?;
            vk.verify(message, &signature).map_err(signature_failed)
        }
        CoseKey::Okp { x, .. } => {
            let vk = ed25519_key_from_bytes(x)?;
            let signature = ed25519_dalek::Signature::from_slice(sig)
                .map_err(|e| VerifyError::SignatureInvalid(format!("bad EdDSA signature: {e}")))?;
            vk.verify(message, &signature).map_err(signature_failed)
        }
    }
}

/// Verifies a WebAuthn-wire signature using the public key of a DER
/// certificate (or DER SPKI), with the algorithm negotiated out-of-band.
pub fn verify_signature_with_certificate(
    alg: CoseAlgorithm,
    cert_or_spki_der: &[u8],
    message: &[u8],
    sig: &[u8],
) -> Result<(), VerifyError> {
    verify_with_spki(alg, cert_or_spki_der, message, sig, EcdsaEncoding::Asn1Der)
}

/// Verifies a JWS signature (raw `r ‖ s` ECDSA, PKCS#1 v1.5 RSA) using the
/// public key of a DER certificate.
///
/// Only ES256 and RS256 are meaningful JWS algorithms here; anything else
/// fails closed.
pub fn verify_jws_signature(
    alg: CoseAlgorithm,
    cert_der: &[u8],
    message: &[u8],
    sig: &[u8],
) -> Result<(), VerifyError> {
    match alg {
        CoseAlgorithm::ES256 | CoseAlgorithm::RS256 => {
            verify_with_spki(alg, cert_der, message, sig, EcdsaEncoding::RawFixed)
        }
        other => Err(VerifyError::UnsupportedAlgorithm(format!(
            "JWS alg {other:?}"
        ))),
    }
}

/// Whether the leaf certificate's subject public key equals a COSE
/// credential key. Used by formats whose trust model requires the
/// attestation certificate to certify the credential key itself.
pub fn public_key_matches_certificate(
    key: &CoseKey,
    cert_der: &[u8],
) -> Result<bool, VerifyError> {
    let (_, cert) = x509_parser::parse_x509_certificate(cert_der)
        .map_err(|e| VerifyError::malformed("certificate DER", e))?;
    let spki = &cert.tbs_certificate.subject_pki;
    let spki_key_bytes = spki.subject_public_key.data.as_ref();

    match key {
        CoseKey::Ec2 { .. } => {
            // For EC keys the SPKI BIT STRING is the SEC1 point.
            Ok(spki_key_bytes == key.uncompressed_point()?.as_slice())
        }
        CoseKey::Okp { x, .. } => Ok(spki_key_bytes == x.as_slice()),
        CoseKey::Rsa { n, e, .. } => {
            let cert_key = RsaPublicKey::from_public_key_der(spki.raw)
                .map_err(|e| VerifyError::malformed("certificate RSA key", e))?;
            Ok(cert_key.n() == &BigUint::from_bytes_be(n)
                && cert_key.e() == &BigUint::from_bytes_be(e))
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum EcdsaEncoding {
    Asn1Der,
    RawFixed,
}

fn verify_with_spki(
    alg: CoseAlgorithm,
    cert_or_spki_der: &[u8],
    message: &[u8],
    sig: &[u8],
    encoding: EcdsaEncoding,
) -> Result<(), VerifyError> {
    let spki = extract_spki_der(cert_or_spki_der)?;

    match alg {
        CoseAlgorithm::ES256 => {
            let pk = p256::PublicKey::from_public_key_der(&spki)
                .map_err(|e| VerifyError::malformed("P-256 public key", e))?;
            let ep = pk.to_encoded_point(false);
            let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                .map_err(|e| VerifyError::malformed("P-256 public key", e))?;
            let signature = match encoding {
                EcdsaEncoding::Asn1Der => p256::ecdsa::Signature::from_der(sig),
                EcdsaEncoding::RawFixed => p256::ecdsa::Signature::from_slice(sig),
            }
            .map_err(|e| VerifyError::SignatureInvalid(format!("bad ES256 signature: {e}")))?;
            vk.verify(message, &signature).map_err(signature_failed)
        }
        CoseAlgorithm::ES384 => {
            let pk = p384::PublicKey::from_public_key_der(&spki)
                .map_err(|e| VerifyError::malformed("P-384 public key", e))?;
            let ep = pk.to_encoded_point(false);
            let vk = p384::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                .map_err(|e| VerifyError::malformed("P-384 public key", e))?;
            let signature = match encoding {
                EcdsaEncoding::Asn1Der => p384::ecdsa::Signature::from_der(sig),
                EcdsaEncoding::RawFixed => p384::ecdsa::Signature::from_slice(sig),
            }
            .map_err(|e| VerifyError::SignatureInvalid(format!("bad ES384 signature: {e}")))?;
            vk.verify(message, &signature).map_err(signature_failed)
        }
        CoseAlgorithm::ES512 => {
            let pk = p521::PublicKey::from_public_key_der(&spki)
                .map_err(|e| VerifyError::malformed("P-521 public key", e))?;
            let ep = pk.to_encoded_point(false);
            let vk = p521::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                .map_err(|e| VerifyError::malformed("P-521 public key", e))?;
            let signature = match encoding {
                EcdsaEncoding::Asn1Der => p521::ecdsa::Signature::from_der(sig),
                EcdsaEncoding::RawFixed => p521::ecdsa::Signature::from_slice(sig),
            }
            .map_err(|e| VerifyError::SignatureInvalid(format!("bad ES512 signature: {e}")))?;
            vk.verify(message, &signature).map_err(signature_failed)
        }
        CoseAlgorithm::RS256 => {
            let key = RsaPublicKey::from_public_key_der(&spki)
                .map_err(|e| VerifyError::malformed("RSA public key", e))?;
            let vk = pkcs1v15::VerifyingKey::<Sha256>::new(key);
            let signature = pkcs1v15::Signature::try_from(sig)
                .map_err(|e| VerifyError::SignatureInvalid(format!("bad RS256 signature: {e}")))?;
            vk.verify(message, &signature).map_err(signature_failed)
        }
        CoseAlgorithm::EdDsa => {
            // RFC 8410: the SPKI BIT STRING is the raw Ed25519 key.
            let (_, parsed) = x509_parser::x509::SubjectPublicKeyInfo::from_der(&spki)
                .map_err(|e| VerifyError::malformed("Ed25519 SPKI", e))?;
            let vk = ed25519_key_from_bytes(parsed.subject_public_key.data.as_ref())?;
            let signature = ed25519_dalek::Signature::from_slice(sig)
                .map_err(|e| VerifyError::SignatureInvalid(format!("bad EdDSA signature: {e}")))?;
            vk.verify(message, &signature).map_err(signature_failed)
        }
    }
}

/// Normalizes DER input into SPKI DER: certificates have their SPKI
/// extracted, anything else is assumed to already be SPKI DER.
fn extract_spki_der(der: &[u8]) -> Result<Vec<u8>, VerifyError> {
    if let Ok((_, cert)) = x509_parser::parse_x509_certificate(der) {
        return Ok(cert.tbs_certificate.subject_pki.raw.to_vec());
    }
    Ok(der.to_vec())
}

fn signature_failed(_: impl std::fmt::Display) -> VerifyError {
    VerifyError::SignatureInvalid("signature verification failed".to_string())
}

fn p256_key_from_coordinates(x: &[u8], y: &[u8]) -> Result<p256::ecdsa::VerifyingKey, VerifyError> {
    if x.len() != 32 || y.len() != 32 {
        return Err(VerifyError::InputMalformed(
            "P-256 coordinates must be 32 bytes".to_string(),
        ));
    }
    let point = p256::EncodedPoint::from_affine_coordinates(
        p256::FieldBytes::from_slice(x),
        p256::FieldBytes::from_slice(y),
        false,
    );
    p256::ecdsa::VerifyingKey::from_encoded_point(&point)
        .map_err(|e| VerifyError::malformed("P-256 public key", e))
}

fn p384_key_from_coordinates(x: &[u8], y: &[u8]) -> Result<p384::ecdsa::VerifyingKey, VerifyError> {
    if x.len() != 48 || y.len() != 48 {
        return Err(VerifyError::InputMalformed(
            "P-384 coordinates must be 48 bytes".to_string(),
        ));
    }
    let point = p384::EncodedPoint::from_affine_coordinates(
        p384::FieldBytes::from_slice(x),
        p384::FieldBytes::from_slice(y),
        false,
    );
    p384::ecdsa::VerifyingKey::from_encoded_point(&point)
        .map_err(|e| VerifyError::malformed("P-384 public key", e))
}

fn p521_key_from_coordinates(x: &[u8], y: &[u8]) -> Result<p521::ecdsa::VerifyingKey, VerifyError> {
    if x.len() != 66 || y.len() != 66 {
        return Err(VerifyError::InputMalformed(
            "P-521 coordinates must be 66 bytes".to_string(),
        ));
    }
    let point = p521::EncodedPoint::from_affine_coordinates(
        p521::FieldBytes::from_slice(x),
        p521::FieldBytes::from_slice(y),
        false,
    );
    p521::ecdsa::VerifyingKey::from_encoded_point(&point)
        .map_err(|e| VerifyError::malformed("P-521 public key", e))
}

fn rsa_key_from_parts(n: &[u8], e: &[u8]) -> Result<pkcs1v15::VerifyingKey<Sha256>, VerifyError> {
    let key = RsaPublicKey::new(BigUint::from_bytes_be(n), BigUint::from_bytes_be(e))
        .map_err(|e| VerifyError::malformed("RSA public key", e))?;
    Ok(pkcs1v15::VerifyingKey::<Sha256>::new(key))
}

fn ed25519_key_from_bytes(x: &[u8]) -> Result<ed25519_dalek::VerifyingKey, VerifyError> {
    let bytes: [u8; 32] = x
        .try_into()
        .map_err(|_| VerifyError::InputMalformed("Ed25519 key must be 32 bytes".to_string()))?;
    ed25519_dalek::VerifyingKey::from_bytes(&bytes)
        .map_err(|e| VerifyError::malformed("Ed25519 public key", e))
}
