// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `apple` anonymous attestation (WebAuthn §8.8).
//!
//! There is no signature field. Trust comes from the certificate chain:
//! the leaf certifies the credential public key itself, and binds the
//! ceremony via a nonce extension containing
//! `SHA-256(authenticatorData ‖ clientDataHash)`.

use der_parser::der::parse_der;

use fido2rp_abstractions::{AttestationFormat, VerifyError};
use fido2rp_validation::{public_key_matches_certificate, sha256};
use fido2rp_x509::validate_certificate_path;

use crate::cert_ext::{extension_value, parse_certificate};
use crate::{AttestationContext, VerifiedAttestation};

/// OID of Apple's anonymous-attestation nonce extension.
const OID_APPLE_NONCE: &str = "1.2.840.113635.100.8.2";

pub(crate) fn verify(
    x5c: &[Vec<u8>],
    ctx: &AttestationContext<'_>,
) -> Result<VerifiedAttestation, VerifyError> {
    let leaf_der = &x5c[0];
    let expected_nonce = sha256(ctx.signature_base());

    let leaf = parse_certificate(leaf_der)?;
    let Some(ext) = extension_value(&leaf, OID_APPLE_NONCE) else {
        return Err(VerifyError::InputMalformed(
            "apple attestation certificate is missing the nonce extension".to_string(),
        ));
    };
    let nonce = extract_nonce(ext)?;
    if nonce != expected_nonce {
        return Err(VerifyError::SignatureInvalid(
            "apple attestation nonce does not match the ceremony hash".to_string(),
        ));
    }

    // The leaf must certify the credential key itself.
    let credential = ctx.attested_credential()?;
    if !public_key_matches_certificate(&credential.credential_public_key, leaf_der)? {
        return Err(VerifyError::ChainUntrusted(
            "apple attestation certificate does not certify the credential key".to_string(),
        ));
    }

    let roots = ctx.roots_for(AttestationFormat::Apple);
    if roots.is_empty() {
        tracing::debug!("no apple roots pinned; skipping certificate path validation");
    } else {
        validate_certificate_path(x5c, &roots)?;
    }

    Ok(VerifiedAttestation::with_trust_path(x5c.to_vec()))
}

/// The extension value is `SEQUENCE { [1] { OCTET STRING nonce } }`.
fn extract_nonce(ext_value: &[u8]) -> Result<[u8; 32], VerifyError> {
    let (_, outer) = parse_der(ext_value)
        .map_err(|e| VerifyError::malformed("apple nonce extension", e))?;
    let items = outer
        .as_sequence()
        .map_err(|e| VerifyError::malformed("apple nonce extension", e))?;
    let tagged = items.first().ok_or_else(|| {
        VerifyError::InputMalformed("apple nonce extension sequence is empty".to_string())
    })?;
    let inner = tagged
        .content
        .as_slice()
        .map_err(|e| VerifyError::malformed("apple nonce extension", e))?;
    let (_, nonce_obj) =
        parse_der(inner).map_err(|e| VerifyError::malformed("apple nonce extension", e))?;
    let nonce = nonce_obj
        .content
        .as_slice()
        .map_err(|e| VerifyError::malformed("apple nonce extension", e))?;
    nonce.try_into().map_err(|_| {
        VerifyError::InputMalformed("apple nonce is not 32 bytes".to_string())
    })
}
