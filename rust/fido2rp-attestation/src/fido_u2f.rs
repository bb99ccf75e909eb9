// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `fido-u2f` attestation (WebAuthn §8.6).
//!
//! Legacy U2F authenticators sign a fixed byte layout instead of the
//! generic `authData ‖ clientDataHash` base:
//!
//! ```text
//! 0x00 ‖ rpIdHash ‖ clientDataHash ‖ credentialId ‖ 0x04‖x‖y
//! ```
//!
//! The format predates AAGUIDs (the field must be zero) and only ever uses
//! P-256. Surrogate basic attestation — a leaf certificate with no chain to
//! a pinned root — is part of this format's trust model, so path validation
//! only runs when `fido-u2f` roots are pinned.

use fido2rp_abstractions::{AttestationFormat, CoseAlgorithm, CoseEllipticCurve, CoseKey, VerifyError};
use fido2rp_validation::verify_signature_with_certificate;
use fido2rp_x509::validate_certificate_path;

use crate::{AttestationContext, VerifiedAttestation};

pub(crate) fn verify(
    sig: &[u8],
    x5c: &[Vec<u8>],
    ctx: &AttestationContext<'_>,
) -> Result<VerifiedAttestation, VerifyError> {
    if x5c.len() != 1 {
        return Err(VerifyError::InputMalformed(format!(
            "fido-u2f requires exactly one attestation certificate, got {}",
            x5c.len()
        )));
    }

    let credential = ctx.attested_credential()?;
    if !credential.aaguid.is_zero() {
        return Err(VerifyError::InputMalformed(
            "fido-u2f requires a zero AAGUID".to_string(),
        ));
    }

    // The credential key must be EC2 on P-256.
    match &credential.credential_public_key {
        CoseKey::Ec2 {
            crv: CoseEllipticCurve::P256,
            ..
        } => {}
        other => {
            return Err(VerifyError::UnsupportedAlgorithm(format!(
                "fido-u2f requires a P-256 credential key, got {other:?}"
            )))
        }
    }
    let public_key_point = credential.credential_public_key.uncompressed_point()?;

    // Reconstruct the U2F registration signing payload.
    let mut signature_base =
        Vec::with_capacity(1 + 32 + 32 + credential.credential_id.len() + public_key_point.len());
    signature_base.push(0x00);
    signature_base.extend_from_slice(&ctx.auth_data.rp_id_hash);
    signature_base.extend_from_slice(ctx.client_data_hash);
    signature_base.extend_from_slice(&credential.credential_id);
    signature_base.extend_from_slice(&public_key_point);

    // U2F attestation certificates are always P-256/SHA-256.
    verify_signature_with_certificate(CoseAlgorithm::ES256, &x5c[0], &signature_base, sig)?;

    let roots = ctx.roots_for(AttestationFormat::FidoU2f);
    if roots.is_empty() {
        tracing::debug!("no fido-u2f roots pinned; accepting surrogate basic attestation");
    } else {
        validate_certificate_path(x5c, &roots)?;
    }

    Ok(VerifiedAttestation::with_trust_path(x5c.to_vec()))
}
