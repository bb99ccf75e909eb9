// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `packed` attestation (WebAuthn §8.2).
//!
//! Two trust models share this format:
//! - Basic/AttCA: `x5c` is present; the leaf certificate key signs
//!   `authenticatorData ‖ clientDataHash` and the chain is validated
//!   against any pinned `packed` roots.
//! - Self attestation: no `x5c`; the *credential's own* key signs, and
//!   `alg` must equal the credential key's algorithm.

use fido2rp_abstractions::{AttestationFormat, CoseAlgorithm, VerifyError};
use fido2rp_validation::{verify_signature, verify_signature_with_certificate};
use fido2rp_x509::validate_certificate_path;

use crate::cert_ext::verify_aaguid_extension_matches;
use crate::{AttestationContext, VerifiedAttestation};

pub(crate) fn verify(
    alg: CoseAlgorithm,
    sig: &[u8],
    x5c: Option<&[Vec<u8>]>,
    ctx: &AttestationContext<'_>,
) -> Result<VerifiedAttestation, VerifyError> {
    let signature_base = ctx.signature_base();

    match x5c {
        Some(certs) => {
            let leaf = &certs[0];
            verify_signature_with_certificate(alg, leaf, &signature_base, sig)?;

            // If the leaf carries the FIDO AAGUID extension it must agree
            // with the authenticator data.
            let aaguid = ctx.attested_credential()?.aaguid;
            verify_aaguid_extension_matches(leaf, &aaguid)?;

            let roots = ctx.roots_for(AttestationFormat::Packed);
            if roots.is_empty() {
                tracing::debug!("no packed roots pinned; skipping certificate path validation");
            } else {
                validate_certificate_path(certs, &roots)?;
            }

            Ok(VerifiedAttestation::with_trust_path(certs.to_vec()))
        }
        None => {
            // Self attestation: the statement algorithm must match the
            // credential key, and the credential key itself verifies.
            let credential = ctx.attested_credential()?;
            let key_alg = credential.credential_public_key.alg();
            if alg != key_alg {
                return Err(VerifyError::UnsupportedAlgorithm(format!(
                    "packed self-attestation alg {alg:?} does not match credential key alg {key_alg:?}"
                )));
            }

            verify_signature(&credential.credential_public_key, &signature_base, sig)?;
            Ok(VerifiedAttestation::without_trust_path())
        }
    }
}
