// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Attestation statement verification.
//!
//! One verifier per statement format, all behind a single exhaustive
//! dispatch on the [`AttestationStatement`] sum type. Adding a format to
//! the statement enum without adding a verifier arm is a compile error,
//! so nothing can fall through to a trivially-verified path.
//!
//! Every verifier receives the same inputs — the decoded statement, the
//! authenticator data (raw and parsed), the client data hash and the
//! root-certificate lookup — and produces a trust path or a failure with a
//! format-specific reason. No format ever degrades to `none`.

mod android_key;
mod android_safetynet;
mod apple;
mod cert_ext;
mod fido_u2f;
mod packed;
mod tpm;

use fido2rp_abstractions::{
    AttestationFormat, AttestationStatement, RootCertificateIdentifier, RootCertificateSource,
    VerifyError,
};
use fido2rp_common::{AttestedCredentialData, AuthenticatorData};

/// Inputs shared by every attestation verifier.
pub struct AttestationContext<'a> {
    /// The authenticator data exactly as signed (raw bytes).
    pub auth_data_raw: &'a [u8],
    /// The same bytes, parsed.
    pub auth_data: &'a AuthenticatorData,
    /// SHA-256 of the raw client data JSON.
    pub client_data_hash: &'a [u8; 32],
    /// Pinned roots, looked up per format.
    pub roots: &'a dyn RootCertificateSource,
}

impl<'a> AttestationContext<'a> {
    /// The attested credential data; required for every registration.
    pub(crate) fn attested_credential(&self) -> Result<&'a AttestedCredentialData, VerifyError> {
        self.auth_data.attested_credential_data.as_ref().ok_or_else(|| {
            VerifyError::InputMalformed(
                "authenticator data carries no attested credential data".to_string(),
            )
        })
    }

    /// `authenticatorData ‖ clientDataHash`, the signature base shared by
    /// most formats.
    pub(crate) fn signature_base(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.auth_data_raw.len() + self.client_data_hash.len());
        out.extend_from_slice(self.auth_data_raw);
        out.extend_from_slice(self.client_data_hash);
        out
    }

    /// PEM roots pinned for `format`; empty means none are pinned.
    pub(crate) fn roots_for(&self, format: AttestationFormat) -> Vec<String> {
        self.roots
            .root_certificates(RootCertificateIdentifier::Format(format))
    }
}

/// Outcome of a successful attestation verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAttestation {
    /// DER certificates establishing provenance, leaf first. Empty for
    /// `none` and for self-attestation.
    pub trust_path: Vec<Vec<u8>>,
}

impl VerifiedAttestation {
    pub(crate) fn without_trust_path() -> Self {
        Self { trust_path: Vec::new() }
    }

    pub(crate) fn with_trust_path(trust_path: Vec<Vec<u8>>) -> Self {
        Self { trust_path }
    }
}

/// Verifies an attestation statement against the ceremony inputs.
pub fn verify_attestation_statement(
    statement: &AttestationStatement,
    ctx: &AttestationContext<'_>,
) -> Result<VerifiedAttestation, VerifyError> {
    match statement {
        // `none` is an explicit opt-out of attestation: trivially verified
        // with an empty trust path. Policy rejection belongs to callers.
        AttestationStatement::None => Ok(VerifiedAttestation::without_trust_path()),
        AttestationStatement::Packed { alg, sig, x5c } => {
            packed::verify(*alg, sig, x5c.as_deref(), ctx)
        }
        AttestationStatement::FidoU2f { sig, x5c } => fido_u2f::verify(sig, x5c, ctx),
        AttestationStatement::AndroidKey { alg, sig, x5c } => {
            android_key::verify(*alg, sig, x5c, ctx)
        }
        AttestationStatement::AndroidSafetyNet { ver, response } => {
            android_safetynet::verify(ver, response, ctx)
        }
        AttestationStatement::Apple { x5c } => apple::verify(x5c, ctx),
        AttestationStatement::Tpm {
            ver,
            alg,
            sig,
            x5c,
            cert_info,
            pub_area,
        } => tpm::verify(ver, *alg, sig, x5c, cert_info, pub_area, ctx),
    }
}
