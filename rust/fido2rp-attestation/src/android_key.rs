// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `android-key` attestation (WebAuthn §8.4).
//!
//! The leaf certificate carries an Android key-attestation record
//! (KeyDescription, OID 1.3.6.1.4.1.11129.2.1.17) describing how the key
//! was generated. Verification cross-checks the record's embedded challenge
//! against the client data hash and rejects keys usable by arbitrary
//! applications. An absent or malformed record is a failure, never a pass.

use der_parser::ber::{BerObject, BerObjectContent};
use der_parser::der::parse_der;

use fido2rp_abstractions::{AttestationFormat, CoseAlgorithm, VerifyError};
use fido2rp_validation::{public_key_matches_certificate, verify_signature_with_certificate};
use fido2rp_x509::validate_certificate_path;

use crate::cert_ext::{extension_value, parse_certificate};
use crate::{AttestationContext, VerifiedAttestation};

/// OID of the Android KeyDescription certificate extension.
const OID_ANDROID_KEY_DESCRIPTION: &str = "1.3.6.1.4.1.11129.2.1.17";

/// KeyMint tag for `allApplications`: a key any app may use must not be a
/// WebAuthn credential.
const TAG_ALL_APPLICATIONS: u32 = 600;

/// Security level 0 is `Software` (no TEE/StrongBox involvement).
const SECURITY_LEVEL_SOFTWARE: u64 = 0;

pub(crate) fn verify(
    alg: CoseAlgorithm,
    sig: &[u8],
    x5c: &[Vec<u8>],
    ctx: &AttestationContext<'_>,
) -> Result<VerifiedAttestation, VerifyError> {
    let leaf_der = &x5c[0];

    verify_signature_with_certificate(alg, leaf_der, &ctx.signature_base(), sig)?;

    // The certified key must be the credential key.
    let credential = ctx.attested_credential()?;
    if !public_key_matches_certificate(&credential.credential_public_key, leaf_der)? {
        return Err(VerifyError::ChainUntrusted(
            "android-key certificate does not certify the credential key".to_string(),
        ));
    }

    let leaf = parse_certificate(leaf_der)?;
    let Some(ext) = extension_value(&leaf, OID_ANDROID_KEY_DESCRIPTION) else {
        return Err(VerifyError::InputMalformed(
            "android-key certificate is missing the KeyDescription extension".to_string(),
        ));
    };
    let description = parse_key_description(ext)?;

    if description.attestation_challenge != *ctx.client_data_hash {
        return Err(VerifyError::ChallengeMismatch(
            "KeyDescription attestationChallenge does not equal the client data hash".to_string(),
        ));
    }

    if description.software_all_applications || description.tee_all_applications {
        return Err(VerifyError::ChainUntrusted(
            "android-key KeyDescription permits use by all applications".to_string(),
        ));
    }

    if description.attestation_security_level == SECURITY_LEVEL_SOFTWARE
        || description.keymint_security_level == SECURITY_LEVEL_SOFTWARE
    {
        // Software-backed attestation is the documented minimum; accepted
        // but worth surfacing.
        tracing::warn!(
            attestation = description.attestation_security_level,
            keymint = description.keymint_security_level,
            "android-key attestation is software-backed"
        );
    }

    let roots = ctx.roots_for(AttestationFormat::AndroidKey);
    if roots.is_empty() {
        tracing::debug!("no android-key roots pinned; skipping certificate path validation");
    } else {
        validate_certificate_path(x5c, &roots)?;
    }

    Ok(VerifiedAttestation::with_trust_path(x5c.to_vec()))
}

struct KeyDescription {
    attestation_security_level: u64,
    keymint_security_level: u64,
    attestation_challenge: [u8; 32],
    software_all_applications: bool,
    tee_all_applications: bool,
}

/// Parses the KeyDescription SEQUENCE:
///
/// ```text
/// SEQUENCE {
///   attestationVersion INTEGER,
///   attestationSecurityLevel ENUMERATED,
///   keyMintVersion INTEGER,
///   keyMintSecurityLevel ENUMERATED,
///   attestationChallenge OCTET STRING,
///   uniqueId OCTET STRING,
///   softwareEnforced AuthorizationList,
///   hardwareEnforced AuthorizationList,
/// }
/// ```
fn parse_key_description(ext_value: &[u8]) -> Result<KeyDescription, VerifyError> {
    let malformed = |what: &str| VerifyError::InputMalformed(format!("KeyDescription: {what}"));

    let (_, outer) =
        parse_der(ext_value).map_err(|e| VerifyError::malformed("KeyDescription", e))?;
    let items = outer
        .as_sequence()
        .map_err(|_| malformed("not a SEQUENCE"))?;
    if items.len() < 8 {
        return Err(malformed("fewer than 8 fields"));
    }

    let attestation_security_level =
        enumerated_value(&items[1]).ok_or_else(|| malformed("bad attestationSecurityLevel"))?;
    let keymint_security_level =
        enumerated_value(&items[3]).ok_or_else(|| malformed("bad keyMintSecurityLevel"))?;

    let challenge = items[4]
        .content
        .as_slice()
        .map_err(|_| malformed("bad attestationChallenge"))?;
    let attestation_challenge: [u8; 32] = challenge
        .try_into()
        .map_err(|_| malformed("attestationChallenge is not 32 bytes"))?;

    Ok(KeyDescription {
        attestation_security_level,
        keymint_security_level,
        attestation_challenge,
        software_all_applications: authorization_list_has_tag(&items[6], TAG_ALL_APPLICATIONS)?,
        tee_all_applications: authorization_list_has_tag(&items[7], TAG_ALL_APPLICATIONS)?,
    })
}

fn enumerated_value(obj: &BerObject<'_>) -> Option<u64> {
    match &obj.content {
        BerObjectContent::Enum(v) => Some(*v),
        BerObjectContent::Integer(_) => obj.as_u64().ok(),
        _ => None,
    }
}

fn authorization_list_has_tag(list: &BerObject<'_>, tag: u32) -> Result<bool, VerifyError> {
    let items = list.as_sequence().map_err(|_| {
        VerifyError::InputMalformed("KeyDescription: AuthorizationList is not a SEQUENCE".to_string())
    })?;
    Ok(items.iter().any(|item| item.header.tag().0 == tag))
}
