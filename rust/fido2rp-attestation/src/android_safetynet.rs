// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `android-safetynet` attestation (WebAuthn §8.5).
//!
//! The statement carries a SafetyNet attestation response: a JWS whose
//! header embeds the signing certificate chain and whose payload binds the
//! ceremony through a nonce over `SHA-256(authData ‖ clientDataHash)`.
//! Signature verification goes through the shared dispatcher; only ES256
//! and RS256 are accepted JWS algorithms.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use fido2rp_abstractions::{AttestationFormat, CoseAlgorithm, VerifyError};
use fido2rp_common::base64url;
use fido2rp_validation::{sha256, verify_jws_signature};
use fido2rp_x509::validate_certificate_path;

use crate::cert_ext::parse_certificate;
use crate::{AttestationContext, VerifiedAttestation};

/// Hostname Google issues SafetyNet signing certificates to.
const SAFETYNET_LEAF_HOSTNAME: &str = "attest.android.com";

/// Maximum accepted age of a SafetyNet response.
const MAX_RESPONSE_AGE_MS: u64 = 60_000;

#[derive(Debug, Deserialize)]
struct JwsHeader {
    alg: String,
    /// Standard-base64 DER certificates, leaf first.
    x5c: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SafetyNetPayload {
    nonce: String,
    timestamp_ms: u64,
    cts_profile_match: bool,
    #[serde(default)]
    basic_integrity: bool,
}

pub(crate) fn verify(
    ver: &str,
    response: &[u8],
    ctx: &AttestationContext<'_>,
) -> Result<VerifiedAttestation, VerifyError> {
    if ver.is_empty() {
        return Err(VerifyError::InputMalformed(
            "android-safetynet ver is empty".to_string(),
        ));
    }

    let response = std::str::from_utf8(response)
        .map_err(|e| VerifyError::malformed("SafetyNet response", e))?;
    let mut parts = response.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(VerifyError::InputMalformed(
            "SafetyNet response is not a three-part JWS".to_string(),
        ));
    };

    let header: JwsHeader = serde_json::from_str(&base64url::decode_to_utf8(header_b64)?)
        .map_err(|e| VerifyError::malformed("SafetyNet JWS header", e))?;
    let payload: SafetyNetPayload = serde_json::from_str(&base64url::decode_to_utf8(payload_b64)?)
        .map_err(|e| VerifyError::malformed("SafetyNet JWS payload", e))?;
    let signature = base64url::decode(signature_b64)?;

    let alg = match header.alg.as_str() {
        "RS256" => CoseAlgorithm::RS256,
        "ES256" => CoseAlgorithm::ES256,
        other => {
            return Err(VerifyError::UnsupportedAlgorithm(format!(
                "SafetyNet JWS alg {other}"
            )))
        }
    };

    if header.x5c.is_empty() {
        return Err(VerifyError::InputMalformed(
            "SafetyNet JWS header has no x5c".to_string(),
        ));
    }
    let x5c: Vec<Vec<u8>> = header
        .x5c
        .iter()
        .map(|cert| {
            STANDARD
                .decode(cert)
                .map_err(|e| VerifyError::malformed("SafetyNet x5c entry", e))
        })
        .collect::<Result<_, _>>()?;

    // The signing certificate must be issued to attest.android.com.
    let leaf = parse_certificate(&x5c[0])?;
    let leaf_cn = leaf
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string();
    if leaf_cn != SAFETYNET_LEAF_HOSTNAME {
        return Err(VerifyError::ChainUntrusted(format!(
            "SafetyNet leaf certificate CN '{leaf_cn}' is not {SAFETYNET_LEAF_HOSTNAME}"
        )));
    }

    // JWS signatures cover `header.payload` as ASCII.
    let signed_bytes = format!("{header_b64}.{payload_b64}");
    verify_jws_signature(alg, &x5c[0], signed_bytes.as_bytes(), &signature)?;

    // The payload nonce binds the JWS to this ceremony.
    let expected_nonce = STANDARD.encode(sha256(ctx.signature_base()));
    if payload.nonce != expected_nonce {
        return Err(VerifyError::SignatureInvalid(
            "SafetyNet nonce does not match the ceremony hash".to_string(),
        ));
    }

    if !payload.cts_profile_match {
        return Err(VerifyError::ChainUntrusted(
            "SafetyNet ctsProfileMatch is false".to_string(),
        ));
    }
    if !payload.basic_integrity {
        tracing::warn!("SafetyNet basicIntegrity is false");
    }

    check_freshness(payload.timestamp_ms, now_ms()?)?;

    let roots = ctx.roots_for(AttestationFormat::AndroidSafetyNet);
    if roots.is_empty() {
        tracing::debug!("no android-safetynet roots pinned; skipping certificate path validation");
    } else {
        validate_certificate_path(&x5c, &roots)?;
    }

    Ok(VerifiedAttestation::with_trust_path(x5c))
}

fn now_ms() -> Result<u64, VerifyError> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| VerifyError::malformed("system clock", e))
}

fn check_freshness(timestamp_ms: u64, now_ms: u64) -> Result<(), VerifyError> {
    if timestamp_ms > now_ms {
        return Err(VerifyError::ChainUntrusted(
            "SafetyNet timestamp is in the future".to_string(),
        ));
    }
    if now_ms - timestamp_ms > MAX_RESPONSE_AGE_MS {
        return Err(VerifyError::ChainUntrusted(
            "SafetyNet response is older than 60 seconds".to_string(),
        ));
    }
    Ok(())
}
