// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! FIDO Metadata Service BLOB handling.
//!
//! The metadata BLOB is a JWT: three dot-separated base64url parts. The
//! header embeds the signing certificate chain; the payload carries
//! authenticator metadata entries keyed by AAGUID. Fetching and caching the
//! BLOB is the caller's concern — this crate only splits, parses and
//! verifies.
//!
//! Signature verification reuses the shared dispatcher, and the header
//! chain can be validated against roots pinned under the `mds` identifier.

use serde::Deserialize;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use fido2rp_abstractions::{
    Aaguid, CoseAlgorithm, RootCertificateIdentifier, RootCertificateSource, VerifyError,
};
use fido2rp_common::base64url;
use fido2rp_validation::verify_jws_signature;
use fido2rp_x509::validate_certificate_path;

/// JWT header of a metadata BLOB.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataBlobHeader {
    pub alg: String,
    /// Standard-base64 DER certificates, leaf first.
    #[serde(default)]
    pub x5c: Vec<String>,
}

/// One BLOB entry. Only the fields relying parties key on are typed; the
/// full metadata statement stays generic JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataBlobEntry {
    #[serde(default)]
    pub aaguid: Option<String>,
    #[serde(rename = "attestationCertificateKeyIdentifiers", default)]
    pub attestation_certificate_key_identifiers: Vec<String>,
    #[serde(rename = "timeOfLastStatusChange", default)]
    pub time_of_last_status_change: Option<String>,
    #[serde(rename = "statusReports", default)]
    pub status_reports: Vec<serde_json::Value>,
    #[serde(rename = "metadataStatement", default)]
    pub metadata_statement: Option<serde_json::Value>,
}

/// JWT payload of a metadata BLOB.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataBlobPayload {
    #[serde(rename = "legalHeader", default)]
    pub legal_header: Option<String>,
    /// Serial number; increases with every published BLOB.
    pub no: i64,
    #[serde(rename = "nextUpdate")]
    pub next_update: String,
    pub entries: Vec<MetadataBlobEntry>,
}

impl MetadataBlobPayload {
    /// Finds the entry for an authenticator model, if the BLOB has one.
    pub fn entry_for_aaguid(&self, aaguid: &Aaguid) -> Option<&MetadataBlobEntry> {
        let wanted = aaguid.to_string();
        self.entries
            .iter()
            .find(|entry| entry.aaguid.as_deref() == Some(wanted.as_str()))
    }
}

/// A split-and-decoded metadata JWT, not yet verified.
#[derive(Debug, Clone)]
pub struct ParsedMetadataJwt {
    pub header: MetadataBlobHeader,
    pub payload: MetadataBlobPayload,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
    /// The exact `header.payload` bytes the signature covers.
    pub signed_bytes: Vec<u8>,
}

/// Splits a metadata JWT into header, payload and signature.
pub fn parse_metadata_jwt(jwt: &str) -> Result<ParsedMetadataJwt, VerifyError> {
    let mut parts = jwt.trim().split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(VerifyError::InputMalformed(
            "metadata BLOB is not a three-part JWT".to_string(),
        ));
    };

    let header: MetadataBlobHeader = serde_json::from_str(&base64url::decode_to_utf8(header_b64)?)
        .map_err(|e| VerifyError::malformed("metadata JWT header", e))?;
    let payload: MetadataBlobPayload =
        serde_json::from_str(&base64url::decode_to_utf8(payload_b64)?)
            .map_err(|e| VerifyError::malformed("metadata JWT payload", e))?;
    let signature = base64url::decode(signature_b64)?;

    Ok(ParsedMetadataJwt {
        header,
        payload,
        signature,
        signed_bytes: format!("{header_b64}.{payload_b64}").into_bytes(),
    })
}

/// Parses and verifies a metadata BLOB, returning its payload.
///
/// The JWS signature is checked against the leaf of the header's embedded
/// chain; the chain itself is validated when `mds` roots are pinned.
pub fn verify_metadata_jwt(
    jwt: &str,
    roots: &dyn RootCertificateSource,
) -> Result<MetadataBlobPayload, VerifyError> {
    let parsed = parse_metadata_jwt(jwt)?;

    let alg = match parsed.header.alg.as_str() {
        "RS256" => CoseAlgorithm::RS256,
        "ES256" => CoseAlgorithm::ES256,
        other => {
            return Err(VerifyError::UnsupportedAlgorithm(format!(
                "metadata JWT alg {other}"
            )))
        }
    };

    if parsed.header.x5c.is_empty() {
        return Err(VerifyError::InputMalformed(
            "metadata JWT header has no x5c".to_string(),
        ));
    }
    let x5c: Vec<Vec<u8>> = parsed
        .header
        .x5c
        .iter()
        .map(|cert| {
            STANDARD
                .decode(cert)
                .map_err(|e| VerifyError::malformed("metadata x5c entry", e))
        })
        .collect::<Result<_, _>>()?;

    verify_jws_signature(alg, &x5c[0], &parsed.signed_bytes, &parsed.signature)?;

    let pinned = roots.root_certificates(RootCertificateIdentifier::Mds);
    if pinned.is_empty() {
        tracing::debug!("no mds roots pinned; skipping certificate path validation");
    } else {
        validate_certificate_path(&x5c, &pinned)?;
    }

    Ok(parsed.payload)
}
