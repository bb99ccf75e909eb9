// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Attestation statement formats and decoded statements.
//!
//! The WebAuthn registry of attestation formats is closed from this
//! implementation's point of view: `fmt` strings map into
//! [`AttestationFormat`] or fail as `UnsupportedFormat`. The decoded
//! statement is a sum type whose variant always matches the decoded `fmt`,
//! so format dispatch is an exhaustive `match` and a misspelled or
//! newly-added format can never fall through to a trivially-verified path.

use crate::cose::CoseAlgorithm;
use crate::error::VerifyError;

/// Attestation statement format identifiers (WebAuthn §8).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AttestationFormat {
    Packed,
    Tpm,
    AndroidKey,
    AndroidSafetyNet,
    Apple,
    FidoU2f,
    None,
}

impl AttestationFormat {
    /// Maps a `fmt` string from an attestation object.
    pub fn from_fmt(fmt: &str) -> Result<Self, VerifyError> {
        match fmt {
            "packed" => Ok(AttestationFormat::Packed),
            "tpm" => Ok(AttestationFormat::Tpm),
            "android-key" => Ok(AttestationFormat::AndroidKey),
            "android-safetynet" => Ok(AttestationFormat::AndroidSafetyNet),
            "apple" => Ok(AttestationFormat::Apple),
            "fido-u2f" => Ok(AttestationFormat::FidoU2f),
            "none" => Ok(AttestationFormat::None),
            other => Err(VerifyError::UnsupportedFormat(other.to_string())),
        }
    }

    /// The registered `fmt` identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttestationFormat::Packed => "packed",
            AttestationFormat::Tpm => "tpm",
            AttestationFormat::AndroidKey => "android-key",
            AttestationFormat::AndroidSafetyNet => "android-safetynet",
            AttestationFormat::Apple => "apple",
            AttestationFormat::FidoU2f => "fido-u2f",
            AttestationFormat::None => "none",
        }
    }
}

impl std::fmt::Display for AttestationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded attestation statement.
///
/// Each variant holds exactly the fields its format's CBOR defines. Field
/// presence and types have been checked by the decoder; trust decisions
/// happen in `fido2rp-attestation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationStatement {
    /// `none`: explicit opt-out of attestation. Carries nothing.
    None,
    /// `packed`: self attestation (no `x5c`) or basic/AttCA attestation.
    Packed {
        alg: CoseAlgorithm,
        sig: Vec<u8>,
        x5c: Option<Vec<Vec<u8>>>,
    },
    /// `fido-u2f`: legacy U2F attestation. Always certificate-based.
    FidoU2f { sig: Vec<u8>, x5c: Vec<Vec<u8>> },
    /// `android-key`: Android Keystore key attestation.
    AndroidKey {
        alg: CoseAlgorithm,
        sig: Vec<u8>,
        x5c: Vec<Vec<u8>>,
    },
    /// `android-safetynet`: a signed SafetyNet JWS in `response`.
    AndroidSafetyNet { ver: String, response: Vec<u8> },
    /// `apple`: Apple anonymous attestation. No signature field; trust
    /// comes entirely from the certificate chain.
    Apple { x5c: Vec<Vec<u8>> },
    /// `tpm`: TPM 2.0 attestation with raw TPMS_ATTEST / TPMT_PUBLIC blobs.
    Tpm {
        ver: String,
        alg: CoseAlgorithm,
        sig: Vec<u8>,
        x5c: Vec<Vec<u8>>,
        cert_info: Vec<u8>,
        pub_area: Vec<u8>,
    },
}

impl AttestationStatement {
    /// The format this statement was decoded from.
    pub fn format(&self) -> AttestationFormat {
        match self {
            AttestationStatement::None => AttestationFormat::None,
            AttestationStatement::Packed { .. } => AttestationFormat::Packed,
            AttestationStatement::FidoU2f { .. } => AttestationFormat::FidoU2f,
            AttestationStatement::AndroidKey { .. } => AttestationFormat::AndroidKey,
            AttestationStatement::AndroidSafetyNet { .. } => AttestationFormat::AndroidSafetyNet,
            AttestationStatement::Apple { .. } => AttestationFormat::Apple,
            AttestationStatement::Tpm { .. } => AttestationFormat::Tpm,
        }
    }
}

/// Authenticator model identifier from attested credential data.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Aaguid(pub [u8; 16]);

impl Aaguid {
    pub const ZERO: Aaguid = Aaguid([0u8; 16]);

    /// True for the all-zero AAGUID used by self- and none-attestation.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl std::fmt::Display for Aaguid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        uuid::Uuid::from_bytes(self.0).fmt(f)
    }
}
