// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Verification error taxonomy.
//!
//! Every expected negotiation or validation failure is a `VerifyError` value
//! returned through `Result`; nothing in the verification path panics on
//! attacker-controlled input. Each variant carries a human-readable message
//! and maps to a stable machine-readable code via [`VerifyError::code`],
//! suitable for callers that only want a boolean verdict plus a reason.

/// A verification failure with a stable reason code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// CBOR/DER/base64/JSON structurally invalid, truncated buffers, or
    /// required fields missing.
    #[error("malformed input: {0}")]
    InputMalformed(String),

    /// Client data challenge did not equal the expected challenge.
    #[error("challenge mismatch: {0}")]
    ChallengeMismatch(String),

    /// Client data origin was not one of the expected origins.
    #[error("origin mismatch: {0}")]
    OriginMismatch(String),

    /// Authenticator RP ID hash did not match any expected RP ID.
    #[error("RP ID mismatch: {0}")]
    RpIdMismatch(String),

    /// Client data `type` was not the one required by the ceremony.
    #[error("client data type mismatch: {0}")]
    TypeMismatch(String),

    /// The authenticator did not assert user presence.
    #[error("user presence flag (UP) was not set")]
    UserPresenceRequired,

    /// User verification was required by policy but not asserted.
    #[error("user verification flag (UV) was not set")]
    UserVerificationRequired,

    /// A COSE algorithm, curve, or algorithm/curve pairing outside the
    /// supported set. Always fails closed.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// An attestation statement format this implementation does not know.
    /// Never silently degrades to `none`.
    #[error("unsupported attestation format: {0}")]
    UnsupportedFormat(String),

    /// A cryptographic signature check failed.
    #[error("signature invalid: {0}")]
    SignatureInvalid(String),

    /// Certificate-path validation failed: no root matched, a certificate
    /// was outside its validity window, or a link did not verify.
    #[error("certificate chain untrusted: {0}")]
    ChainUntrusted(String),

    /// Backup state asserted for a credential that is not backup eligible
    /// (`BE=0, BS=1`).
    #[error("impossible backup flags: BS set without BE")]
    BackupFlagsImpossible,

    /// The authenticator reported a sign counter that did not advance.
    /// Possible cloned authenticator.
    #[error("sign counter regression: stored {stored}, received {received}")]
    CounterRegression { stored: u32, received: u32 },
}

impl VerifyError {
    /// Stable machine-readable reason code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            VerifyError::InputMalformed(_) => "INPUT_MALFORMED",
            VerifyError::ChallengeMismatch(_) => "CHALLENGE_MISMATCH",
            VerifyError::OriginMismatch(_) => "ORIGIN_MISMATCH",
            VerifyError::RpIdMismatch(_) => "RP_ID_MISMATCH",
            VerifyError::TypeMismatch(_) => "TYPE_MISMATCH",
            VerifyError::UserPresenceRequired => "USER_PRESENCE_REQUIRED",
            VerifyError::UserVerificationRequired => "USER_VERIFICATION_REQUIRED",
            VerifyError::UnsupportedAlgorithm(_) => "UNSUPPORTED_ALGORITHM",
            VerifyError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            VerifyError::SignatureInvalid(_) => "SIGNATURE_INVALID",
            VerifyError::ChainUntrusted(_) => "CHAIN_UNTRUSTED",
            VerifyError::BackupFlagsImpossible => "BACKUP_FLAGS_IMPOSSIBLE",
            VerifyError::CounterRegression { .. } => "COUNTER_REGRESSION",
        }
    }

    /// Wraps a low-level codec error message as `InputMalformed`.
    pub fn malformed(context: &str, detail: impl std::fmt::Display) -> Self {
        VerifyError::InputMalformed(format!("{context}: {detail}"))
    }
}
