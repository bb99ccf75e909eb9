// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Client data JSON parsing.
//!
//! The browser serializes `CollectedClientData` as JSON and the
//! authenticator signs over its hash, so the raw bytes matter more than the
//! parsed form; parsing here is only for the type/challenge/origin checks
//! the orchestrator performs. Parsed once per ceremony, never persisted.

use serde::Deserialize;

use fido2rp_abstractions::VerifyError;

/// Token binding information, carried through but not evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenBinding {
    pub status: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// The client data document (WebAuthn §5.8.1). Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectedClientData {
    /// `"webauthn.create"` or `"webauthn.get"`.
    #[serde(rename = "type")]
    pub ceremony_type: String,
    /// base64url-encoded challenge bytes.
    pub challenge: String,
    pub origin: String,
    #[serde(rename = "crossOrigin", default)]
    pub cross_origin: Option<bool>,
    #[serde(rename = "tokenBinding", default)]
    pub token_binding: Option<TokenBinding>,
}

/// Parses raw client data JSON bytes.
pub fn parse_client_data_json(bytes: &[u8]) -> Result<CollectedClientData, VerifyError> {
    serde_json::from_slice(bytes).map_err(|e| VerifyError::malformed("client data JSON", e))
}
