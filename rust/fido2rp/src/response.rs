// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Wire-format ceremony responses.
//!
//! These mirror the JSON a browser client sends after
//! `navigator.credentials.create()` / `.get()`: every binary field is
//! unpadded base64url text. Decoding to raw bytes happens inside the
//! orchestrators.

use serde::Deserialize;

/// Registration (attestation) response as received from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationResponse {
    /// base64url credential ID.
    pub id: String,
    /// base64url credential ID, as raw bytes on the client.
    #[serde(rename = "rawId")]
    pub raw_id: String,
    /// Must be `public-key`.
    #[serde(rename = "type")]
    pub credential_type: String,
    pub response: AuthenticatorAttestationResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatorAttestationResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "attestationObject")]
    pub attestation_object: String,
}

/// Authentication (assertion) response as received from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticationResponse {
    pub id: String,
    #[serde(rename = "rawId")]
    pub raw_id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub response: AuthenticatorAssertionResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatorAssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: String,
    pub signature: String,
    #[serde(rename = "userHandle", default)]
    pub user_handle: Option<String>,
}

impl RegistrationResponse {
    /// Parses a registration response from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, fido2rp_abstractions::VerifyError> {
        serde_json::from_str(json)
            .map_err(|e| fido2rp_abstractions::VerifyError::malformed("registration response", e))
    }
}

impl AuthenticationResponse {
    /// Parses an authentication response from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, fido2rp_abstractions::VerifyError> {
        serde_json::from_str(json)
            .map_err(|e| fido2rp_abstractions::VerifyError::malformed("authentication response", e))
    }
}
