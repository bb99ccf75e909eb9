// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Checks shared by both ceremony orchestrators.

use fido2rp_abstractions::VerifyError;
use fido2rp_common::{base64url, parse_client_data_json, CollectedClientData};

use crate::options::ExpectedChallenge;

/// Decodes and validates client data: ceremony type, challenge and origin.
///
/// Returns the raw client data bytes (the signature base input) alongside
/// the parsed document.
pub(crate) fn validate_client_data(
    client_data_json_b64: &str,
    expected_type: &str,
    expected_challenge: &ExpectedChallenge,
    expected_origins: &[String],
) -> Result<(Vec<u8>, CollectedClientData), VerifyError> {
    let client_data_bytes = base64url::decode(client_data_json_b64)?;
    let client_data = parse_client_data_json(&client_data_bytes)?;

    if client_data.ceremony_type != expected_type {
        return Err(VerifyError::TypeMismatch(format!(
            "expected {expected_type}, got {}",
            client_data.ceremony_type
        )));
    }

    let reported_challenge = base64url::decode(&client_data.challenge)?;
    if reported_challenge != expected_challenge.bytes()? {
        return Err(VerifyError::ChallengeMismatch(
            "client data challenge does not equal the expected challenge".to_string(),
        ));
    }

    if !expected_origins.iter().any(|o| *o == client_data.origin) {
        return Err(VerifyError::OriginMismatch(format!(
            "origin {} is not in the expected set",
            client_data.origin
        )));
    }

    Ok((client_data_bytes, client_data))
}

/// The credential envelope checks common to both ceremonies.
pub(crate) fn validate_credential_envelope(
    credential_type: &str,
    id: &str,
    raw_id: &str,
) -> Result<Vec<u8>, VerifyError> {
    if credential_type != "public-key" {
        return Err(VerifyError::InputMalformed(format!(
            "credential type must be public-key, got {credential_type}"
        )));
    }

    let raw_id_bytes = base64url::decode(raw_id)?;
    if raw_id_bytes.is_empty() {
        return Err(VerifyError::InputMalformed(
            "credential rawId is empty".to_string(),
        ));
    }
    if base64url::decode(id)? != raw_id_bytes {
        return Err(VerifyError::InputMalformed(
            "credential id and rawId do not agree".to_string(),
        ));
    }

    Ok(raw_id_bytes)
}
