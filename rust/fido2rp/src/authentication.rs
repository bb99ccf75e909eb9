// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Authentication ceremony verification.

use fido2rp_abstractions::{parse_backup_flags, BackupFlags, VerifyError};
use fido2rp_common::{base64url, decode_cose_key, parse_authenticator_data};
use fido2rp_validation::{sha256, verify_signature};

use crate::ceremony::{validate_client_data, validate_credential_envelope};
use crate::options::AuthenticationOptions;
use crate::response::AuthenticationResponse;

/// The registered credential an assertion is verified against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub credential_id: Vec<u8>,
    /// Raw COSE key bytes, as returned by registration.
    pub credential_public_key: Vec<u8>,
    /// Sign counter observed on the previous ceremony.
    pub sign_count: u32,
}

/// The verified outcome of an authentication ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAuthentication {
    pub credential_id: Vec<u8>,
    /// The counter to persist for the next ceremony.
    pub new_sign_count: u32,
    pub user_verified: bool,
    pub backup: BackupFlags,
    pub origin: String,
}

impl VerifiedAuthentication {
    /// Credential ID in transport (base64url) form.
    pub fn credential_id_base64url(&self) -> String {
        base64url::encode(&self.credential_id)
    }
}

/// Verifies an authentication (assertion) response against a stored
/// credential.
pub fn verify_authentication_response(
    response: &AuthenticationResponse,
    options: &AuthenticationOptions,
    credential: &StoredCredential,
) -> Result<VerifiedAuthentication, VerifyError> {
    let raw_id = validate_credential_envelope(
        &response.credential_type,
        &response.id,
        &response.raw_id,
    )?;
    if raw_id != credential.credential_id {
        return Err(VerifyError::InputMalformed(
            "assertion rawId does not match the stored credential".to_string(),
        ));
    }

    let (client_data_bytes, client_data) = validate_client_data(
        &response.response.client_data_json,
        "webauthn.get",
        &options.expected_challenge,
        &options.expected_origins,
    )?;

    let auth_data_raw = base64url::decode(&response.response.authenticator_data)?;
    let auth_data = parse_authenticator_data(&auth_data_raw)?;

    let rp_id_matches = options
        .expected_rp_ids
        .iter()
        .any(|rp_id| auth_data.rp_id_hash == sha256(rp_id.as_bytes()));
    if !rp_id_matches {
        return Err(VerifyError::RpIdMismatch(
            "authenticator RP ID hash matches none of the expected RP IDs".to_string(),
        ));
    }

    if options.require_user_presence && !auth_data.flags.up() {
        return Err(VerifyError::UserPresenceRequired);
    }
    if options.require_user_verification && !auth_data.flags.uv() {
        return Err(VerifyError::UserVerificationRequired);
    }

    let backup = parse_backup_flags(auth_data.flags.be(), auth_data.flags.bs())?;

    // The assertion signature covers authData ‖ SHA-256(clientDataJSON).
    let mut signature_base = auth_data_raw.clone();
    signature_base.extend_from_slice(&sha256(&client_data_bytes));

    let public_key = decode_cose_key(&credential.credential_public_key)?;
    let signature = base64url::decode(&response.response.signature)?;
    verify_signature(&public_key, &signature_base, &signature)?;

    // Counter policy: authenticators that use the counter must advance it;
    // a regression signals a possible clone. Authenticators that never
    // increment report zero on both sides and skip the check.
    let new_sign_count = auth_data.sign_count;
    if new_sign_count > 0 || credential.sign_count > 0 {
        if new_sign_count <= credential.sign_count {
            return Err(VerifyError::CounterRegression {
                stored: credential.sign_count,
                received: new_sign_count,
            });
        }
    }

    tracing::debug!(
        counter = new_sign_count,
        user_verified = auth_data.flags.uv(),
        "assertion verified"
    );

    Ok(VerifiedAuthentication {
        credential_id: raw_id,
        new_sign_count,
        user_verified: auth_data.flags.uv(),
        backup,
        origin: client_data.origin,
    })
}
