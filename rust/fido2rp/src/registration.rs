// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Registration ceremony verification.

use fido2rp_abstractions::{
    parse_backup_flags, Aaguid, AttestationFormat, BackupFlags, RootCertificateSource, VerifyError,
};
use fido2rp_attestation::{verify_attestation_statement, AttestationContext};
use fido2rp_common::{base64url, decode_attestation_object, parse_authenticator_data};
use fido2rp_validation::sha256;

use crate::ceremony::{validate_client_data, validate_credential_envelope};
use crate::options::RegistrationOptions;
use crate::response::RegistrationResponse;

/// The verified outcome of a registration ceremony. Everything a relying
/// party needs to persist the credential and audit its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedRegistration {
    pub fmt: AttestationFormat,
    pub aaguid: Aaguid,
    pub credential_id: Vec<u8>,
    /// The credential public key, raw COSE bytes as stored by the RP.
    pub credential_public_key: Vec<u8>,
    pub sign_count: u32,
    pub user_verified: bool,
    pub backup: BackupFlags,
    /// DER certificates establishing provenance, leaf first; empty for
    /// `none` and self attestation.
    pub trust_path: Vec<Vec<u8>>,
    /// The full attestation object, for audit storage.
    pub attestation_object: Vec<u8>,
    pub origin: String,
    pub rp_id: String,
}

impl VerifiedRegistration {
    /// Credential ID in transport (base64url) form.
    pub fn credential_id_base64url(&self) -> String {
        base64url::encode(&self.credential_id)
    }

    /// Credential public key in transport (base64url) form.
    pub fn credential_public_key_base64url(&self) -> String {
        base64url::encode(&self.credential_public_key)
    }
}

/// Verifies a registration (attestation) response.
///
/// Either every check passes and a complete [`VerifiedRegistration`] is
/// returned, or the first failure is reported; no partial result is ever
/// produced.
pub fn verify_registration_response(
    response: &RegistrationResponse,
    options: &RegistrationOptions,
    roots: &dyn RootCertificateSource,
) -> Result<VerifiedRegistration, VerifyError> {
    let raw_id = validate_credential_envelope(
        &response.credential_type,
        &response.id,
        &response.raw_id,
    )?;

    let (client_data_bytes, client_data) = validate_client_data(
        &response.response.client_data_json,
        "webauthn.create",
        &options.expected_challenge,
        &options.expected_origins,
    )?;

    let attestation_object_bytes = base64url::decode(&response.response.attestation_object)?;
    let attestation_object = decode_attestation_object(&attestation_object_bytes)?;
    let auth_data = parse_authenticator_data(&attestation_object.auth_data)?;

    if auth_data.rp_id_hash != sha256(options.expected_rp_id.as_bytes()) {
        return Err(VerifyError::RpIdMismatch(format!(
            "authenticator RP ID hash does not match '{}'",
            options.expected_rp_id
        )));
    }

    if !auth_data.flags.up() {
        return Err(VerifyError::UserPresenceRequired);
    }
    if options.require_user_verification && !auth_data.flags.uv() {
        return Err(VerifyError::UserVerificationRequired);
    }

    // Backup semantics are derived before any trust decision.
    let backup = parse_backup_flags(auth_data.flags.be(), auth_data.flags.bs())?;

    let credential = auth_data.attested_credential_data.as_ref().ok_or_else(|| {
        VerifyError::InputMalformed(
            "registration response carries no attested credential data".to_string(),
        )
    })?;
    if credential.credential_id != raw_id {
        return Err(VerifyError::InputMalformed(
            "attested credential ID does not match rawId".to_string(),
        ));
    }

    let client_data_hash = sha256(&client_data_bytes);

    tracing::debug!(
        fmt = %attestation_object.fmt,
        aaguid = %credential.aaguid,
        "verifying attestation statement"
    );

    let attestation = verify_attestation_statement(
        &attestation_object.statement,
        &AttestationContext {
            auth_data_raw: &attestation_object.auth_data,
            auth_data: &auth_data,
            client_data_hash: &client_data_hash,
            roots,
        },
    )?;

    Ok(VerifiedRegistration {
        fmt: attestation_object.fmt,
        aaguid: credential.aaguid,
        credential_id: credential.credential_id.clone(),
        credential_public_key: credential.credential_public_key_bytes.clone(),
        sign_count: auth_data.sign_count,
        user_verified: auth_data.flags.uv(),
        backup,
        trust_path: attestation.trust_path,
        attestation_object: attestation_object_bytes,
        origin: client_data.origin,
        rp_id: options.expected_rp_id.clone(),
    })
}
