// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `verify_registration_response`.

mod common;

use common::*;

use fido2rp::{
    verify_registration_response, AttestationFormat, CredentialDeviceType, NoRootCertificates,
    RegistrationOptions,
};

fn default_options() -> RegistrationOptions {
    RegistrationOptions::new(CHALLENGE_B64, ORIGIN, RP_ID)
}

#[test]
fn verifies_a_packed_registration_end_to_end() {
    let key = TestKey::generate();
    let response = packed_registration_response(&key, CHALLENGE_B64, ORIGIN, RP_ID);

    let verified =
        verify_registration_response(&response, &default_options(), &NoRootCertificates).unwrap();

    assert_eq!(verified.fmt, AttestationFormat::Packed);
    assert_eq!(verified.credential_id, CREDENTIAL_ID);
    assert_eq!(verified.credential_public_key, key.cose_key_bytes());
    assert_eq!(verified.sign_count, 0);
    assert!(verified.user_verified);
    assert!(verified.trust_path.is_empty());
    assert_eq!(verified.origin, ORIGIN);
    assert_eq!(verified.rp_id, RP_ID);
    assert_eq!(
        verified.backup.credential_device_type,
        CredentialDeviceType::SingleDevice
    );
    assert!(!verified.backup.credential_backed_up);
}

#[test]
fn none_attestation_verifies_with_empty_trust_path() {
    let key = TestKey::generate();
    let response = none_registration_response(&key, 0x45);

    let verified =
        verify_registration_response(&response, &default_options(), &NoRootCertificates).unwrap();
    assert_eq!(verified.fmt, AttestationFormat::None);
    assert!(verified.trust_path.is_empty());
    assert!(verified.aaguid.is_zero());
}

#[test]
fn unknown_attestation_format_fails_closed() {
    let key = TestKey::generate();
    let client_data = client_data_json("webauthn.create", CHALLENGE_B64, ORIGIN);
    let auth = auth_data(
        RP_ID,
        0x45,
        0,
        Some((&[0u8; 16], CREDENTIAL_ID, &key.cose_key_bytes())),
    );
    let att_obj = attestation_object("acme-custom", &auth, |enc| {
        enc.map(0).unwrap();
    });
    let response = wire_registration_response(&client_data, &att_obj);

    let err = verify_registration_response(&response, &default_options(), &NoRootCertificates)
        .unwrap_err();
    assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
}

#[test]
fn rejects_a_challenge_mismatch() {
    let key = TestKey::generate();
    // Signed over a different challenge than the RP expects.
    let response = packed_registration_response(
        &key,
        "c29tZS1vdGhlci1jaGFsbGVuZ2U",
        ORIGIN,
        RP_ID,
    );

    let err = verify_registration_response(&response, &default_options(), &NoRootCertificates)
        .unwrap_err();
    assert_eq!(err.code(), "CHALLENGE_MISMATCH");
}

#[test]
fn rejects_an_unexpected_origin() {
    let key = TestKey::generate();
    let response =
        packed_registration_response(&key, CHALLENGE_B64, "https://evil.example", RP_ID);

    let err = verify_registration_response(&response, &default_options(), &NoRootCertificates)
        .unwrap_err();
    assert_eq!(err.code(), "ORIGIN_MISMATCH");
}

#[test]
fn rejects_an_rp_id_hash_mismatch() {
    let key = TestKey::generate();
    let response = packed_registration_response(&key, CHALLENGE_B64, ORIGIN, "other-rp.example");

    let err = verify_registration_response(&response, &default_options(), &NoRootCertificates)
        .unwrap_err();
    assert_eq!(err.code(), "RP_ID_MISMATCH");
}

#[test]
fn rejects_the_wrong_ceremony_type() {
    let key = TestKey::generate();
    let client_data = client_data_json("webauthn.get", CHALLENGE_B64, ORIGIN);
    let auth = auth_data(
        RP_ID,
        0x45,
        0,
        Some((&[0u8; 16], CREDENTIAL_ID, &key.cose_key_bytes())),
    );
    let att_obj = attestation_object("none", &auth, |enc| {
        enc.map(0).unwrap();
    });
    let response = wire_registration_response(&client_data, &att_obj);

    let err = verify_registration_response(&response, &default_options(), &NoRootCertificates)
        .unwrap_err();
    assert_eq!(err.code(), "TYPE_MISMATCH");
}

#[test]
fn user_verification_policy_is_enforced() {
    let key = TestKey::generate();
    // UP and AT set, UV clear.
    let response = none_registration_response(&key, 0x41);

    let err = verify_registration_response(&response, &default_options(), &NoRootCertificates)
        .unwrap_err();
    assert_eq!(err.code(), "USER_VERIFICATION_REQUIRED");

    // The same response passes once the policy is relaxed.
    let options = default_options().without_user_verification();
    let verified =
        verify_registration_response(&response, &options, &NoRootCertificates).unwrap();
    assert!(!verified.user_verified);
}

#[test]
fn missing_user_presence_is_rejected() {
    let key = TestKey::generate();
    // AT only; UP clear.
    let response = none_registration_response(&key, 0x40);

    let err = verify_registration_response(&response, &default_options(), &NoRootCertificates)
        .unwrap_err();
    assert_eq!(err.code(), "USER_PRESENCE_REQUIRED");
}

#[test]
fn impossible_backup_flags_are_rejected_before_trust_decisions() {
    let key = TestKey::generate();
    // UP | UV | BS | AT with BE clear: backup state without eligibility.
    let response = none_registration_response(&key, 0x55);

    let err = verify_registration_response(&response, &default_options(), &NoRootCertificates)
        .unwrap_err();
    assert_eq!(err.code(), "BACKUP_FLAGS_IMPOSSIBLE");
}

#[test]
fn multi_device_backup_flags_are_reported() {
    let key = TestKey::generate();
    // UP | UV | BE | BS | AT.
    let response = none_registration_response(&key, 0x5d);

    let verified =
        verify_registration_response(&response, &default_options(), &NoRootCertificates).unwrap();
    assert_eq!(
        verified.backup.credential_device_type,
        CredentialDeviceType::MultiDevice
    );
    assert!(verified.backup.credential_backed_up);
}

#[test]
fn rejects_a_non_public_key_credential_type() {
    let key = TestKey::generate();
    let mut response = packed_registration_response(&key, CHALLENGE_B64, ORIGIN, RP_ID);
    response.credential_type = "password".to_string();

    let err = verify_registration_response(&response, &default_options(), &NoRootCertificates)
        .unwrap_err();
    assert_eq!(err.code(), "INPUT_MALFORMED");
}

#[test]
fn accepts_a_raw_byte_expected_challenge() {
    let key = TestKey::generate();
    let response = packed_registration_response(&key, CHALLENGE_B64, ORIGIN, RP_ID);

    let raw = fido2rp::base64url::decode(CHALLENGE_B64).unwrap();
    let options = RegistrationOptions::new(raw, ORIGIN, RP_ID);
    verify_registration_response(&response, &options, &NoRootCertificates).unwrap();
}
