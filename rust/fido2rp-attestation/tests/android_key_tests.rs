// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the `android-key` verifier.

mod common;

use common::*;

use fido2rp_abstractions::{AttestationStatement, CoseAlgorithm};
use fido2rp_attestation::{verify_attestation_statement, AttestationContext};
use fido2rp_common::parse_authenticator_data;

const OID_KEY_DESCRIPTION: &[u64] = &[1, 3, 6, 1, 4, 1, 11129, 2, 1, 17];

/// Context tag [600] (`allApplications`), high-tag-number form, wrapping a
/// DER NULL.
fn all_applications_entry() -> Vec<u8> {
    vec![0xbf, 0x84, 0x58, 0x02, 0x05, 0x00]
}

fn key_description(challenge: &[u8], tee_all_applications: bool) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&der_integer(200)); // attestationVersion
    content.extend_from_slice(&der_enumerated(1)); // TrustedEnvironment
    content.extend_from_slice(&der_integer(200)); // keyMintVersion
    content.extend_from_slice(&der_enumerated(1)); // TrustedEnvironment
    content.extend_from_slice(&der_octet_string(challenge));
    content.extend_from_slice(&der_octet_string(&[])); // uniqueId
    content.extend_from_slice(&der_sequence(&[])); // softwareEnforced
    let tee = if tee_all_applications {
        der_sequence(&all_applications_entry())
    } else {
        der_sequence(&[])
    };
    content.extend_from_slice(&tee);
    der_sequence(&content)
}

fn build_case(
    challenge: &[u8],
    tee_all_applications: bool,
) -> (AttestationStatement, Vec<u8>) {
    // The attestation certificate certifies the credential key.
    let credential_key = TestKey::generate();
    let auth_data = registration_auth_data(
        "dev.dontneeda.pw",
        [0x05; 16],
        &[3; 24],
        &credential_key.cose_key_bytes(),
    );

    let mut params = rcgen::CertificateParams::new(Vec::new()).unwrap();
    params.custom_extensions.push(rcgen::CustomExtension::from_oid_content(
        OID_KEY_DESCRIPTION,
        key_description(challenge, tee_all_applications),
    ));
    let cert = params.self_signed(&credential_key.key_pair).unwrap();

    let mut signed = auth_data.clone();
    signed.extend_from_slice(&client_data_hash());
    let sig = credential_key.sign_der(&signed);

    (
        AttestationStatement::AndroidKey {
            alg: CoseAlgorithm::ES256,
            sig,
            x5c: vec![cert.der().to_vec()],
        },
        auth_data,
    )
}

fn run(
    statement: &AttestationStatement,
    auth_data_raw: &[u8],
) -> Result<fido2rp_attestation::VerifiedAttestation, fido2rp_abstractions::VerifyError> {
    let parsed = parse_authenticator_data(auth_data_raw).unwrap();
    let hash = client_data_hash();
    let ctx = AttestationContext {
        auth_data_raw,
        auth_data: &parsed,
        client_data_hash: &hash,
        roots: &TestRoots::none(),
    };
    verify_attestation_statement(statement, &ctx)
}

#[test]
fn verifies_a_hardware_backed_key_attestation() {
    let (statement, auth_data) = build_case(&client_data_hash(), false);
    let verdict = run(&statement, &auth_data).unwrap();
    assert_eq!(verdict.trust_path.len(), 1);
}

#[test]
fn rejects_wrong_attestation_challenge() {
    let (statement, auth_data) = build_case(&[0x13; 32], false);
    let err = run(&statement, &auth_data).unwrap_err();
    assert_eq!(err.code(), "CHALLENGE_MISMATCH");
}

#[test]
fn rejects_keys_usable_by_all_applications() {
    let (statement, auth_data) = build_case(&client_data_hash(), true);
    let err = run(&statement, &auth_data).unwrap_err();
    assert_eq!(err.code(), "CHAIN_UNTRUSTED");
    assert!(err.to_string().contains("all applications"));
}

#[test]
fn rejects_certificate_without_key_description() {
    let credential_key = TestKey::generate();
    let auth_data = registration_auth_data(
        "dev.dontneeda.pw",
        [0x05; 16],
        &[3; 24],
        &credential_key.cose_key_bytes(),
    );

    let cert = rcgen::CertificateParams::new(Vec::new())
        .unwrap()
        .self_signed(&credential_key.key_pair)
        .unwrap();

    let mut signed = auth_data.clone();
    signed.extend_from_slice(&client_data_hash());
    let statement = AttestationStatement::AndroidKey {
        alg: CoseAlgorithm::ES256,
        sig: credential_key.sign_der(&signed),
        x5c: vec![cert.der().to_vec()],
    };

    let err = run(&statement, &auth_data).unwrap_err();
    assert_eq!(err.code(), "INPUT_MALFORMED");
    assert!(err.to_string().contains("KeyDescription"));
}

#[test]
fn rejects_certificate_for_a_different_key() {
    let credential_key = TestKey::generate();
    let auth_data = registration_auth_data(
        "dev.dontneeda.pw",
        [0x05; 16],
        &[3; 24],
        &credential_key.cose_key_bytes(),
    );

    // Certificate and signature belong to another key entirely.
    let other_key = TestKey::generate();
    let mut params = rcgen::CertificateParams::new(Vec::new()).unwrap();
    params.custom_extensions.push(rcgen::CustomExtension::from_oid_content(
        OID_KEY_DESCRIPTION,
        key_description(&client_data_hash(), false),
    ));
    let cert = params.self_signed(&other_key.key_pair).unwrap();

    let mut signed = auth_data.clone();
    signed.extend_from_slice(&client_data_hash());
    let statement = AttestationStatement::AndroidKey {
        alg: CoseAlgorithm::ES256,
        sig: other_key.sign_der(&signed),
        x5c: vec![cert.der().to_vec()],
    };

    let err = run(&statement, &auth_data).unwrap_err();
    assert_eq!(err.code(), "CHAIN_UNTRUSTED");
    assert!(err.to_string().contains("credential key"));
}
