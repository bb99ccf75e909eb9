// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for metadata BLOB parsing and verification.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use p256::pkcs8::DecodePrivateKey as _;
use signature::Signer as _;

use fido2rp_abstractions::{Aaguid, NoRootCertificates};
use fido2rp_mds::{parse_metadata_jwt, verify_metadata_jwt};

const TEST_AAGUID: &str = "adce0002-35bc-c60a-648b-0b25f1f05503";

fn signed_blob_jwt() -> String {
    let certified = rcgen::generate_simple_self_signed(["mds.example".to_string()]).unwrap();
    let cert_der = certified.cert.der().to_vec();
    let signing_key =
        p256::ecdsa::SigningKey::from_pkcs8_der(&certified.key_pair.serialize_der()).unwrap();

    let header = serde_json::json!({
        "alg": "ES256",
        "typ": "JWT",
        "x5c": [STANDARD.encode(&cert_der)],
    });
    let payload = serde_json::json!({
        "legalHeader": "for test use only",
        "no": 15,
        "nextUpdate": "2026-09-01",
        "entries": [
            {
                "aaguid": TEST_AAGUID,
                "timeOfLastStatusChange": "2025-02-11",
                "statusReports": [{"status": "FIDO_CERTIFIED_L1"}],
                "metadataStatement": {"description": "Test Authenticator"}
            }
        ],
    });

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    );
    let sig: p256::ecdsa::Signature = signing_key.sign(signing_input.as_bytes());
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(sig.to_bytes()))
}

#[test]
fn parses_header_payload_and_signature() {
    let jwt = signed_blob_jwt();
    let parsed = parse_metadata_jwt(&jwt).unwrap();
    assert_eq!(parsed.header.alg, "ES256");
    assert_eq!(parsed.payload.no, 15);
    assert_eq!(parsed.payload.next_update, "2026-09-01");
    assert_eq!(parsed.payload.entries.len(), 1);
    assert!(!parsed.signature.is_empty());
}

#[test]
fn verifies_a_signed_blob() {
    let jwt = signed_blob_jwt();
    let payload = verify_metadata_jwt(&jwt, &NoRootCertificates).unwrap();

    let aaguid = Aaguid([
        0xad, 0xce, 0x00, 0x02, 0x35, 0xbc, 0xc6, 0x0a, 0x64, 0x8b, 0x0b, 0x25, 0xf1, 0xf0,
        0x55, 0x03,
    ]);
    let entry = payload.entry_for_aaguid(&aaguid).unwrap();
    assert_eq!(entry.aaguid.as_deref(), Some(TEST_AAGUID));
    assert_eq!(entry.status_reports.len(), 1);
}

#[test]
fn rejects_a_tampered_signature() {
    let jwt = signed_blob_jwt();
    let mut chars: Vec<char> = jwt.chars().collect();
    let last = chars.len() - 1;
    chars[last] = if chars[last] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    let err = verify_metadata_jwt(&tampered, &NoRootCertificates).unwrap_err();
    assert!(matches!(
        err.code(),
        "SIGNATURE_INVALID" | "INPUT_MALFORMED"
    ));
}

#[test]
fn rejects_a_two_part_token() {
    let err = parse_metadata_jwt("header.payload").unwrap_err();
    assert_eq!(err.code(), "INPUT_MALFORMED");
}

#[test]
fn unknown_aaguid_has_no_entry() {
    let jwt = signed_blob_jwt();
    let payload = verify_metadata_jwt(&jwt, &NoRootCertificates).unwrap();
    assert!(payload.entry_for_aaguid(&Aaguid::ZERO).is_none());
}
