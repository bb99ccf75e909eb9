// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared helpers for ceremony orchestration tests.
//!
//! Builds complete wire-format responses: client data JSON, authenticator
//! data, CBOR attestation objects, and base64url framing, signed with real
//! P-256 keys.

#![allow(dead_code)]

use p256::elliptic_curve::sec1::ToEncodedPoint as _;
use p256::pkcs8::DecodePrivateKey as _;
use sha2::{Digest as _, Sha256};

use fido2rp::base64url;
use fido2rp::{AuthenticationResponse, RegistrationResponse};

/// The fixtures the end-to-end scenario pins down.
pub(crate) const CHALLENGE_B64: &str = "h5xSyIRMx2IQPr1mQk6GD98XSQOBHgMHVpJIkMV9Nkc";
pub(crate) const ORIGIN: &str = "https://dev.dontneeda.pw";
pub(crate) const RP_ID: &str = "dev.dontneeda.pw";

pub(crate) const CREDENTIAL_ID: &[u8] = &[0x5a; 24];

pub(crate) struct TestKey {
    pub(crate) signing_key: p256::ecdsa::SigningKey,
}

impl TestKey {
    pub(crate) fn generate() -> Self {
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let signing_key =
            p256::ecdsa::SigningKey::from_pkcs8_der(&key_pair.serialize_der()).unwrap();
        Self { signing_key }
    }

    pub(crate) fn cose_key_bytes(&self) -> Vec<u8> {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let mut enc = minicbor::Encoder::new(Vec::new());
        enc.map(5).unwrap();
        enc.i64(1).unwrap().i64(2).unwrap();
        enc.i64(3).unwrap().i64(-7).unwrap();
        enc.i64(-1).unwrap().i64(1).unwrap();
        enc.i64(-2).unwrap().bytes(point.x().unwrap()).unwrap();
        enc.i64(-3).unwrap().bytes(point.y().unwrap()).unwrap();
        enc.into_writer()
    }

    pub(crate) fn sign_der(&self, message: &[u8]) -> Vec<u8> {
        use signature::Signer as _;
        let sig: p256::ecdsa::Signature = self.signing_key.sign(message);
        sig.to_der().as_bytes().to_vec()
    }
}

pub(crate) fn client_data_json(ceremony_type: &str, challenge_b64: &str, origin: &str) -> Vec<u8> {
    serde_json::json!({
        "type": ceremony_type,
        "challenge": challenge_b64,
        "origin": origin,
        "crossOrigin": false,
    })
    .to_string()
    .into_bytes()
}

/// Authenticator data with the given flags byte and counter. Attested
/// credential data is appended when provided.
pub(crate) fn auth_data(
    rp_id: &str,
    flags: u8,
    sign_count: u32,
    attested: Option<(&[u8; 16], &[u8], &[u8])>,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&Sha256::digest(rp_id.as_bytes()));
    out.push(flags);
    out.extend_from_slice(&sign_count.to_be_bytes());
    if let Some((aaguid, credential_id, cose_key)) = attested {
        out.extend_from_slice(aaguid);
        out.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
        out.extend_from_slice(credential_id);
        out.extend_from_slice(cose_key);
    }
    out
}

pub(crate) fn attestation_object(
    fmt: &str,
    auth_data: &[u8],
    statement: impl FnOnce(&mut minicbor::Encoder<Vec<u8>>),
) -> Vec<u8> {
    let mut enc = minicbor::Encoder::new(Vec::new());
    enc.map(3).unwrap();
    enc.str("fmt").unwrap().str(fmt).unwrap();
    enc.str("attStmt").unwrap();
    statement(&mut enc);
    enc.str("authData").unwrap().bytes(auth_data).unwrap();
    enc.into_writer()
}

/// A complete `packed` self-attestation registration response.
pub(crate) fn packed_registration_response(
    key: &TestKey,
    challenge_b64: &str,
    origin: &str,
    rp_id: &str,
) -> RegistrationResponse {
    let client_data = client_data_json("webauthn.create", challenge_b64, origin);
    let auth = auth_data(
        rp_id,
        0x45, // UP | UV | AT
        0,
        Some((&[0u8; 16], CREDENTIAL_ID, &key.cose_key_bytes())),
    );

    let mut signature_base = auth.clone();
    signature_base.extend_from_slice(&Sha256::digest(&client_data));
    let sig = key.sign_der(&signature_base);

    let att_obj = attestation_object("packed", &auth, |enc| {
        enc.map(2).unwrap();
        enc.str("alg").unwrap().i64(-7).unwrap();
        enc.str("sig").unwrap().bytes(&sig).unwrap();
    });

    wire_registration_response(&client_data, &att_obj)
}

/// A registration response with attestation format `none`.
pub(crate) fn none_registration_response(key: &TestKey, flags: u8) -> RegistrationResponse {
    let client_data = client_data_json("webauthn.create", CHALLENGE_B64, ORIGIN);
    let auth = auth_data(
        RP_ID,
        flags,
        0,
        Some((&[0u8; 16], CREDENTIAL_ID, &key.cose_key_bytes())),
    );
    let att_obj = attestation_object("none", &auth, |enc| {
        enc.map(0).unwrap();
    });
    wire_registration_response(&client_data, &att_obj)
}

pub(crate) fn wire_registration_response(
    client_data: &[u8],
    attestation_object: &[u8],
) -> RegistrationResponse {
    let id = base64url::encode(CREDENTIAL_ID);
    RegistrationResponse::from_json(
        &serde_json::json!({
            "id": id,
            "rawId": id,
            "type": "public-key",
            "response": {
                "clientDataJSON": base64url::encode(client_data),
                "attestationObject": base64url::encode(attestation_object),
            },
        })
        .to_string(),
    )
    .unwrap()
}

/// A complete assertion response signed with `key`.
pub(crate) fn assertion_response(
    key: &TestKey,
    challenge_b64: &str,
    origin: &str,
    rp_id: &str,
    flags: u8,
    sign_count: u32,
) -> AuthenticationResponse {
    let client_data = client_data_json("webauthn.get", challenge_b64, origin);
    let auth = auth_data(rp_id, flags, sign_count, None);

    let mut signature_base = auth.clone();
    signature_base.extend_from_slice(&Sha256::digest(&client_data));
    let sig = key.sign_der(&signature_base);

    wire_assertion_response(&client_data, &auth, &sig)
}

pub(crate) fn wire_assertion_response(
    client_data: &[u8],
    auth_data: &[u8],
    signature: &[u8],
) -> AuthenticationResponse {
    let id = base64url::encode(CREDENTIAL_ID);
    AuthenticationResponse::from_json(
        &serde_json::json!({
            "id": id,
            "rawId": id,
            "type": "public-key",
            "response": {
                "clientDataJSON": base64url::encode(client_data),
                "authenticatorData": base64url::encode(auth_data),
                "signature": base64url::encode(signature),
            },
        })
        .to_string(),
    )
    .unwrap()
}
