// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signature verification for WebAuthn ceremonies.
//!
//! This crate is the single choke point every attestation and assertion
//! signature check passes through. Dispatch happens on the COSE algorithm
//! identifier; an algorithm/curve combination outside the supported set is
//! rejected rather than best-effort checked.
//!
//! Two signature encodings exist in the wild:
//! - WebAuthn attestation/assertion signatures: ASN.1 DER ECDSA, PKCS#1 v1.5
//!   RSA, raw 64-byte Ed25519.
//! - JWS (SafetyNet, metadata BLOB): raw `r ‖ s` ECDSA, PKCS#1 v1.5 RSA.
//!
//! Both are exposed; callers pick the entry point matching their wire
//! format.

mod digest;
mod signature_verifier;

pub use digest::sha256;
pub use signature_verifier::{
    public_key_matches_certificate, verify_jws_signature, verify_signature,
    verify_signature_with_certificate,
};
