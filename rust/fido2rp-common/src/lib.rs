// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Binary codec layer for WebAuthn ceremony responses.
//!
//! Decoders for the nested encodings a relying party has to unwrap before it
//! can make any trust decision:
//! - base64url transport fields
//! - the CBOR attestation object and its per-format statement
//! - the authenticator data byte structure
//! - COSE credential public keys
//! - the client data JSON document
//!
//! Everything here is strict: indefinite-length CBOR items, duplicate map
//! keys, truncated buffers and trailing bytes are decode errors, never
//! ignored. No trust logic lives in this crate.

pub mod attestation_object;
pub mod authenticator_data;
pub mod base64url;
pub mod cbor;
pub mod client_data;
pub mod cose_key;

pub use attestation_object::{decode_attestation_object, AttestationObject};
pub use authenticator_data::{
    parse_authenticator_data, AttestedCredentialData, AuthenticatorData, AuthenticatorDataFlags,
};
pub use cbor::CborValue;
pub use client_data::{parse_client_data_json, CollectedClientData, TokenBinding};
pub use cose_key::decode_cose_key;
