// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Authenticator data parsing.
//!
//! Every authenticator response carries the same byte structure
//! (WebAuthn §6.1):
//!
//! ```text
//! rpIdHash[32] ‖ flags[1] ‖ signCount[4 BE]
//!   ‖ (AT) aaguid[16] ‖ credIdLen[2 BE] ‖ credId ‖ COSE key
//!   ‖ (ED) extensions CBOR map
//! ```
//!
//! The COSE key has no explicit length; its encoded size is discovered by
//! decoding it. Any flag/length mismatch is a parse failure. The parser has
//! no notion of an *expected* RP ID; the orchestrator checks `rpIdHash`.

use minicbor::Decoder;

use fido2rp_abstractions::{Aaguid, CoseKey, VerifyError};

use crate::cbor::{decode_value, CborValue};
use crate::cose_key::decode_cose_key_from_decoder;

/// Fixed prefix: rpIdHash[32] + flags[1] + signCount[4].
const FIXED_PREFIX_LEN: usize = 37;

/// The flags byte with named bit accessors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AuthenticatorDataFlags(pub u8);

impl AuthenticatorDataFlags {
    const UP: u8 = 1 << 0;
    const UV: u8 = 1 << 2;
    const BE: u8 = 1 << 3;
    const BS: u8 = 1 << 4;
    const AT: u8 = 1 << 6;
    const ED: u8 = 1 << 7;

    /// User present.
    pub fn up(&self) -> bool {
        self.0 & Self::UP != 0
    }

    /// User verified.
    pub fn uv(&self) -> bool {
        self.0 & Self::UV != 0
    }

    /// Backup eligible.
    pub fn be(&self) -> bool {
        self.0 & Self::BE != 0
    }

    /// Backup state.
    pub fn bs(&self) -> bool {
        self.0 & Self::BS != 0
    }

    /// Attested credential data present.
    pub fn at(&self) -> bool {
        self.0 & Self::AT != 0
    }

    /// Extension data present.
    pub fn ed(&self) -> bool {
        self.0 & Self::ED != 0
    }
}

/// Attested credential data, present only during registration.
#[derive(Debug, Clone, PartialEq)]
pub struct AttestedCredentialData {
    pub aaguid: Aaguid,
    pub credential_id: Vec<u8>,
    /// Decoded credential public key.
    pub credential_public_key: CoseKey,
    /// The key's raw CBOR bytes, as stored by relying parties and consumed
    /// by format verifiers that hash or re-encode the key.
    pub credential_public_key_bytes: Vec<u8>,
}

/// A fully parsed authenticator data structure. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: AuthenticatorDataFlags,
    pub sign_count: u32,
    pub attested_credential_data: Option<AttestedCredentialData>,
    pub extensions: Option<Vec<(CborValue, CborValue)>>,
}

/// Parses a raw authenticator data buffer.
pub fn parse_authenticator_data(bytes: &[u8]) -> Result<AuthenticatorData, VerifyError> {
    if bytes.len() < FIXED_PREFIX_LEN {
        return Err(VerifyError::InputMalformed(format!(
            "authenticator data too short: {} bytes",
            bytes.len()
        )));
    }

    let mut rp_id_hash = [0u8; 32];
    rp_id_hash.copy_from_slice(&bytes[..32]);
    let flags = AuthenticatorDataFlags(bytes[32]);
    let sign_count = u32::from_be_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]);

    let mut offset = FIXED_PREFIX_LEN;

    let attested_credential_data = if flags.at() {
        if bytes.len() < offset + 16 + 2 {
            return Err(VerifyError::InputMalformed(
                "AT flag set but attested credential data is truncated".to_string(),
            ));
        }

        let mut aaguid = [0u8; 16];
        aaguid.copy_from_slice(&bytes[offset..offset + 16]);
        offset += 16;

        let cred_id_len = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]) as usize;
        offset += 2;

        if bytes.len() < offset + cred_id_len {
            return Err(VerifyError::InputMalformed(
                "credential ID extends past end of authenticator data".to_string(),
            ));
        }
        let credential_id = bytes[offset..offset + cred_id_len].to_vec();
        offset += cred_id_len;

        // The COSE key's encoded length is only known after decoding it.
        let mut dec = Decoder::new(&bytes[offset..]);
        let credential_public_key = decode_cose_key_from_decoder(&mut dec)?;
        let key_len = dec.position();
        let credential_public_key_bytes = bytes[offset..offset + key_len].to_vec();
        offset += key_len;

        Some(AttestedCredentialData {
            aaguid: Aaguid(aaguid),
            credential_id,
            credential_public_key,
            credential_public_key_bytes,
        })
    } else {
        None
    };

    let extensions = if flags.ed() {
        let mut dec = Decoder::new(&bytes[offset..]);
        let value = decode_value(&mut dec)?;
        let entries = value.as_map().ok_or_else(|| {
            VerifyError::InputMalformed("extension data is not a CBOR map".to_string())
        })?;
        let consumed = dec.position();
        let entries = entries.to_vec();
        offset += consumed;
        Some(entries)
    } else {
        None
    };

    if offset != bytes.len() {
        return Err(VerifyError::InputMalformed(format!(
            "{} leftover bytes after authenticator data",
            bytes.len() - offset
        )));
    }

    Ok(AuthenticatorData {
        rp_id_hash,
        flags,
        sign_count,
        attested_credential_data,
        extensions,
    })
}
