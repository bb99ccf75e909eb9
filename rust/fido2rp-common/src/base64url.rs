// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! base64url transport codec.
//!
//! Every binary field in a wire response (credential ID, authenticator data,
//! attestation object, signature, user handle) arrives as unpadded base64url
//! text and is decoded to raw bytes before entering the verification core.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use fido2rp_abstractions::VerifyError;

/// Encodes raw bytes as unpadded base64url text.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes unpadded base64url text to raw bytes.
///
/// Padding characters are tolerated on input since some clients emit them;
/// anything else outside the alphabet is `InputMalformed`.
pub fn decode(input: &str) -> Result<Vec<u8>, VerifyError> {
    let trimmed = input.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| VerifyError::malformed("base64url", e))
}

/// Decodes base64url text that must contain UTF-8 (JWT header/payload parts).
pub fn decode_to_utf8(input: &str) -> Result<String, VerifyError> {
    let bytes = decode(input)?;
    String::from_utf8(bytes).map_err(|e| VerifyError::malformed("base64url utf-8", e))
}
