// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! PEM/DER conversion for root certificates.
//!
//! Roots are registered and stored as PEM strings; chain validation works
//! on DER. Both directions live here so the store and the validator agree
//! on framing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use fido2rp_abstractions::VerifyError;

const PEM_HEADER: &str = "-----BEGIN CERTIFICATE-----";
const PEM_FOOTER: &str = "-----END CERTIFICATE-----";

/// Extracts the DER bytes from a PEM `CERTIFICATE` block.
pub fn pem_to_der(pem: &str) -> Result<Vec<u8>, VerifyError> {
    let (_, parsed) = x509_parser::pem::parse_x509_pem(pem.as_bytes())
        .map_err(|e| VerifyError::malformed("PEM certificate", e))?;
    if parsed.label != "CERTIFICATE" {
        return Err(VerifyError::InputMalformed(format!(
            "unexpected PEM label: {}",
            parsed.label
        )));
    }
    Ok(parsed.contents)
}

/// Wraps certificate DER bytes as a PEM block with 64-column base64 lines.
pub fn der_to_pem(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / 64 + 64);
    out.push_str(PEM_HEADER);
    out.push('\n');
    for chunk in encoded.as_bytes().chunks(64) {
        // chunks of an ASCII string are valid UTF-8
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        out.push('\n');
    }
    out.push_str(PEM_FOOTER);
    out.push('\n');
    out
}
