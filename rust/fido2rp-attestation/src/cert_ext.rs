// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Certificate-extension helpers shared by the format verifiers.

use der_parser::ber::BerObjectContent;
use der_parser::der::parse_der;
use x509_parser::prelude::X509Certificate;

use fido2rp_abstractions::{Aaguid, VerifyError};

/// OID of the FIDO `id-fido-gen-ce-aaguid` certificate extension.
pub(crate) const OID_FIDO_GEN_CE_AAGUID: &str = "1.3.6.1.4.1.45724.1.1.4";

/// Parses a DER certificate, mapping failures to `InputMalformed`.
pub(crate) fn parse_certificate(der: &[u8]) -> Result<X509Certificate<'_>, VerifyError> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| VerifyError::malformed("attestation certificate", e))?;
    Ok(cert)
}

/// Finds a certificate extension's raw value by dotted OID.
pub(crate) fn extension_value<'a>(
    cert: &'a X509Certificate<'_>,
    oid: &str,
) -> Option<&'a [u8]> {
    cert.extensions()
        .iter()
        .find(|ext| ext.oid.to_id_string() == oid)
        .map(|ext| ext.value)
}

/// If the leaf carries the FIDO AAGUID extension, its embedded value must
/// equal the authenticator data's AAGUID. Absence is fine; a mismatch or a
/// malformed extension is not.
pub(crate) fn verify_aaguid_extension_matches(
    leaf_der: &[u8],
    aaguid: &Aaguid,
) -> Result<(), VerifyError> {
    let cert = parse_certificate(leaf_der)?;
    let Some(value) = extension_value(&cert, OID_FIDO_GEN_CE_AAGUID) else {
        return Ok(());
    };

    // The extension wraps the 16 AAGUID bytes in an OCTET STRING.
    let (_, parsed) = parse_der(value)
        .map_err(|e| VerifyError::malformed("AAGUID certificate extension", e))?;
    let embedded = match &parsed.content {
        BerObjectContent::OctetString(bytes) if bytes.len() == 16 => *bytes,
        _ => {
            return Err(VerifyError::InputMalformed(
                "AAGUID certificate extension is not a 16-byte OCTET STRING".to_string(),
            ))
        }
    };

    if embedded != aaguid.0 {
        return Err(VerifyError::ChainUntrusted(
            "certificate AAGUID extension does not match authenticator data".to_string(),
        ));
    }
    Ok(())
}
