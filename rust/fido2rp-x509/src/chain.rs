// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Certificate-path validation.
//!
//! Input is a leaf-first DER chain plus the PEM roots pinned for the
//! current attestation format. Every link must verify against the next
//! certificate's key; the last certificate must either be byte-identical to
//! a pinned root or carry a signature one of the pinned roots validates.
//! Every certificate in the path, roots included, must be inside its
//! validity window at verification time; there is no clock-skew allowance.

use rsa::pkcs1v15;
use rsa::pkcs8::DecodePublicKey as _;
use rsa::RsaPublicKey;
use sha2::{Sha256, Sha384, Sha512};
use signature::Verifier as _;
use p256::elliptic_curve::sec1::ToEncodedPoint as _;
use x509_parser::time::ASN1Time;

use fido2rp_abstractions::VerifyError;

use crate::pem::pem_to_der;

/// Upper bound on chain length; anything longer is hostile or broken.
const MAX_PATH_LEN: usize = 16;

#[derive(Debug, Clone)]
struct ParsedCert {
    der: Vec<u8>,
    subject_dn: String,
    issuer_dn: String,
    spki_der: Vec<u8>,
    spki_key_bytes: Vec<u8>,
    tbs_der: Vec<u8>,
    signature_oid: String,
    signature: Vec<u8>,
    not_before: ASN1Time,
    not_after: ASN1Time,
}

fn parse_cert_der(der: &[u8]) -> Result<ParsedCert, VerifyError> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| VerifyError::malformed("certificate DER", e))?;

    Ok(ParsedCert {
        der: der.to_vec(),
        subject_dn: cert.tbs_certificate.subject.to_string(),
        issuer_dn: cert.tbs_certificate.issuer.to_string(),
        spki_der: cert.tbs_certificate.subject_pki.raw.to_vec(),
        spki_key_bytes: cert
            .tbs_certificate
            .subject_pki
            .subject_public_key
            .data
            .to_vec(),
        tbs_der: cert.tbs_certificate.as_ref().to_vec(),
        signature_oid: cert.signature_algorithm.algorithm.to_string(),
        signature: cert.signature_value.data.to_vec(),
        not_before: cert.validity().not_before,
        not_after: cert.validity().not_after,
    })
}

/// Validates a leaf-first certificate path against pinned roots.
///
/// `roots_pem` empty means no pinned trust exists for the calling format,
/// which is always a failure here; formats that allow self-attestation
/// never reach the chain validator.
pub fn validate_certificate_path(
    x5c_der: &[Vec<u8>],
    roots_pem: &[String],
) -> Result<(), VerifyError> {
    if x5c_der.is_empty() {
        return Err(VerifyError::InputMalformed(
            "empty certificate path".to_string(),
        ));
    }
    if x5c_der.len() > MAX_PATH_LEN {
        return Err(VerifyError::ChainUntrusted(format!(
            "certificate path too long: {} certificates",
            x5c_der.len()
        )));
    }
    if roots_pem.is_empty() {
        return Err(VerifyError::ChainUntrusted(
            "no trusted roots registered for this attestation format".to_string(),
        ));
    }

    let chain = x5c_der
        .iter()
        .map(|der| parse_cert_der(der))
        .collect::<Result<Vec<_>, _>>()?;

    let mut roots = Vec::with_capacity(roots_pem.len());
    for pem in roots_pem {
        let der = pem_to_der(pem)
            .map_err(|e| VerifyError::ChainUntrusted(format!("bad trusted root: {e}")))?;
        let parsed = parse_cert_der(&der)
            .map_err(|e| VerifyError::ChainUntrusted(format!("bad trusted root: {e}")))?;
        roots.push(parsed);
    }

    let now = ASN1Time::now();
    for cert in &chain {
        check_validity_window(cert, now)?;
    }

    // Verify every link: each certificate signed by the key of the next.
    for pair in chain.windows(2) {
        let (current, issuer) = (&pair[0], &pair[1]);
        if current.issuer_dn != issuer.subject_dn {
            return Err(VerifyError::ChainUntrusted(format!(
                "issuer '{}' does not match next subject '{}'",
                current.issuer_dn, issuer.subject_dn
            )));
        }
        verify_cert_signature(issuer, current).map_err(|e| {
            VerifyError::ChainUntrusted(format!(
                "certificate signature verification failed for '{}': {e}",
                current.subject_dn
            ))
        })?;
    }

    // Chain is non-empty; checked above.
    let last = &chain[chain.len() - 1];

    // The top of the chain may itself be a pinned root (exact DER match).
    if roots.iter().any(|r| r.der == last.der) {
        return Ok(());
    }

    // Otherwise one of the pinned roots must validate the top signature and
    // be inside its own validity window.
    for root in &roots {
        if root.subject_dn != last.issuer_dn {
            continue;
        }
        if check_validity_window(root, now).is_err() {
            continue;
        }
        if verify_cert_signature(root, last).is_ok() {
            return Ok(());
        }
    }

    Err(VerifyError::ChainUntrusted(
        "certificate path does not terminate at a trusted root".to_string(),
    ))
}

fn check_validity_window(cert: &ParsedCert, now: ASN1Time) -> Result<(), VerifyError> {
    if now < cert.not_before {
        return Err(VerifyError::ChainUntrusted(format!(
            "certificate '{}' is not yet valid",
            cert.subject_dn
        )));
    }
    if now > cert.not_after {
        return Err(VerifyError::ChainUntrusted(format!(
            "certificate '{}' has expired",
            cert.subject_dn
        )));
    }
    Ok(())
}

/// Verifies `current`'s signature using `issuer`'s public key, dispatching
/// on the certificate signature algorithm OID.
fn verify_cert_signature(issuer: &ParsedCert, current: &ParsedCert) -> Result<(), String> {
    match current.signature_oid.as_str() {
        // sha256/sha384/sha512WithRSAEncryption
        "1.2.840.113549.1.1.11" => {
            let key = rsa_public_key_from_spki(&issuer.spki_der)?;
            let vk = pkcs1v15::VerifyingKey::<Sha256>::new(key);
            let sig = pkcs1v15::Signature::try_from(current.signature.as_slice())
                .map_err(|e| format!("bad RSA signature bytes: {e}"))?;
            vk.verify(&current.tbs_der, &sig)
                .map_err(|_| "signature mismatch".to_string())
        }
        "1.2.840.113549.1.1.12" => {
            let key = rsa_public_key_from_spki(&issuer.spki_der)?;
            let vk = pkcs1v15::VerifyingKey::<Sha384>::new(key);
            let sig = pkcs1v15::Signature::try_from(current.signature.as_slice())
                .map_err(|e| format!("bad RSA signature bytes: {e}"))?;
            vk.verify(&current.tbs_der, &sig)
                .map_err(|_| "signature mismatch".to_string())
        }
        "1.2.840.113549.1.1.13" => {
            let key = rsa_public_key_from_spki(&issuer.spki_der)?;
            let vk = pkcs1v15::VerifyingKey::<Sha512>::new(key);
            let sig = pkcs1v15::Signature::try_from(current.signature.as_slice())
                .map_err(|e| format!("bad RSA signature bytes: {e}"))?;
            vk.verify(&current.tbs_der, &sig)
                .map_err(|_| "signature mismatch".to_string())
        }

        // ecdsa-with-SHA256 / SHA384 / SHA512
        "1.2.840.10045.4.3.2" => {
            let pk = p256::PublicKey::from_public_key_der(&issuer.spki_der)
                .map_err(|e| format!("bad P-256 issuer public key: {e}"))?;
            let ep = pk.to_encoded_point(false);
            let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                .map_err(|e| format!("bad P-256 issuer public key: {e}"))?;
            let sig = p256::ecdsa::Signature::from_der(&current.signature)
                .map_err(|e| format!("bad ECDSA signature bytes: {e}"))?;
            vk.verify(&current.tbs_der, &sig)
                .map_err(|_| "signature mismatch".to_string())
        }
        "1.2.840.10045.4.3.3" => {
            let pk = p384::PublicKey::from_public_key_der(&issuer.spki_der)
                .map_err(|e| format!("bad P-384 issuer public key: {e}"))?;
            let ep = pk.to_encoded_point(false);
            let vk = p384::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                .map_err(|e| format!("bad P-384 issuer public key: {e}"))?;
            let sig = p384::ecdsa::Signature::from_der(&current.signature)
                .map_err(|e| format!("bad ECDSA signature bytes: {e}"))?;
            vk.verify(&current.tbs_der, &sig)
                .map_err(|_| "signature mismatch".to_string())
        }
        "1.2.840.10045.4.3.4" => {
            let pk = p521::PublicKey::from_public_key_der(&issuer.spki_der)
                .map_err(|e| format!("bad P-521 issuer public key: {e}"))?;
            let ep = pk.to_encoded_point(false);
            let vk = p521::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
                .map_err(|e| format!("bad P-521 issuer public key: {e}"))?;
            let sig = p521::ecdsa::Signature::from_der(&current.signature)
                .map_err(|e| format!("bad ECDSA signature bytes: {e}"))?;
            vk.verify(&current.tbs_der, &sig)
                .map_err(|_| "signature mismatch".to_string())
        }

        // id-Ed25519
        "1.3.101.112" => {
            let bytes: [u8; 32] = issuer
                .spki_key_bytes
                .as_slice()
                .try_into()
                .map_err(|_| "bad Ed25519 issuer public key".to_string())?;
            let vk = ed25519_dalek::VerifyingKey::from_bytes(&bytes)
                .map_err(|e| format!("bad Ed25519 issuer public key: {e}"))?;
            let sig = ed25519_dalek::Signature::from_slice(&current.signature)
                .map_err(|e| format!("bad Ed25519 signature bytes: {e}"))?;
            vk.verify(&current.tbs_der, &sig)
                .map_err(|_| "signature mismatch".to_string())
        }

        other => Err(format!(
            "unsupported certificate signature algorithm OID: {other}"
        )),
    }
}

fn rsa_public_key_from_spki(spki_der: &[u8]) -> Result<RsaPublicKey, String> {
    RsaPublicKey::from_public_key_der(spki_der).map_err(|e| format!("bad RSA public key: {e}"))
}
