// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `tpm` attestation (WebAuthn §8.3).
//!
//! The statement carries two raw TPM 2.0 structures:
//! - `pubArea` (TPMT_PUBLIC): the key the TPM claims to have created; its
//!   unique field must match the credential public key.
//! - `certInfo` (TPMS_ATTEST): the attestation blob the AIK signed; its
//!   magic/type markers, `extraData` hash and `attested.name` hash all have
//!   to line up before the AIK signature or chain mean anything.
//!
//! Both structures use big-endian fixed-width fields with TPM2B
//! (length-prefixed) sub-buffers.

use sha2::{Digest as _, Sha384, Sha512};
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::X509Version;

use fido2rp_abstractions::{
    AttestationFormat, CoseAlgorithm, CoseEllipticCurve, CoseKey, VerifyError,
};
use fido2rp_validation::{sha256, verify_signature_with_certificate};
use fido2rp_x509::validate_certificate_path;

use crate::cert_ext::{parse_certificate, verify_aaguid_extension_matches};
use crate::{AttestationContext, VerifiedAttestation};

const TPM_GENERATED_VALUE: u32 = 0xff54_4347;
const TPM_ST_ATTEST_CERTIFY: u16 = 0x8017;

const TPM_ALG_RSA: u16 = 0x0001;
const TPM_ALG_NULL: u16 = 0x0010;
const TPM_ALG_ECC: u16 = 0x0023;

const TPM_ALG_SHA256: u16 = 0x000b;
const TPM_ALG_SHA384: u16 = 0x000c;
const TPM_ALG_SHA512: u16 = 0x000d;

const TPM_ECC_NIST_P256: u16 = 0x0003;
const TPM_ECC_NIST_P384: u16 = 0x0004;
const TPM_ECC_NIST_P521: u16 = 0x0005;

/// OID for TCG-KP-AIKCertificate, required in the AIK's extended key usage.
const OID_TCG_KP_AIK_CERTIFICATE: &str = "2.23.133.8.3";

pub(crate) fn verify(
    ver: &str,
    alg: CoseAlgorithm,
    sig: &[u8],
    x5c: &[Vec<u8>],
    cert_info: &[u8],
    pub_area: &[u8],
    ctx: &AttestationContext<'_>,
) -> Result<VerifiedAttestation, VerifyError> {
    if ver != "2.0" {
        return Err(VerifyError::UnsupportedFormat(format!(
            "tpm version {ver}"
        )));
    }

    let public_area = parse_pub_area(pub_area)?;
    let attest = parse_cert_info(cert_info)?;

    // The TPM-created key must be the credential key.
    let credential = ctx.attested_credential()?;
    check_key_match(&public_area, &credential.credential_public_key)?;

    if attest.magic != TPM_GENERATED_VALUE {
        return Err(VerifyError::InputMalformed(format!(
            "certInfo magic {:#010x} is not TPM_GENERATED_VALUE",
            attest.magic
        )));
    }
    if attest.attest_type != TPM_ST_ATTEST_CERTIFY {
        return Err(VerifyError::InputMalformed(format!(
            "certInfo type {:#06x} is not TPM_ST_ATTEST_CERTIFY",
            attest.attest_type
        )));
    }

    // extraData must be the hash of attToBeSigned under the statement alg.
    let att_to_be_signed = ctx.signature_base();
    let expected_extra_data = digest_for_alg(alg, &att_to_be_signed)?;
    if attest.extra_data != expected_extra_data {
        return Err(VerifyError::SignatureInvalid(
            "certInfo extraData does not match the ceremony hash".to_string(),
        ));
    }

    // attested.name must be pubArea hashed under its own nameAlg.
    if attest.name_alg != public_area.name_alg {
        return Err(VerifyError::InputMalformed(
            "certInfo name algorithm does not match pubArea nameAlg".to_string(),
        ));
    }
    let expected_name = digest_for_tpm_alg(public_area.name_alg, pub_area)?;
    if attest.name_digest != expected_name {
        return Err(VerifyError::SignatureInvalid(
            "certInfo attested name does not match pubArea".to_string(),
        ));
    }

    // The AIK certificate signs certInfo itself.
    let aik_der = &x5c[0];
    verify_signature_with_certificate(alg, aik_der, cert_info, sig)?;
    check_aik_certificate(aik_der)?;
    verify_aaguid_extension_matches(aik_der, &credential.aaguid)?;

    let roots = ctx.roots_for(AttestationFormat::Tpm);
    if roots.is_empty() {
        tracing::debug!("no tpm roots pinned; skipping certificate path validation");
    } else {
        validate_certificate_path(x5c, &roots)?;
    }

    Ok(VerifiedAttestation::with_trust_path(x5c.to_vec()))
}

/// Big-endian cursor over a TPM structure.
struct TpmReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> TpmReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], VerifyError> {
        if self.bytes.len() - self.pos < n {
            return Err(VerifyError::InputMalformed(format!(
                "TPM structure truncated reading {what}"
            )));
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u16(&mut self, what: &str) -> Result<u16, VerifyError> {
        let b = self.take(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &str) -> Result<u32, VerifyError> {
        let b = self.take(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// TPM2B: a 2-byte length prefix followed by that many bytes.
    fn tpm2b(&mut self, what: &str) -> Result<&'a [u8], VerifyError> {
        let len = self.u16(what)? as usize;
        self.take(len, what)
    }

    fn finished(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

#[derive(Debug)]
enum TpmUnique {
    Rsa { modulus: Vec<u8>, exponent: u32 },
    Ecc { curve_id: u16, x: Vec<u8>, y: Vec<u8> },
}

#[derive(Debug)]
struct TpmPublicArea {
    name_alg: u16,
    unique: TpmUnique,
}

/// Parses TPMT_PUBLIC.
fn parse_pub_area(bytes: &[u8]) -> Result<TpmPublicArea, VerifyError> {
    let mut r = TpmReader::new(bytes);

    let alg_type = r.u16("pubArea type")?;
    let name_alg = r.u16("pubArea nameAlg")?;
    let _object_attributes = r.u32("pubArea objectAttributes")?;
    let _auth_policy = r.tpm2b("pubArea authPolicy")?;

    let unique = match alg_type {
        TPM_ALG_RSA => {
            let symmetric = r.u16("RSA symmetric")?;
            if symmetric != TPM_ALG_NULL {
                return Err(VerifyError::UnsupportedAlgorithm(format!(
                    "TPM RSA symmetric algorithm {symmetric:#06x}"
                )));
            }
            let scheme = r.u16("RSA scheme")?;
            if scheme != TPM_ALG_NULL {
                // Schemes other than NULL carry a hash algorithm.
                let _scheme_hash = r.u16("RSA scheme hash")?;
            }
            let _key_bits = r.u16("RSA keyBits")?;
            let exponent = r.u32("RSA exponent")?;
            // Zero means the default RSA exponent.
            let exponent = if exponent == 0 { 65537 } else { exponent };
            let modulus = r.tpm2b("RSA modulus")?.to_vec();
            TpmUnique::Rsa { modulus, exponent }
        }
        TPM_ALG_ECC => {
            let symmetric = r.u16("ECC symmetric")?;
            if symmetric != TPM_ALG_NULL {
                return Err(VerifyError::UnsupportedAlgorithm(format!(
                    "TPM ECC symmetric algorithm {symmetric:#06x}"
                )));
            }
            let scheme = r.u16("ECC scheme")?;
            if scheme != TPM_ALG_NULL {
                let _scheme_hash = r.u16("ECC scheme hash")?;
            }
            let curve_id = r.u16("ECC curveID")?;
            let kdf = r.u16("ECC kdf")?;
            if kdf != TPM_ALG_NULL {
                let _kdf_hash = r.u16("ECC kdf hash")?;
            }
            let x = r.tpm2b("ECC x coordinate")?.to_vec();
            let y = r.tpm2b("ECC y coordinate")?.to_vec();
            TpmUnique::Ecc { curve_id, x, y }
        }
        other => {
            return Err(VerifyError::UnsupportedAlgorithm(format!(
                "TPM public key algorithm {other:#06x}"
            )))
        }
    };

    if !r.finished() {
        return Err(VerifyError::InputMalformed(
            "trailing bytes after TPMT_PUBLIC".to_string(),
        ));
    }

    Ok(TpmPublicArea { name_alg, unique })
}

struct TpmAttest {
    magic: u32,
    attest_type: u16,
    extra_data: Vec<u8>,
    name_alg: u16,
    name_digest: Vec<u8>,
}

/// Parses TPMS_ATTEST with a TPMS_CERTIFY_INFO body.
fn parse_cert_info(bytes: &[u8]) -> Result<TpmAttest, VerifyError> {
    let mut r = TpmReader::new(bytes);

    let magic = r.u32("certInfo magic")?;
    let attest_type = r.u16("certInfo type")?;
    let _qualified_signer = r.tpm2b("certInfo qualifiedSigner")?;
    let extra_data = r.tpm2b("certInfo extraData")?.to_vec();

    // TPMS_CLOCK_INFO: clock u64, resetCount u32, restartCount u32, safe u8.
    let _clock_info = r.take(17, "certInfo clockInfo")?;
    let _firmware_version = r.take(8, "certInfo firmwareVersion")?;

    // TPMS_CERTIFY_INFO: name and qualifiedName, both TPM2B_NAME. A name is
    // a 2-byte hash algorithm followed by the digest.
    let name = r.tpm2b("certInfo attested name")?;
    let _qualified_name = r.tpm2b("certInfo attested qualifiedName")?;

    if !r.finished() {
        return Err(VerifyError::InputMalformed(
            "trailing bytes after TPMS_ATTEST".to_string(),
        ));
    }

    if name.len() < 2 {
        return Err(VerifyError::InputMalformed(
            "certInfo attested name is too short".to_string(),
        ));
    }
    let name_alg = u16::from_be_bytes([name[0], name[1]]);
    let name_digest = name[2..].to_vec();

    Ok(TpmAttest {
        magic,
        attest_type,
        extra_data,
        name_alg,
        name_digest,
    })
}

/// The pubArea unique field must equal the credential public key.
fn check_key_match(public_area: &TpmPublicArea, key: &CoseKey) -> Result<(), VerifyError> {
    match (&public_area.unique, key) {
        (TpmUnique::Rsa { modulus, exponent }, CoseKey::Rsa { n, e, .. }) => {
            if modulus != n {
                return Err(VerifyError::SignatureInvalid(
                    "TPM pubArea modulus does not match credential key".to_string(),
                ));
            }
            let mut cose_exponent: u32 = 0;
            for byte in e {
                cose_exponent = (cose_exponent << 8) | u32::from(*byte);
            }
            if cose_exponent != *exponent {
                return Err(VerifyError::SignatureInvalid(
                    "TPM pubArea exponent does not match credential key".to_string(),
                ));
            }
            Ok(())
        }
        (TpmUnique::Ecc { curve_id, x, y }, CoseKey::Ec2 { crv, x: kx, y: ky, .. }) => {
            let expected_curve = match crv {
                CoseEllipticCurve::P256 => TPM_ECC_NIST_P256,
                CoseEllipticCurve::P384 => TPM_ECC_NIST_P384,
                CoseEllipticCurve::P521 => TPM_ECC_NIST_P521,
                CoseEllipticCurve::Ed25519 => {
                    return Err(VerifyError::UnsupportedAlgorithm(
                        "TPM attestation does not cover Ed25519 keys".to_string(),
                    ))
                }
            };
            if *curve_id != expected_curve {
                return Err(VerifyError::SignatureInvalid(
                    "TPM pubArea curve does not match credential key".to_string(),
                ));
            }
            if x != kx || y != ky {
                return Err(VerifyError::SignatureInvalid(
                    "TPM pubArea coordinates do not match credential key".to_string(),
                ));
            }
            Ok(())
        }
        _ => Err(VerifyError::SignatureInvalid(
            "TPM pubArea key type does not match credential key".to_string(),
        )),
    }
}

/// Hash of `data` under the statement's COSE algorithm.
fn digest_for_alg(alg: CoseAlgorithm, data: &[u8]) -> Result<Vec<u8>, VerifyError> {
    match alg {
        CoseAlgorithm::ES256 | CoseAlgorithm::RS256 => Ok(sha256(data).to_vec()),
        CoseAlgorithm::ES384 => Ok(Sha384::digest(data).to_vec()),
        CoseAlgorithm::ES512 => Ok(Sha512::digest(data).to_vec()),
        CoseAlgorithm::EdDsa => Err(VerifyError::UnsupportedAlgorithm(
            "tpm attestation with EdDSA".to_string(),
        )),
    }
}

/// Hash of `data` under a TPM hash algorithm identifier.
fn digest_for_tpm_alg(alg: u16, data: &[u8]) -> Result<Vec<u8>, VerifyError> {
    match alg {
        TPM_ALG_SHA256 => Ok(sha256(data).to_vec()),
        TPM_ALG_SHA384 => Ok(Sha384::digest(data).to_vec()),
        TPM_ALG_SHA512 => Ok(Sha512::digest(data).to_vec()),
        other => Err(VerifyError::UnsupportedAlgorithm(format!(
            "TPM name algorithm {other:#06x}"
        ))),
    }
}

/// AIK certificate requirements from WebAuthn §8.3.1.
fn check_aik_certificate(der: &[u8]) -> Result<(), VerifyError> {
    let cert = parse_certificate(der)?;

    if cert.version != X509Version(2) {
        return Err(VerifyError::ChainUntrusted(
            "AIK certificate must be X.509 version 3".to_string(),
        ));
    }

    if cert.subject().iter().next().is_some() {
        return Err(VerifyError::ChainUntrusted(
            "AIK certificate subject must be empty".to_string(),
        ));
    }

    let mut has_aik_eku = false;
    let mut has_san = false;
    for ext in cert.extensions() {
        match ext.parsed_extension() {
            ParsedExtension::ExtendedKeyUsage(eku) => {
                has_aik_eku = eku
                    .other
                    .iter()
                    .any(|oid| oid.to_id_string() == OID_TCG_KP_AIK_CERTIFICATE);
            }
            ParsedExtension::BasicConstraints(bc) => {
                if bc.ca {
                    return Err(VerifyError::ChainUntrusted(
                        "AIK certificate must not be a CA".to_string(),
                    ));
                }
            }
            ParsedExtension::SubjectAlternativeName(_) => {
                has_san = true;
            }
            _ => {}
        }
    }

    if !has_aik_eku {
        return Err(VerifyError::ChainUntrusted(
            "AIK certificate lacks the TCG-KP-AIKCertificate extended key usage".to_string(),
        ));
    }
    if !has_san {
        // The TCG directory-name SAN is informational for verification.
        tracing::debug!("AIK certificate has no subject alternative name");
    }

    Ok(())
}
