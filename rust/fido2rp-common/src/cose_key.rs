// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Key decoding into the normalized key model.
//!
//! COSE keys use small-integer map labels:
//! `1` kty, `3` alg, `-1` crv (EC2/OKP) or n (RSA), `-2` x (EC2/OKP) or
//! e (RSA), `-3` y (EC2). The decoder validates the curve/algorithm pairing
//! and coordinate widths; anything inconsistent or outside the supported
//! set fails closed as `UnsupportedAlgorithm`.

use minicbor::Decoder;

use fido2rp_abstractions::{CoseAlgorithm, CoseEllipticCurve, CoseKey, VerifyError};

use crate::cbor::{decode_value, CborValue};

const KTY_OKP: i64 = 1;
const KTY_EC2: i64 = 2;
const KTY_RSA: i64 = 3;

/// Decodes a COSE key starting at the decoder's current position.
///
/// The caller learns the encoded length from the decoder position advance;
/// authenticator data gives the key no explicit length prefix.
pub fn decode_cose_key_from_decoder(dec: &mut Decoder<'_>) -> Result<CoseKey, VerifyError> {
    let value = decode_value(dec)?;
    let entries = value
        .as_map()
        .ok_or_else(|| VerifyError::InputMalformed("COSE key is not a map".to_string()))?;

    let label = |l: i64| {
        entries.iter().find_map(|(k, v)| match k {
            CborValue::Int(i) if *i == l => Some(v),
            _ => None,
        })
    };

    let kty = label(1)
        .and_then(CborValue::as_int)
        .ok_or_else(|| VerifyError::InputMalformed("COSE key missing kty".to_string()))?;
    let alg = label(3)
        .and_then(CborValue::as_int)
        .ok_or_else(|| VerifyError::InputMalformed("COSE key missing alg".to_string()))?;
    let alg = CoseAlgorithm::from_i64(alg)?;

    match kty {
        KTY_EC2 => {
            let crv = label(-1)
                .and_then(CborValue::as_int)
                .ok_or_else(|| VerifyError::InputMalformed("EC2 key missing crv".to_string()))?;
            let crv = CoseEllipticCurve::from_i64(crv)?;
            let x = required_bytes(label(-2), "EC2 key x coordinate")?;
            let y = required_bytes(label(-3), "EC2 key y coordinate")?;

            let expected_len = match (alg, crv) {
                (CoseAlgorithm::ES256, CoseEllipticCurve::P256) => 32,
                (CoseAlgorithm::ES384, CoseEllipticCurve::P384) => 48,
                (CoseAlgorithm::ES512, CoseEllipticCurve::P521) => 66,
                (alg, crv) => {
                    return Err(VerifyError::UnsupportedAlgorithm(format!(
                        "EC2 pairing {alg:?}/{crv:?}"
                    )))
                }
            };
            if x.len() != expected_len || y.len() != expected_len {
                return Err(VerifyError::InputMalformed(format!(
                    "EC2 coordinate width {}/{} does not match curve",
                    x.len(),
                    y.len()
                )));
            }

            Ok(CoseKey::Ec2 { alg, crv, x, y })
        }
        KTY_RSA => {
            if alg != CoseAlgorithm::RS256 {
                return Err(VerifyError::UnsupportedAlgorithm(format!(
                    "RSA pairing {alg:?}"
                )));
            }
            let n = required_bytes(label(-1), "RSA key modulus")?;
            let e = required_bytes(label(-2), "RSA key exponent")?;
            Ok(CoseKey::Rsa { alg, n, e })
        }
        KTY_OKP => {
            if alg != CoseAlgorithm::EdDsa {
                return Err(VerifyError::UnsupportedAlgorithm(format!(
                    "OKP pairing {alg:?}"
                )));
            }
            let crv = label(-1)
                .and_then(CborValue::as_int)
                .ok_or_else(|| VerifyError::InputMalformed("OKP key missing crv".to_string()))?;
            let crv = CoseEllipticCurve::from_i64(crv)?;
            if crv != CoseEllipticCurve::Ed25519 {
                return Err(VerifyError::UnsupportedAlgorithm(format!(
                    "OKP pairing EdDSA/{crv:?}"
                )));
            }
            let x = required_bytes(label(-2), "OKP key x coordinate")?;
            if x.len() != 32 {
                return Err(VerifyError::InputMalformed(format!(
                    "Ed25519 key width {}",
                    x.len()
                )));
            }
            Ok(CoseKey::Okp { alg, crv, x })
        }
        other => Err(VerifyError::UnsupportedAlgorithm(format!("COSE kty {other}"))),
    }
}

/// Decodes a COSE key from a standalone byte buffer, rejecting trailing bytes.
pub fn decode_cose_key(bytes: &[u8]) -> Result<CoseKey, VerifyError> {
    let mut dec = Decoder::new(bytes);
    let key = decode_cose_key_from_decoder(&mut dec)?;
    if dec.position() != bytes.len() {
        return Err(VerifyError::InputMalformed(
            "trailing bytes after COSE key".to_string(),
        ));
    }
    Ok(key)
}

fn required_bytes(value: Option<&CborValue>, what: &str) -> Result<Vec<u8>, VerifyError> {
    value
        .and_then(CborValue::as_bytes)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| VerifyError::InputMalformed(format!("{what} missing or not a bstr")))
}
