// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Attestation object decoding.
//!
//! The attestation object is a CBOR map with text keys `fmt`, `attStmt` and
//! `authData`. `attStmt`'s shape depends on `fmt`, so the statement is first
//! decoded into a generic value tree and then narrowed into the
//! format-tagged [`AttestationStatement`]. The statement variant therefore
//! always matches `fmt`; an unrecognized `fmt` is `UnsupportedFormat` here,
//! never a silent skip.

use minicbor::Decoder;

use fido2rp_abstractions::{AttestationFormat, AttestationStatement, CoseAlgorithm, VerifyError};

use crate::cbor::{decode_value, CborValue};

/// A decoded attestation object. `auth_data` stays raw; the caller parses
/// it separately because the same bytes are also the signature base.
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationObject {
    pub fmt: AttestationFormat,
    pub statement: AttestationStatement,
    pub auth_data: Vec<u8>,
}

/// Decodes a CBOR attestation object, rejecting trailing bytes.
pub fn decode_attestation_object(bytes: &[u8]) -> Result<AttestationObject, VerifyError> {
    let mut dec = Decoder::new(bytes);
    let err = |e: minicbor::decode::Error| VerifyError::malformed("attestation object", e);

    let len = dec.map().map_err(err)?.ok_or_else(|| {
        VerifyError::InputMalformed("indefinite-length maps are not supported".to_string())
    })?;

    let mut fmt: Option<String> = None;
    let mut att_stmt: Option<CborValue> = None;
    let mut auth_data: Option<Vec<u8>> = None;

    for _ in 0..len {
        let key = dec.str().map_err(err)?.to_string();
        match key.as_str() {
            "fmt" => {
                if fmt.is_some() {
                    return Err(VerifyError::InputMalformed("duplicate fmt key".to_string()));
                }
                fmt = Some(dec.str().map_err(err)?.to_string());
            }
            "attStmt" => {
                if att_stmt.is_some() {
                    return Err(VerifyError::InputMalformed(
                        "duplicate attStmt key".to_string(),
                    ));
                }
                att_stmt = Some(decode_value(&mut dec)?);
            }
            "authData" => {
                if auth_data.is_some() {
                    return Err(VerifyError::InputMalformed(
                        "duplicate authData key".to_string(),
                    ));
                }
                auth_data = Some(dec.bytes().map_err(err)?.to_vec());
            }
            other => {
                return Err(VerifyError::InputMalformed(format!(
                    "unexpected attestation object key: {other}"
                )));
            }
        }
    }

    if dec.position() != bytes.len() {
        return Err(VerifyError::InputMalformed(
            "trailing bytes after attestation object".to_string(),
        ));
    }

    let fmt_str =
        fmt.ok_or_else(|| VerifyError::InputMalformed("attestation object missing fmt".to_string()))?;
    let att_stmt = att_stmt
        .ok_or_else(|| VerifyError::InputMalformed("attestation object missing attStmt".to_string()))?;
    let auth_data = auth_data
        .ok_or_else(|| VerifyError::InputMalformed("attestation object missing authData".to_string()))?;

    let fmt = AttestationFormat::from_fmt(&fmt_str)?;
    let entries = att_stmt
        .as_map()
        .ok_or_else(|| VerifyError::InputMalformed("attStmt is not a map".to_string()))?;
    let statement = decode_attestation_statement(fmt, entries)?;

    Ok(AttestationObject {
        fmt,
        statement,
        auth_data,
    })
}

/// Narrows a generic `attStmt` map into the statement for `fmt`.
///
/// Required fields per format follow WebAuthn §8; fields this
/// implementation does not evaluate are ignored.
fn decode_attestation_statement(
    fmt: AttestationFormat,
    stmt: &[(CborValue, CborValue)],
) -> Result<AttestationStatement, VerifyError> {
    match fmt {
        AttestationFormat::None => {
            // `none` is defined as the empty map.
            if !stmt.is_empty() {
                return Err(VerifyError::InputMalformed(
                    "attStmt for none must be empty".to_string(),
                ));
            }
            Ok(AttestationStatement::None)
        }
        AttestationFormat::Packed => Ok(AttestationStatement::Packed {
            alg: required_alg(stmt)?,
            sig: required_bytes(stmt, "sig")?,
            x5c: optional_x5c(stmt)?,
        }),
        AttestationFormat::FidoU2f => Ok(AttestationStatement::FidoU2f {
            sig: required_bytes(stmt, "sig")?,
            x5c: required_x5c(stmt)?,
        }),
        AttestationFormat::AndroidKey => Ok(AttestationStatement::AndroidKey {
            alg: required_alg(stmt)?,
            sig: required_bytes(stmt, "sig")?,
            x5c: required_x5c(stmt)?,
        }),
        AttestationFormat::AndroidSafetyNet => Ok(AttestationStatement::AndroidSafetyNet {
            ver: required_text(stmt, "ver")?,
            response: required_bytes(stmt, "response")?,
        }),
        AttestationFormat::Apple => Ok(AttestationStatement::Apple {
            x5c: required_x5c(stmt)?,
        }),
        AttestationFormat::Tpm => Ok(AttestationStatement::Tpm {
            ver: required_text(stmt, "ver")?,
            alg: required_alg(stmt)?,
            sig: required_bytes(stmt, "sig")?,
            x5c: required_x5c(stmt)?,
            cert_info: required_bytes(stmt, "certInfo")?,
            pub_area: required_bytes(stmt, "pubArea")?,
        }),
    }
}

fn required_alg(stmt: &[(CborValue, CborValue)]) -> Result<CoseAlgorithm, VerifyError> {
    let alg = CborValue::map_get(stmt, "alg")
        .and_then(CborValue::as_int)
        .ok_or_else(|| VerifyError::InputMalformed("attStmt missing alg".to_string()))?;
    CoseAlgorithm::from_i64(alg)
}

fn required_bytes(stmt: &[(CborValue, CborValue)], key: &str) -> Result<Vec<u8>, VerifyError> {
    CborValue::map_get(stmt, key)
        .and_then(CborValue::as_bytes)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| VerifyError::InputMalformed(format!("attStmt missing {key}")))
}

fn required_text(stmt: &[(CborValue, CborValue)], key: &str) -> Result<String, VerifyError> {
    CborValue::map_get(stmt, key)
        .and_then(CborValue::as_text)
        .map(str::to_string)
        .ok_or_else(|| VerifyError::InputMalformed(format!("attStmt missing {key}")))
}

fn decode_x5c(value: &CborValue) -> Result<Vec<Vec<u8>>, VerifyError> {
    let items = value
        .as_array()
        .ok_or_else(|| VerifyError::InputMalformed("x5c is not an array".to_string()))?;
    if items.is_empty() {
        return Err(VerifyError::InputMalformed("x5c is empty".to_string()));
    }
    items
        .iter()
        .map(|item| {
            item.as_bytes()
                .map(<[u8]>::to_vec)
                .ok_or_else(|| VerifyError::InputMalformed("x5c entry is not a bstr".to_string()))
        })
        .collect()
}

fn required_x5c(stmt: &[(CborValue, CborValue)]) -> Result<Vec<Vec<u8>>, VerifyError> {
    let value = CborValue::map_get(stmt, "x5c")
        .ok_or_else(|| VerifyError::InputMalformed("attStmt missing x5c".to_string()))?;
    decode_x5c(value)
}

fn optional_x5c(stmt: &[(CborValue, CborValue)]) -> Result<Option<Vec<Vec<u8>>>, VerifyError> {
    match CborValue::map_get(stmt, "x5c") {
        Some(value) => Ok(Some(decode_x5c(value)?)),
        None => Ok(None),
    }
}
