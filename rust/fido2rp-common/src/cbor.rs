// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Strict CBOR value-tree decoding.
//!
//! WebAuthn structures nest CBOR maps whose shape is only known after
//! reading a discriminator (the attestation `fmt`), so parts of the decode
//! happen against a generic value tree. The tree decoder is intentionally
//! conservative:
//! - definite lengths only; indefinite-length items are rejected
//! - duplicate map keys are rejected
//! - trailing bytes after a top-level item are rejected
//! - nesting depth is bounded

use minicbor::data::Type;
use minicbor::Decoder;

use fido2rp_abstractions::VerifyError;

/// Maximum nesting depth for decoded value trees.
const MAX_DEPTH: usize = 16;

/// A decoded CBOR data item.
#[derive(Debug, Clone, PartialEq)]
pub enum CborValue {
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
    Bool(bool),
    Null,
    Float(f64),
    Array(Vec<CborValue>),
    Map(Vec<(CborValue, CborValue)>),
}

impl CborValue {
    /// Looks up a text key in a decoded map.
    pub fn map_get<'a>(entries: &'a [(CborValue, CborValue)], key: &str) -> Option<&'a CborValue> {
        entries.iter().find_map(|(k, v)| match k {
            CborValue::Text(t) if t == key => Some(v),
            _ => None,
        })
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CborValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CborValue::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CborValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[CborValue]> {
        match self {
            CborValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(CborValue, CborValue)]> {
        match self {
            CborValue::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Decodes a complete CBOR item from `bytes`, rejecting trailing bytes.
pub fn decode_value_exact(bytes: &[u8]) -> Result<CborValue, VerifyError> {
    let mut dec = Decoder::new(bytes);
    let value = decode_value(&mut dec)?;
    if dec.position() != bytes.len() {
        return Err(VerifyError::InputMalformed(
            "trailing bytes after CBOR item".to_string(),
        ));
    }
    Ok(value)
}

/// Decodes one CBOR item from an in-progress decoder.
pub fn decode_value(dec: &mut Decoder<'_>) -> Result<CborValue, VerifyError> {
    decode_value_at_depth(dec, 0)
}

fn decode_value_at_depth(dec: &mut Decoder<'_>, depth: usize) -> Result<CborValue, VerifyError> {
    if depth > MAX_DEPTH {
        return Err(VerifyError::InputMalformed(
            "CBOR nesting too deep".to_string(),
        ));
    }

    let err = |e: minicbor::decode::Error| VerifyError::malformed("CBOR", e);

    match dec.datatype().map_err(err)? {
        Type::U8 | Type::U16 | Type::U32 | Type::U64 | Type::I8 | Type::I16 | Type::I32
        | Type::I64 | Type::Int => {
            let i = dec.i64().map_err(err)?;
            Ok(CborValue::Int(i))
        }
        Type::Bytes => {
            let b = dec.bytes().map_err(err)?;
            Ok(CborValue::Bytes(b.to_vec()))
        }
        Type::String => {
            let s = dec.str().map_err(err)?;
            Ok(CborValue::Text(s.to_string()))
        }
        Type::Bool => {
            let b = dec.bool().map_err(err)?;
            Ok(CborValue::Bool(b))
        }
        Type::Null => {
            dec.null().map_err(err)?;
            Ok(CborValue::Null)
        }
        Type::F16 | Type::F32 | Type::F64 => {
            let f = dec.f64().map_err(err)?;
            Ok(CborValue::Float(f))
        }
        Type::Array => {
            let len = dec.array().map_err(err)?.ok_or_else(|| {
                VerifyError::InputMalformed("indefinite-length arrays are not supported".to_string())
            })?;
            let mut items = Vec::new();
            for _ in 0..len {
                items.push(decode_value_at_depth(dec, depth + 1)?);
            }
            Ok(CborValue::Array(items))
        }
        Type::Map => {
            let len = dec.map().map_err(err)?.ok_or_else(|| {
                VerifyError::InputMalformed("indefinite-length maps are not supported".to_string())
            })?;
            let mut entries: Vec<(CborValue, CborValue)> = Vec::new();
            for _ in 0..len {
                let key = decode_value_at_depth(dec, depth + 1)?;
                let value = decode_value_at_depth(dec, depth + 1)?;
                if entries.iter().any(|(k, _)| *k == key) {
                    return Err(VerifyError::InputMalformed(
                        "duplicate CBOR map key".to_string(),
                    ));
                }
                entries.push((key, value));
            }
            Ok(CborValue::Map(entries))
        }
        other => Err(VerifyError::InputMalformed(format!(
            "unsupported CBOR type: {other:?}"
        ))),
    }
}
