// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! X.509 certificate-path validation for attestation trust.
//!
//! Attestation formats hand this crate a leaf-first DER chain plus the PEM
//! roots pinned for that format. The validator is format-agnostic: it knows
//! nothing about self-attestation (formats that allow it simply never call
//! the validator) and applies zero clock-skew tolerance to validity
//! windows.

mod chain;
mod pem;

pub use chain::validate_certificate_path;
pub use pem::{der_to_pem, pem_to_der};
