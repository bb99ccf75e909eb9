// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! WebAuthn relying-party verification.
//!
//! This crate is the primary entry point for verifying WebAuthn ceremony
//! responses:
//! - [`verify_registration_response`] checks an attestation response and
//!   establishes the credential's provenance chain.
//! - [`verify_authentication_response`] checks an assertion against a
//!   stored credential, including sign-counter clone detection.
//!
//! Both calls are pure functions over their inputs plus a read-only
//! root-certificate lookup; concurrent verifications never share mutable
//! state. Configure a [`RootCertificateStore`] once, then pass it into
//! every call.

mod authentication;
mod ceremony;
mod options;
mod registration;
mod response;
mod settings;

pub use authentication::{verify_authentication_response, StoredCredential, VerifiedAuthentication};
pub use options::{AuthenticationOptions, ExpectedChallenge, RegistrationOptions};
pub use registration::{verify_registration_response, VerifiedRegistration};
pub use response::{
    AuthenticationResponse, AuthenticatorAssertionResponse, AuthenticatorAttestationResponse,
    RegistrationResponse,
};
pub use settings::{RootCertificate, RootCertificateStore};

// Re-export the pieces callers routinely need alongside the orchestrators.
pub use fido2rp_abstractions::{
    Aaguid, AttestationFormat, AttestationStatement, BackupFlags, CoseAlgorithm, CoseKey,
    CredentialDeviceType, NoRootCertificates, RootCertificateIdentifier, RootCertificateSource,
    VerifyError,
};
pub use fido2rp_common::{
    base64url, decode_attestation_object, parse_authenticator_data, AttestationObject,
    AuthenticatorData, CollectedClientData,
};
pub use fido2rp_validation::sha256;
