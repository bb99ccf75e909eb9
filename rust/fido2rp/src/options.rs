// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Ceremony verification options.

use fido2rp_abstractions::VerifyError;
use fido2rp_common::base64url;

/// The challenge the relying party issued for this ceremony.
///
/// Callers hold challenges either as raw bytes or as the base64url text
/// they sent to the client; both sides are normalized to raw bytes before
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedChallenge {
    Raw(Vec<u8>),
    Base64Url(String),
}

impl ExpectedChallenge {
    pub(crate) fn bytes(&self) -> Result<Vec<u8>, VerifyError> {
        match self {
            ExpectedChallenge::Raw(bytes) => Ok(bytes.clone()),
            ExpectedChallenge::Base64Url(text) => base64url::decode(text),
        }
    }
}

impl From<Vec<u8>> for ExpectedChallenge {
    fn from(bytes: Vec<u8>) -> Self {
        ExpectedChallenge::Raw(bytes)
    }
}

impl From<&[u8]> for ExpectedChallenge {
    fn from(bytes: &[u8]) -> Self {
        ExpectedChallenge::Raw(bytes.to_vec())
    }
}

impl From<&str> for ExpectedChallenge {
    fn from(text: &str) -> Self {
        ExpectedChallenge::Base64Url(text.to_string())
    }
}

/// Options for [`crate::verify_registration_response`].
#[derive(Debug, Clone)]
pub struct RegistrationOptions {
    pub expected_challenge: ExpectedChallenge,
    /// Origins the client is allowed to report.
    pub expected_origins: Vec<String>,
    /// The RP ID the credential is scoped to.
    pub expected_rp_id: String,
    /// Require the UV flag. On by default.
    pub require_user_verification: bool,
}

impl RegistrationOptions {
    pub fn new(
        expected_challenge: impl Into<ExpectedChallenge>,
        expected_origin: impl Into<String>,
        expected_rp_id: impl Into<String>,
    ) -> Self {
        Self {
            expected_challenge: expected_challenge.into(),
            expected_origins: vec![expected_origin.into()],
            expected_rp_id: expected_rp_id.into(),
            require_user_verification: true,
        }
    }

    pub fn without_user_verification(mut self) -> Self {
        self.require_user_verification = false;
        self
    }
}

/// Options for [`crate::verify_authentication_response`].
#[derive(Debug, Clone)]
pub struct AuthenticationOptions {
    pub expected_challenge: ExpectedChallenge,
    pub expected_origins: Vec<String>,
    /// RP IDs whose hash the assertion may carry.
    pub expected_rp_ids: Vec<String>,
    /// Require the UV flag. On by default.
    pub require_user_verification: bool,
    /// Require the UP flag. On by default; conditional-UI flows may relax
    /// this.
    pub require_user_presence: bool,
}

impl AuthenticationOptions {
    pub fn new(
        expected_challenge: impl Into<ExpectedChallenge>,
        expected_origin: impl Into<String>,
        expected_rp_id: impl Into<String>,
    ) -> Self {
        Self {
            expected_challenge: expected_challenge.into(),
            expected_origins: vec![expected_origin.into()],
            expected_rp_ids: vec![expected_rp_id.into()],
            require_user_verification: true,
            require_user_presence: true,
        }
    }

    pub fn without_user_verification(mut self) -> Self {
        self.require_user_verification = false;
        self
    }

    pub fn without_user_presence(mut self) -> Self {
        self.require_user_presence = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_and_base64url_challenges_normalize_identically() {
        let raw = ExpectedChallenge::from(b"challenge bytes".as_slice());
        let encoded = ExpectedChallenge::from(base64url::encode(b"challenge bytes").as_str());
        assert_eq!(raw.bytes().unwrap(), encoded.bytes().unwrap());
    }
}
