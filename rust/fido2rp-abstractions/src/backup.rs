// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Credential backup semantics derived from the BE/BS authenticator flags.

use crate::error::VerifyError;

/// Whether a credential is bound to one authenticator or eligible to roam.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CredentialDeviceType {
    SingleDevice,
    MultiDevice,
}

impl CredentialDeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialDeviceType::SingleDevice => "singleDevice",
            CredentialDeviceType::MultiDevice => "multiDevice",
        }
    }
}

/// Backup state snapshot taken from authenticator data flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BackupFlags {
    pub credential_device_type: CredentialDeviceType,
    pub credential_backed_up: bool,
}

/// Derives backup semantics from the BE (backup eligible) and BS (backup
/// state) flags.
///
/// `BE=0, BS=1` asserts backup state for a credential that cannot be backed
/// up; that combination is rejected before any trust decision is made.
pub fn parse_backup_flags(be: bool, bs: bool) -> Result<BackupFlags, VerifyError> {
    if !be && bs {
        return Err(VerifyError::BackupFlagsImpossible);
    }

    let credential_device_type = if be {
        CredentialDeviceType::MultiDevice
    } else {
        CredentialDeviceType::SingleDevice
    };

    Ok(BackupFlags {
        credential_device_type,
        credential_backed_up: bs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_device_not_backed_up() {
        let parsed = parse_backup_flags(false, false).unwrap();
        assert_eq!(parsed.credential_device_type, CredentialDeviceType::SingleDevice);
        assert!(!parsed.credential_backed_up);
    }

    #[test]
    fn single_device_backed_up_is_impossible() {
        assert_eq!(
            parse_backup_flags(false, true).unwrap_err(),
            VerifyError::BackupFlagsImpossible
        );
    }

    #[test]
    fn multi_device_not_backed_up() {
        let parsed = parse_backup_flags(true, false).unwrap();
        assert_eq!(parsed.credential_device_type, CredentialDeviceType::MultiDevice);
        assert!(!parsed.credential_backed_up);
    }

    #[test]
    fn multi_device_backed_up() {
        let parsed = parse_backup_flags(true, true).unwrap();
        assert_eq!(parsed.credential_device_type, CredentialDeviceType::MultiDevice);
        assert!(parsed.credential_backed_up);
    }
}
