//! Workflow tags scoping a passcode to one sensitive action.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest accepted custom purpose tag
const MAX_PURPOSE_LENGTH: usize = 64;

/// The workflow a passcode authorizes
///
/// Passcodes for different purposes on the same email are independent.
/// Tags outside the built-in set are carried as `Custom`, which keeps the set
/// open for new workflows without touching the store schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OtpPurpose {
    /// Confirming the applicant's address before an application is submitted
    ApplicationSubmission,
    /// Confirming the account owner before a password reset
    PasswordReset,
    /// Any other workflow tag (lowercase ASCII letters, digits, `_` or `-`)
    Custom(String),
}

impl OtpPurpose {
    /// The wire/storage tag for this purpose
    pub fn as_str(&self) -> &str {
        match self {
            OtpPurpose::ApplicationSubmission => "application_submission",
            OtpPurpose::PasswordReset => "password_reset",
            OtpPurpose::Custom(tag) => tag,
        }
    }
}

impl Default for OtpPurpose {
    fn default() -> Self {
        OtpPurpose::ApplicationSubmission
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        match tag.as_str() {
            "application_submission" => Ok(OtpPurpose::ApplicationSubmission),
            "password_reset" => Ok(OtpPurpose::PasswordReset),
            "" => Err("Purpose must not be empty".to_string()),
            _ if tag.len() > MAX_PURPOSE_LENGTH => {
                Err(format!("Purpose longer than {} characters", MAX_PURPOSE_LENGTH))
            }
            _ if tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') =>
            {
                Ok(OtpPurpose::Custom(tag))
            }
            _ => Err(format!("Invalid purpose tag: {}", s)),
        }
    }
}

impl TryFrom<String> for OtpPurpose {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OtpPurpose> for String {
    fn from(purpose: OtpPurpose) -> Self {
        purpose.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_application_submission() {
        assert_eq!(OtpPurpose::default(), OtpPurpose::ApplicationSubmission);
        assert_eq!(OtpPurpose::default().as_str(), "application_submission");
    }

    #[test]
    fn test_parse_known_tags() {
        assert_eq!(
            "application_submission".parse::<OtpPurpose>().unwrap(),
            OtpPurpose::ApplicationSubmission
        );
        assert_eq!(
            " Password_Reset ".parse::<OtpPurpose>().unwrap(),
            OtpPurpose::PasswordReset
        );
    }

    #[test]
    fn test_parse_custom_tags() {
        assert_eq!(
            "email_change".parse::<OtpPurpose>().unwrap(),
            OtpPurpose::Custom("email_change".to_string())
        );
        assert!("".parse::<OtpPurpose>().is_err());
        assert!("has space".parse::<OtpPurpose>().is_err());
        assert!("x".repeat(65).parse::<OtpPurpose>().is_err());
    }

    #[test]
    fn test_serde_uses_tag_strings() {
        let json = serde_json::to_string(&OtpPurpose::PasswordReset).unwrap();
        assert_eq!(json, "\"password_reset\"");

        let custom: OtpPurpose = serde_json::from_str("\"withdrawal\"").unwrap();
        assert_eq!(custom, OtpPurpose::Custom("withdrawal".to_string()));

        assert!(serde_json::from_str::<OtpPurpose>("\"bad tag\"").is_err());
    }
}
