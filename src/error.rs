//! Error types for the onboarding wizards.

use serde::Serialize;

use crate::validation::PasswordCriterion;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// A single field that failed its check.
///
/// Recovered locally: the wizard turns these into inline messages and never
/// escalates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: String },

    #[error("{field} has an invalid format")]
    InvalidFormat { field: String },

    #[error("{field} does not meet the password requirements")]
    PasswordPolicyViolation {
        field: String,
        unmet: Vec<PasswordCriterion>,
    },

    #[error("{field} does not match {other}")]
    PasswordMismatch { field: String, other: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field }
            | Self::InvalidFormat { field }
            | Self::PasswordPolicyViolation { field, .. }
            | Self::PasswordMismatch { field, .. } => field,
        }
    }
}

/// Attachment rejected before it reaches a wizard field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileError {
    #[error("Only {accepted} files are allowed")]
    UnsupportedType { accepted: String },

    #[error("File size must be less than {max_mb}MB")]
    TooLarge { max_mb: u64 },
}

/// One-time-code challenge errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("Code must be exactly {expected} digits")]
    InvalidFormat { expected: usize },

    #[error("Resend available in {remaining}s")]
    CooldownActive { remaining: u32 },

    #[error("No code has been sent yet")]
    NotSent,

    #[error("Challenge already verified")]
    AlreadyVerified,

    #[error("Code does not match")]
    CodeMismatch,

    #[error("Code dispatch to {destination} failed: {reason}")]
    Dispatch { destination: String, reason: String },

    #[error("Code dispatch cancelled")]
    Cancelled,
}

/// Errors from the terminal "complete" collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("{handler} rejected the submission: {reason}")]
    Rejected { handler: String, reason: String },

    #[error("{handler} is unavailable: {reason}")]
    Unavailable { handler: String, reason: String },

    #[error("Submission cancelled")]
    Cancelled,
}

/// Wizard transition errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("Step {step} has {} invalid field(s)", .errors.len())]
    StepInvalid {
        step: u8,
        errors: Vec<ValidationError>,
    },

    #[error("Cannot submit from step {step} of {total}")]
    NotAtFinalStep { step: u8, total: u8 },

    #[error("Wizard already complete")]
    AlreadyComplete,

    #[error("Wizard is submitting")]
    Busy,

    #[error("Unknown field {name} for the {flow} flow")]
    UnknownField { flow: String, name: String },

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("OTP error: {0}")]
    Otp(#[from] OtpError),

    #[error("Submit error: {0}")]
    Submit(#[from] SubmitError),
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_exposes_field() {
        let err = ValidationError::PasswordMismatch {
            field: "confirmPassword".into(),
            other: "password".into(),
        };
        assert_eq!(err.field(), "confirmPassword");
        assert_eq!(err.to_string(), "confirmPassword does not match password");
    }

    #[test]
    fn validation_error_serializes_tagged() {
        let err = ValidationError::MissingField {
            field: "fullName".into(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "missing_field");
        assert_eq!(json["field"], "fullName");
    }

    #[test]
    fn wizard_error_wraps_otp() {
        let err: WizardError = OtpError::CooldownActive { remaining: 45 }.into();
        assert_eq!(err.to_string(), "OTP error: Resend available in 45s");
        assert_eq!(
            err,
            WizardError::Otp(OtpError::CooldownActive { remaining: 45 })
        );
    }
}
