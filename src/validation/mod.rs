//! Field validators shared by the sign-up and KYC wizards.
//!
//! Everything here is pure: predicates and sanitizers over field values,
//! plus the static [`FieldSpec`] tables the wizards validate against.

pub mod fields;
pub mod password;
pub mod rules;

pub use fields::{
    FieldInput, FieldValue, FileRef, is_digit_code, is_present, is_valid_email, sanitize_phone,
};
pub use password::{PasswordCriterion, PasswordStrength, StrengthLevel};
pub use rules::{FieldKind, FieldSpec, Rule, StepIssue, validate_step};
