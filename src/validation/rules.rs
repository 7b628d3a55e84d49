//! Static field specifications and per-step validation.

use std::collections::BTreeMap;

use serde::Serialize;

use super::fields::{FieldValue, is_digit_code, is_present, is_valid_email, sanitize_phone};
use super::password::PasswordStrength;
use crate::error::ValidationError;

/// What kind of value a field stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    /// Text that must not be echoed back.
    Secret,
    /// Text reduced to digits on input.
    Phone,
    Flag,
    File,
}

/// Shape check applied to a present value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Any,
    Email,
    StrongPassword,
    /// Sanitized to digits on input; needs at least `min_digits`.
    Phone { min_digits: usize },
    DigitCode { len: usize },
    /// Must equal the named field.
    Matches(&'static str),
    OneOf(&'static [&'static str]),
}

/// Static description of one wizard field. Never mutated at runtime.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label_key: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub rule: Rule,
    pub missing_message: &'static str,
    pub invalid_message: &'static str,
}

impl FieldSpec {
    const fn new(name: &'static str, label_key: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label_key,
            kind,
            required: false,
            rule: Rule::Any,
            missing_message: "",
            invalid_message: "",
        }
    }

    pub const fn text(name: &'static str, label_key: &'static str) -> Self {
        Self::new(name, label_key, FieldKind::Text)
    }

    pub const fn secret(name: &'static str, label_key: &'static str) -> Self {
        Self::new(name, label_key, FieldKind::Secret)
    }

    pub const fn phone(name: &'static str, label_key: &'static str) -> Self {
        Self::new(name, label_key, FieldKind::Phone)
    }

    pub const fn flag(name: &'static str, label_key: &'static str) -> Self {
        Self::new(name, label_key, FieldKind::Flag)
    }

    pub const fn file(name: &'static str, label_key: &'static str) -> Self {
        Self::new(name, label_key, FieldKind::File)
    }

    pub const fn required(mut self, message: &'static str) -> Self {
        self.required = true;
        self.missing_message = message;
        self
    }

    pub const fn rule(mut self, rule: Rule, message: &'static str) -> Self {
        self.rule = rule;
        self.invalid_message = message;
        self
    }

    /// Check one value. `peer` resolves other fields of the same wizard
    /// (for confirmation fields).
    pub fn check<'a>(
        &self,
        value: &FieldValue,
        peer: impl Fn(&str) -> Option<&'a FieldValue>,
    ) -> Result<(), ValidationError> {
        let field = self.name.to_string();

        if !is_present(value) {
            if self.required {
                return Err(ValidationError::MissingField { field });
            }
            // An empty confirmation still has to match a filled-in original.
            if let Rule::Matches(other) = self.rule {
                let other_text = peer(other).and_then(FieldValue::as_text).unwrap_or("");
                if !other_text.is_empty() {
                    return Err(ValidationError::PasswordMismatch {
                        field,
                        other: other.to_string(),
                    });
                }
            }
            return Ok(());
        }

        let text = value.as_text().unwrap_or("");
        match self.rule {
            Rule::Any => Ok(()),
            Rule::Email if is_valid_email(text) => Ok(()),
            Rule::Phone { min_digits } if sanitize_phone(text).len() >= min_digits => Ok(()),
            Rule::DigitCode { len } if is_digit_code(text, len) => Ok(()),
            Rule::OneOf(options) if options.contains(&text) => Ok(()),
            Rule::Email | Rule::Phone { .. } | Rule::DigitCode { .. } | Rule::OneOf(_) => {
                Err(ValidationError::InvalidFormat { field })
            }
            Rule::StrongPassword => {
                let strength = PasswordStrength::evaluate(text);
                if strength.is_acceptable() {
                    Ok(())
                } else {
                    Err(ValidationError::PasswordPolicyViolation {
                        field,
                        unmet: strength.unmet,
                    })
                }
            }
            Rule::Matches(other) => {
                let other_text = peer(other).and_then(FieldValue::as_text).unwrap_or("");
                if text == other_text {
                    Ok(())
                } else {
                    Err(ValidationError::PasswordMismatch {
                        field,
                        other: other.to_string(),
                    })
                }
            }
        }
    }

    /// Inline message for a failure of this field.
    pub fn message_for(&self, error: &ValidationError) -> &'static str {
        match error {
            ValidationError::MissingField { .. } => self.missing_message,
            _ => self.invalid_message,
        }
    }
}

/// A failed field together with its inline message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepIssue {
    pub error: ValidationError,
    pub message: &'static str,
}

/// Validate every field of one step. Empty result means the step passes.
pub fn validate_step(
    specs: &[FieldSpec],
    fields: &BTreeMap<&'static str, FieldValue>,
) -> Vec<StepIssue> {
    let empty = FieldValue::Empty;
    specs
        .iter()
        .filter_map(|spec| {
            let value = fields.get(spec.name).unwrap_or(&empty);
            spec.check(value, |name| fields.get(name))
                .err()
                .map(|error| StepIssue {
                    message: spec.message_for(&error),
                    error,
                })
        })
        .collect()
}
