//! Password strength scoring.
//!
//! Four independent criteria. The meter shows partial credit; a wizard step
//! only accepts a password that meets all four.

use serde::{Deserialize, Serialize};

/// Minimum password length, counted in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the special-character criterion.
pub const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// One password strength criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordCriterion {
    MinLength,
    Digit,
    Uppercase,
    SpecialChar,
}

impl PasswordCriterion {
    pub const ALL: [PasswordCriterion; 4] = [
        Self::MinLength,
        Self::Digit,
        Self::Uppercase,
        Self::SpecialChar,
    ];

    /// Translation key for the checklist label.
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::MinLength => "minChars",
            Self::Digit => "minNumber",
            Self::Uppercase => "minUppercase",
            Self::SpecialChar => "minSpecialChar",
        }
    }

    pub fn is_met_by(&self, password: &str) -> bool {
        match self {
            Self::MinLength => password.chars().count() >= MIN_PASSWORD_LENGTH,
            Self::Digit => password.chars().any(|c| c.is_ascii_digit()),
            Self::Uppercase => password.chars().any(|c| c.is_ascii_uppercase()),
            Self::SpecialChar => password.chars().any(|c| SPECIAL_CHARS.contains(c)),
        }
    }
}

/// Meter bands, from the share of criteria met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    Weak,
    Fair,
    Good,
    Strong,
}

/// Evaluated strength of one password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    pub met: Vec<PasswordCriterion>,
    pub unmet: Vec<PasswordCriterion>,
}

impl PasswordStrength {
    pub fn evaluate(password: &str) -> Self {
        let (met, unmet): (Vec<_>, Vec<_>) = PasswordCriterion::ALL
            .into_iter()
            .partition(|c| c.is_met_by(password));
        Self { met, unmet }
    }

    pub fn criteria_met(&self) -> usize {
        self.met.len()
    }

    /// `criteria_met / 4`.
    pub fn score(&self) -> f64 {
        self.met.len() as f64 / PasswordCriterion::ALL.len() as f64
    }

    pub fn percent(&self) -> f64 {
        self.score() * 100.0
    }

    pub fn level(&self) -> StrengthLevel {
        let percent = self.percent();
        if percent >= 75.0 {
            StrengthLevel::Strong
        } else if percent >= 50.0 {
            StrengthLevel::Good
        } else if percent >= 25.0 {
            StrengthLevel::Fair
        } else {
            StrengthLevel::Weak
        }
    }

    /// Whether a wizard step may accept this password.
    pub fn is_acceptable(&self) -> bool {
        self.unmet.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_lowercase_meets_nothing() {
        let strength = PasswordStrength::evaluate("abc");
        assert_eq!(strength.criteria_met(), 0);
        assert_eq!(strength.unmet, PasswordCriterion::ALL.to_vec());
        assert!(!strength.is_acceptable());
        assert_eq!(strength.level(), StrengthLevel::Weak);
    }

    #[test]
    fn strong_password_meets_all() {
        let strength = PasswordStrength::evaluate("Abcdef1!");
        assert_eq!(strength.criteria_met(), 4);
        assert_eq!(strength.score(), 1.0);
        assert!(strength.is_acceptable());
        assert_eq!(strength.level(), StrengthLevel::Strong);
    }

    #[test]
    fn partial_credit_bands() {
        // length only
        let s = PasswordStrength::evaluate("abcdefgh");
        assert_eq!(s.met, vec![PasswordCriterion::MinLength]);
        assert_eq!(s.level(), StrengthLevel::Fair);
        assert_eq!(s.percent(), 25.0);

        // length + digit
        let s = PasswordStrength::evaluate("abcdefg1");
        assert_eq!(s.criteria_met(), 2);
        assert_eq!(s.level(), StrengthLevel::Good);

        // length + digit + upper
        let s = PasswordStrength::evaluate("Abcdefg1");
        assert_eq!(s.unmet, vec![PasswordCriterion::SpecialChar]);
        assert_eq!(s.level(), StrengthLevel::Strong);
        assert!(!s.is_acceptable());
    }

    #[test]
    fn special_set_is_fixed() {
        assert!(PasswordCriterion::SpecialChar.is_met_by("a\"b"));
        assert!(PasswordCriterion::SpecialChar.is_met_by("{x}"));
        assert!(!PasswordCriterion::SpecialChar.is_met_by("a-b_c"));
        assert!(!PasswordCriterion::SpecialChar.is_met_by("a+b=c"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(!PasswordCriterion::MinLength.is_met_by("ሀሀሀሀሀሀሀ"));
        assert!(PasswordCriterion::MinLength.is_met_by("ሀሀሀሀሀሀሀሀ"));
    }
}
