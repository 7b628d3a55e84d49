//! Field values and the basic presence / shape predicates.

use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::FileError;

/// Extensions accepted for document and selfie uploads.
pub const ACCEPTED_FILE_TYPES: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];

/// Upload size limit in megabytes.
pub const MAX_FILE_SIZE_MB: u64 = 5;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// A reference to a file chosen by the user.
///
/// The wizard never reads the file; it only keeps the reference so it can
/// check presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub size_bytes: u64,
}

impl FileRef {
    /// Accept a file if its extension and size are allowed.
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Result<Self, FileError> {
        let name = name.into();
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !ACCEPTED_FILE_TYPES.contains(&extension.as_str()) {
            return Err(FileError::UnsupportedType {
                accepted: ACCEPTED_FILE_TYPES.join(","),
            });
        }
        if size_bytes > MAX_FILE_SIZE_MB * 1024 * 1024 {
            return Err(FileError::TooLarge {
                max_mb: MAX_FILE_SIZE_MB,
            });
        }

        Ok(Self { name, size_bytes })
    }
}

/// The value held by a wizard field.
#[derive(Debug, Default)]
pub enum FieldValue {
    #[default]
    Empty,
    Text(String),
    /// Passwords; never echoed back in status views.
    Secret(SecretString),
    Flag(bool),
    File(FileRef),
}

impl FieldValue {
    /// Text content for text-like values. Secrets are exposed here because
    /// validators need to inspect them.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Secret(s) => Some(s.expose_secret()),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, Self::Flag(true))
    }

    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            Self::File(f) => Some(f),
            _ => None,
        }
    }

    /// Display-safe JSON for status views.
    pub fn to_public_json(&self) -> serde_json::Value {
        match self {
            Self::Empty => serde_json::Value::Null,
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Secret(s) if s.expose_secret().is_empty() => serde_json::Value::Null,
            Self::Secret(_) => serde_json::Value::String("********".to_string()),
            Self::Flag(b) => serde_json::Value::Bool(*b),
            Self::File(f) => serde_json::json!({ "name": f.name, "size_bytes": f.size_bytes }),
        }
    }
}

/// A value as submitted by a caller, before the wizard normalizes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldInput {
    Text(String),
    Flag(bool),
    File { name: String, size_bytes: u64 },
    Clear,
}

/// Required-field presence: non-blank text, a checked flag, or a file.
pub fn is_present(value: &FieldValue) -> bool {
    match value {
        FieldValue::Empty => false,
        FieldValue::Text(s) => !s.trim().is_empty(),
        FieldValue::Secret(s) => !s.expose_secret().is_empty(),
        FieldValue::Flag(b) => *b,
        FieldValue::File(_) => true,
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Strip everything but ASCII digits.
///
/// Phone input is sanitized rather than rejected.
pub fn sanitize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Exactly `len` ASCII digits.
pub fn is_digit_code(code: &str, len: usize) -> bool {
    code.len() == len && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("name@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.et"));
        assert!(!is_valid_email("name@example"));
        assert!(!is_valid_email("name example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn phone_is_sanitized_not_rejected() {
        assert_eq!(sanitize_phone("+251 (91) 123-4567"), "251911234567");
        assert_eq!(sanitize_phone("abc"), "");
        assert_eq!(sanitize_phone("0911234567"), "0911234567");
    }

    #[test]
    fn presence() {
        assert!(!is_present(&FieldValue::Empty));
        assert!(!is_present(&FieldValue::Text("   ".into())));
        assert!(is_present(&FieldValue::Text("Abebe".into())));
        assert!(!is_present(&FieldValue::Flag(false)));
        assert!(is_present(&FieldValue::Flag(true)));
        assert!(!is_present(&FieldValue::Secret(SecretString::from(String::new()))));
        assert!(is_present(&FieldValue::File(FileRef::new("id.png", 10).unwrap())));
    }

    #[test]
    fn digit_codes() {
        assert!(is_digit_code("123456", 6));
        assert!(!is_digit_code("12345", 6));
        assert!(!is_digit_code("12345a", 6));
        assert!(!is_digit_code("١٢٣٤٥٦", 6));
    }

    #[test]
    fn file_ref_checks_extension_and_size() {
        assert!(FileRef::new("passport.PDF", 1024).is_ok());
        assert_eq!(
            FileRef::new("notes.txt", 10).unwrap_err(),
            FileError::UnsupportedType {
                accepted: "jpg,jpeg,png,pdf".into()
            }
        );
        assert_eq!(
            FileRef::new("noext", 10).unwrap_err(),
            FileError::UnsupportedType {
                accepted: "jpg,jpeg,png,pdf".into()
            }
        );
        assert_eq!(
            FileRef::new("huge.jpg", 5 * 1024 * 1024 + 1).unwrap_err(),
            FileError::TooLarge { max_mb: 5 }
        );
        assert!(FileRef::new("edge.jpg", 5 * 1024 * 1024).is_ok());
    }

    #[test]
    fn secrets_are_masked_in_public_json() {
        let secret = FieldValue::Secret(SecretString::from("Abcdef1!".to_string()));
        assert_eq!(secret.to_public_json(), serde_json::json!("********"));
        assert_eq!(secret.as_text(), Some("Abcdef1!"));
        assert_eq!(FieldValue::Empty.to_public_json(), serde_json::Value::Null);
    }

    #[test]
    fn field_input_wire_format() {
        let input: FieldInput = serde_json::from_str(r#"{"text":"Abebe"}"#).unwrap();
        assert_eq!(input, FieldInput::Text("Abebe".into()));
        let input: FieldInput =
            serde_json::from_str(r#"{"file":{"name":"id.png","size_bytes":42}}"#).unwrap();
        assert_eq!(
            input,
            FieldInput::File {
                name: "id.png".into(),
                size_bytes: 42
            }
        );
        let input: FieldInput = serde_json::from_str(r#""clear""#).unwrap();
        assert_eq!(input, FieldInput::Clear);
    }
}
