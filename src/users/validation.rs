use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::users::dto::TextField;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Field name to the list of messages for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email_taken() -> Self {
        let mut errors = Self::new();
        errors.add("email", "The email has already been taken.");
        errors
    }

    /// The body parsed as JSON but is not an object.
    pub fn body_not_object() -> Self {
        let mut errors = Self::new();
        errors.add("body", "The request body must be a JSON object.");
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First message, plus a count of the rest.
    pub fn summary(&self) -> String {
        let total: usize = self.0.values().map(Vec::len).sum();
        let first = self
            .0
            .values()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".into());
        match total {
            0 | 1 => first,
            2 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {} more errors)", n - 1),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().copied().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

fn wrong_type(errors: &mut ValidationErrors, field: &'static str) {
    errors.add(field, format!("The {field} must be a string."));
}

/// Trimmed text of a required field. Missing, null, blank and non-string
/// values are recorded as errors.
pub(crate) fn require<'a>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &'a TextField,
) -> Option<&'a str> {
    match value {
        TextField::WrongType => {
            wrong_type(errors, field);
            None
        }
        _ => {
            let text = value.as_deref().map(str::trim).filter(|v| !v.is_empty());
            if text.is_none() {
                errors.add(field, format!("The {field} field is required."));
            }
            text
        }
    }
}

/// Required password, taken verbatim.
pub(crate) fn require_password<'a>(
    errors: &mut ValidationErrors,
    value: &'a TextField,
) -> Option<&'a str> {
    match value {
        TextField::WrongType => {
            wrong_type(errors, "password");
            None
        }
        TextField::Text(p) if !p.trim().is_empty() => {
            check_password_len(errors, p);
            Some(p.as_str())
        }
        _ => {
            errors.add("password", "The password field is required.");
            None
        }
    }
}

/// Optional password: absent, null and `""` mean "not supplied".
pub(crate) fn optional_password<'a>(
    errors: &mut ValidationErrors,
    value: &'a TextField,
) -> Option<&'a str> {
    match value {
        TextField::WrongType => {
            wrong_type(errors, "password");
            None
        }
        TextField::Text(p) if !p.is_empty() => {
            check_password_len(errors, p);
            Some(p.as_str())
        }
        _ => None,
    }
}

fn check_password_len(errors: &mut ValidationErrors, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("The password must be at least {MIN_PASSWORD_LEN} characters."),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_blank_and_wrong_type() {
        let mut errors = ValidationErrors::new();
        assert_eq!(require(&mut errors, "name", &"  Ana ".into()), Some("Ana"));
        assert!(require(&mut errors, "name", &"   ".into()).is_none());
        assert!(require(&mut errors, "email", &TextField::Absent).is_none());
        assert!(require(&mut errors, "email", &TextField::WrongType).is_none());
        assert_eq!(errors.messages("name"), ["The name field is required."]);
        assert_eq!(
            errors.messages("email"),
            ["The email field is required.", "The email must be a string."]
        );
    }

    #[test]
    fn password_length_counts_chars() {
        let mut errors = ValidationErrors::new();
        assert_eq!(require_password(&mut errors, &"12345678".into()), Some("12345678"));
        require_password(&mut errors, &"ñññññññ".into());
        assert_eq!(errors.messages("password").len(), 1);
    }

    #[test]
    fn optional_password_skips_empty() {
        let mut errors = ValidationErrors::new();
        assert!(optional_password(&mut errors, &TextField::Absent).is_none());
        assert!(optional_password(&mut errors, &"".into()).is_none());
        assert!(errors.is_empty());
        optional_password(&mut errors, &"short".into());
        assert!(errors.has("password"));
    }

    #[test]
    fn summary_mentions_extra_errors() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.summary(), "The given data was invalid.");
        errors.add("email", "The email field is required.");
        assert_eq!(errors.summary(), "The email field is required.");
        errors.add("name", "The name field is required.");
        errors.add("password", "The password field is required.");
        assert_eq!(
            errors.summary(),
            "The email field is required. (and 2 more errors)"
        );
    }

    #[test]
    fn serializes_as_field_map() {
        let errors = ValidationErrors::email_taken();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "email": ["The email has already been taken."] })
        );
    }
}
