//! Declarative validation rules for user input

use std::borrow::Cow;

use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::DomainError;

pub const MAX_NAME_LENGTH: u64 = 255;
pub const MAX_EMAIL_LENGTH: u64 = 255;
pub const MAX_PASSWORD_LENGTH: u64 = 128;

/// Input for registering or creating a user
///
/// Missing fields deserialize as empty strings so they are reported by the
/// validation rules rather than by the JSON decoder.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NewUserInput {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH, message = "is required and must be at most 255 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,

    #[validate(
        email(message = "must be a valid email address"),
        length(max = MAX_EMAIL_LENGTH, message = "must be at most 255 characters")
    )]
    pub email: String,

    #[validate(length(min = 1, max = MAX_PASSWORD_LENGTH, message = "is required and must be at most 128 characters"))]
    pub password: String,
}

impl NewUserInput {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Trim the name and canonicalize the email
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self
    }
}

/// Partial update payload; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserPatch {
    #[validate(
        length(min = 1, max = MAX_NAME_LENGTH, message = "must be between 1 and 255 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[validate(
        email(message = "must be a valid email address"),
        length(max = MAX_EMAIL_LENGTH, message = "must be at most 255 characters")
    )]
    pub email: Option<String>,

    #[validate(length(min = 1, max = MAX_PASSWORD_LENGTH, message = "must be between 1 and 128 characters"))]
    pub password: Option<String>,
}

impl UserPatch {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self.email = self.email.map(|e| normalize_email(&e));
        self
    }
}

/// Login credentials
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Credentials {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self
    }
}

/// Emails are compared case-insensitively, so they are stored lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Run the declarative rules of `input`, flattening failures into a
/// `DomainError::Validation`
pub fn validate_input<T: Validate>(input: &T) -> Result<(), DomainError> {
    input
        .validate()
        .map_err(|errors| DomainError::validation(describe(&errors)))
}

fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages: Vec<String> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect();

    parts.sort();
    parts.join("; ")
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::Borrowed("must not be blank"));
        return Err(error);
    }
    Ok(())
}
