//! Inbound payload validation.
//!
//! Wire payloads deserialize into structs whose fields are all optional, so
//! that a missing field is reported the same way as a malformed one: as a
//! [`FieldError`] inside [`ValidationErrors`]. Every offending field is
//! reported, not just the first.

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, ValidationErrors};

/// Raw contact form payload as received on the wire.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A contact submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedContact {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactSubmission {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            subject: Some(subject.into()),
            message: Some(message.into()),
        }
    }

    /// Check required fields and the email grammar.
    ///
    /// Values are passed through untouched; nothing is trimmed.
    pub fn validate(self) -> Result<ValidatedContact, ValidationErrors> {
        let mut errors = Vec::new();

        let name = required_text("name", self.name, &mut errors);
        let email = required("email", self.email, &mut errors);
        let subject = required_text("subject", self.subject, &mut errors);
        let message = required_text("message", self.message, &mut errors);

        if let Some(email) = &email {
            if !EmailAddress::is_valid(email) {
                errors.push(FieldError::new(
                    "email",
                    "value is not a valid email address",
                ));
            }
        }

        match (name, email, subject, message) {
            (Some(name), Some(email), Some(subject), Some(message)) if errors.is_empty() => {
                Ok(ValidatedContact {
                    name,
                    email,
                    subject,
                    message,
                })
            }
            _ => Err(ValidationErrors::new(errors)),
        }
    }
}

/// Raw status check payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatusCheckCreate {
    #[serde(default)]
    pub client_name: Option<String>,
}

/// A status check payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStatusCheck {
    pub client_name: String,
}

impl StatusCheckCreate {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: Some(client_name.into()),
        }
    }

    pub fn validate(self) -> Result<ValidatedStatusCheck, ValidationErrors> {
        let mut errors = Vec::new();
        match required("client_name", self.client_name, &mut errors) {
            Some(client_name) => Ok(ValidatedStatusCheck { client_name }),
            None => Err(ValidationErrors::new(errors)),
        }
    }
}

fn required(field: &str, value: Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    if value.is_none() {
        errors.push(FieldError::missing(field));
    }
    value
}

fn required_text(
    field: &str,
    value: Option<String>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match required(field, value, errors) {
        Some(v) if v.is_empty() => {
            errors.push(FieldError::new(field, "must not be empty"));
            None
        }
        other => other,
    }
}
