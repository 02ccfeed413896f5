//! Error taxonomy for the contact and status check services.
//!
//! | Variant | Meaning | Caller category |
//! |---------|---------|-----------------|
//! | [`ServiceError::Validation`] | malformed or missing input, checked before any write | bad request |
//! | [`ServiceError::InvalidStatus`] | status value outside the enumeration | bad request |
//! | [`ServiceError::NotFound`] | no record was modified for the id | nothing to act on |
//! | [`ServiceError::Persistence`] | a write reported no effect | server fault |
//! | [`ServiceError::Store`] | opaque storage or network fault | server fault |

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::models::ParseMessageStatusError;

/// A diagnostic attached to one input field.
///
/// `kind` is a short machine-readable tag: `missing` for an absent field,
/// `value_error` for a present but unacceptable one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub kind: &'static str,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind: "value_error",
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: "field required".to_string(),
            kind: "missing",
        }
    }
}

/// One or more field-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new(fields: Vec<FieldError>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_fields(self) -> Vec<FieldError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed")?;
        for (i, e) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Service-level errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    InvalidStatus(#[from] ParseMessageStatusError),

    #[error("message not found: {id}")]
    NotFound { id: String },

    #[error("failed to save {0}")]
    Persistence(&'static str),

    #[error("storage fault: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    /// Client-side errors are safe to echo back; everything else is a fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidStatus(_) | Self::NotFound { .. }
        )
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_lists_fields() {
        let err = ValidationErrors::new(vec![
            FieldError::new("email", "value is not a valid email address"),
            FieldError::missing("subject"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: email: value is not a valid email address; subject: field required"
        );
    }

    #[test]
    fn test_field_error_kinds() {
        assert_eq!(FieldError::missing("name").kind, "missing");
        assert_eq!(FieldError::missing("name").message, "field required");
        assert_eq!(FieldError::new("email", "bad").kind, "value_error");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(ServiceError::NotFound { id: "x".into() }.is_client_error());
        assert!(ServiceError::from(ParseMessageStatusError("bogus".into())).is_client_error());
        assert!(!ServiceError::Persistence("contact message").is_client_error());
        assert!(!ServiceError::from(anyhow::anyhow!("disk full")).is_client_error());
    }
}
