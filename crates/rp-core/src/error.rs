//! Core error types for the resource-plan engine
//!
//! Computation-layer errors (missing or stale reference data) are recoverable
//! and never shown to the user. Persistence errors are surfaced. No error is
//! fatal to the application.

use std::collections::BTreeMap;
use thiserror::Error;

/// Standard Result type for resource-plan operations
pub type RpResult<T> = Result<T, RpError>;

/// Core error type for all resource-plan operations
#[derive(Error, Debug)]
pub enum RpError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Contract violation: {0}")]
    Contract(#[from] ContractError),

    #[error("Reference data not loaded: {entity} {id}")]
    MissingReferenceData { entity: &'static str, id: String },

    #[error("Stale reference data: expected {entity} {expected}, got {actual}")]
    StaleReferenceMismatch {
        entity: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Invalid numeric input for {field}: {value:?}")]
    InvalidNumericInput { field: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Validation errors collection, keyed by field
#[derive(Error, Debug, Default, Clone, PartialEq)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: BTreeMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get errors for a specific field
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// Ok when empty, otherwise the collected errors
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Contract validation error
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Attribute {attribute} is invalid: {message}")]
    AttributeInvalid { attribute: String, message: String },

    #[error("Attribute {attribute} is not writable")]
    AttributeNotWritable { attribute: String },

    #[error("Base contract error: {message}")]
    Base { message: String },

    #[error("Multiple contract errors")]
    Multiple { errors: ValidationErrors },
}

impl From<ContractError> for ValidationErrors {
    fn from(err: ContractError) -> Self {
        let mut errors = ValidationErrors::new();
        match err {
            ContractError::AttributeInvalid { attribute, message } => {
                errors.add(attribute, message);
            }
            ContractError::AttributeNotWritable { attribute } => {
                errors.add(attribute, "is not writable");
            }
            ContractError::Base { message } => {
                errors.add_base(message);
            }
            ContractError::Multiple { errors: e } => {
                return e;
            }
        }
        errors
    }
}

impl RpError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RpError::NotFound { .. } => "not_found",
            RpError::Validation(_) => "validation_failed",
            RpError::Contract(_) => "contract_violated",
            RpError::MissingReferenceData { .. } => "missing_reference_data",
            RpError::StaleReferenceMismatch { .. } => "stale_reference_mismatch",
            RpError::Persistence(_) => "persistence_failure",
            RpError::InvalidNumericInput { .. } => "invalid_numeric_input",
            RpError::Config(_) => "configuration_error",
            RpError::Internal(_) => "internal_error",
        }
    }

    /// Recoverable errors are retried on the next reactive trigger and never
    /// reach the user.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RpError::MissingReferenceData { .. } | RpError::StaleReferenceMismatch { .. }
        )
    }

    /// Errors the user has to acknowledge.
    pub fn is_user_visible(&self) -> bool {
        !self.is_recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collect_by_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("cost", "must be greater than or equal to 0");
        errors.add("cost", "is not a number");
        errors.add_base("line item is locked");

        assert!(errors.has_error("cost"));
        assert!(!errors.has_error("rate"));
        assert_eq!(errors.get("cost").map(Vec::len), Some(2));
        assert_eq!(errors.full_messages().len(), 3);
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_merge() {
        let mut a = ValidationErrors::new();
        a.add("hours", "is invalid");
        let mut b = ValidationErrors::new();
        b.add("hours", "must be greater than or equal to 0");
        b.add("rate", "is invalid");

        a.merge(b);
        assert_eq!(a.get("hours").map(Vec::len), Some(2));
        assert!(a.has_error("rate"));
    }

    #[test]
    fn test_contract_error_into_validation_errors() {
        let errors: ValidationErrors = ContractError::AttributeNotWritable {
            attribute: "rate".into(),
        }
        .into();
        assert_eq!(errors.get("rate"), Some(&vec!["is not writable".to_string()]));
    }

    #[test]
    fn test_recoverable_errors_are_invisible() {
        let missing = RpError::MissingReferenceData {
            entity: "Role",
            id: "7".into(),
        };
        assert!(missing.is_recoverable());
        assert!(!missing.is_user_visible());

        let persistence = RpError::Persistence("connection reset".into());
        assert!(!persistence.is_recoverable());
        assert!(persistence.is_user_visible());
        assert_eq!(persistence.error_code(), "persistence_failure");
    }
}
