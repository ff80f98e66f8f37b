//! Service Result type

use std::fmt;

use rp_core::error::{RpError, ValidationErrors};

/// Outcome of a service call
#[derive(Debug, Clone)]
pub struct ServiceResult<T> {
    success: bool,
    result: Option<T>,
    errors: ValidationErrors,
    /// Machine-readable reason for a failure (`RpError::error_code`)
    error_code: Option<&'static str>,
    message: Option<String>,
}

impl<T> ServiceResult<T> {
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            errors: ValidationErrors::new(),
            error_code: None,
            message: None,
        }
    }

    pub fn success_with_message(result: T, message: impl Into<String>) -> Self {
        Self::success(result).with_message(message)
    }

    /// Failed call carrying validation errors
    pub fn failure(errors: ValidationErrors) -> Self {
        Self {
            success: false,
            result: None,
            errors,
            error_code: Some("validation_failed"),
            message: None,
        }
    }

    pub fn failure_with_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::failure(errors)
    }

    pub fn failure_with_base_error(message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add_base(message);
        Self::failure(errors)
    }

    /// Failed call from an engine error. Validation errors keep their fields;
    /// everything else becomes a base error.
    pub fn from_error(err: RpError) -> Self {
        let code = err.error_code();
        let mut result = match err {
            RpError::Validation(errors) => Self::failure(errors),
            RpError::Contract(err) => Self::failure(err.into()),
            other => Self::failure_with_base_error(other.to_string()),
        };
        result.error_code = Some(code);
        result
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<T> {
        self.result.take()
    }

    /// Unwrap the result, panicking if it was a failure
    pub fn unwrap(self) -> T {
        match self.result {
            Some(result) => result,
            None => panic!(
                "called unwrap on a failed ServiceResult: {}",
                self.errors.full_messages().join(", ")
            ),
        }
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error_code(&self) -> Option<&'static str> {
        self.error_code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.errors.full_messages()
    }

    /// Map the result if successful
    pub fn map<U, F>(self, f: F) -> ServiceResult<U>
    where
        F: FnOnce(T) -> U,
    {
        ServiceResult {
            success: self.success,
            result: self.result.map(f),
            errors: self.errors,
            error_code: self.error_code,
            message: self.message,
        }
    }

    /// Chain with another service call if successful
    pub fn and_then<U, F>(self, f: F) -> ServiceResult<U>
    where
        F: FnOnce(T) -> ServiceResult<U>,
    {
        match (self.success, self.result) {
            (true, Some(result)) => f(result),
            _ => ServiceResult {
                success: false,
                result: None,
                errors: self.errors,
                error_code: self.error_code,
                message: self.message,
            },
        }
    }
}

impl<T> From<Result<T, ValidationErrors>> for ServiceResult<T> {
    fn from(result: Result<T, ValidationErrors>) -> Self {
        match result {
            Ok(value) => ServiceResult::success(value),
            Err(errors) => ServiceResult::failure(errors),
        }
    }
}

impl<T> From<Result<T, RpError>> for ServiceResult<T> {
    fn from(result: Result<T, RpError>) -> Self {
        match result {
            Ok(value) => ServiceResult::success(value),
            Err(err) => ServiceResult::from_error(err),
        }
    }
}

impl<T: fmt::Display> fmt::Display for ServiceResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.result, self.success) {
            (Some(result), true) => write!(f, "Success: {}", result),
            (None, true) => write!(f, "Success"),
            _ => write!(f, "Failure: {}", self.errors.full_messages().join(", ")),
        }
    }
}
