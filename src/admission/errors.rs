// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Admission error types.

use super::field::Path;
use std::fmt;
use thiserror::Error;

/// Result type for admission operations.
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// AdmissionError represents errors that can occur during admission.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// BadRequest indicates a malformed request, e.g. an object that does not
    /// match the kind the request advertised.
    #[error("{0}")]
    BadRequest(String),

    /// Forbidden indicates the request is not allowed.
    #[error("{0}")]
    Forbidden(ForbiddenError),

    /// Internal represents an internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Config indicates an admission configuration that could not be decoded.
    #[error("invalid admission configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// InvalidConfiguration indicates a decoded configuration with a bad field.
    #[error("invalid admission configuration: {0}")]
    InvalidConfiguration(FieldError),
}

impl AdmissionError {
    /// Create a new BadRequest error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AdmissionError::BadRequest(msg.into())
    }

    /// Create a new Forbidden error.
    pub fn forbidden(
        name: impl Into<String>,
        namespace: impl Into<String>,
        resource: impl Into<String>,
        field_error: FieldError,
    ) -> Self {
        AdmissionError::Forbidden(ForbiddenError {
            name: name.into(),
            namespace: namespace.into(),
            resource: resource.into(),
            field_error,
        })
    }

    /// Create an Internal error.
    pub fn internal_error(msg: impl Into<String>) -> Self {
        AdmissionError::Internal(msg.into())
    }

    /// HTTP status code the API server answers with for this error.
    pub fn code(&self) -> u16 {
        match self {
            AdmissionError::BadRequest(_) => 400,
            AdmissionError::Forbidden(_) => 403,
            AdmissionError::Internal(_)
            | AdmissionError::Config(_)
            | AdmissionError::InvalidConfiguration(_) => 500,
        }
    }

    /// The field error behind a Forbidden rejection.
    pub fn field_error(&self) -> Option<&FieldError> {
        match self {
            AdmissionError::Forbidden(forbidden) => Some(&forbidden.field_error),
            AdmissionError::InvalidConfiguration(field_error) => Some(field_error),
            _ => None,
        }
    }
}

/// ForbiddenError represents a forbidden admission error with field details.
#[derive(Debug)]
pub struct ForbiddenError {
    pub name: String,
    pub namespace: String,
    pub resource: String,
    pub field_error: FieldError,
}

impl fmt::Display for ForbiddenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" is forbidden: {}",
            self.resource, self.name, self.field_error
        )
    }
}

/// FieldError represents a field-level error.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub error_type: FieldErrorType,
    pub value: String,
    pub supported_values: Vec<String>,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_type {
            FieldErrorType::NotSupported => {
                write!(
                    f,
                    "{}: Unsupported value: {}: supported values: {}",
                    self.field,
                    self.value,
                    self.supported_values
                        .iter()
                        .map(|s| format!("\"{}\"", s))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            FieldErrorType::Required => {
                write!(f, "{}: Required value", self.field)
            }
        }
    }
}

/// FieldErrorType represents the type of field error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorType {
    /// NotSupported indicates the value is not in the list of supported values.
    NotSupported,
    /// Required indicates a required field is missing.
    Required,
}

/// Create a "not supported" field error. `value` is the rendered offending
/// value and is printed verbatim.
pub fn field_not_supported(field: &Path, value: &str, supported: &[&str]) -> FieldError {
    FieldError {
        field: field.to_string(),
        error_type: FieldErrorType::NotSupported,
        value: value.to_string(),
        supported_values: supported.iter().map(|s| s.to_string()).collect(),
    }
}

/// Create a "required" field error.
pub fn field_required(field: &Path) -> FieldError {
    FieldError {
        field: field.to_string(),
        error_type: FieldErrorType::Required,
        value: String::new(),
        supported_values: Vec::new(),
    }
}
