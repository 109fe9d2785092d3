//! Error types for network construction and evaluation
//!
//! Every failure the engine reports is a precondition violation detected
//! before any weight, optimizer moment or recurrent state is touched.

use std::fmt;

/// Result type alias for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Error type for network operations
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Construction parameters cannot describe a valid layer chain
    InvalidConfiguration {
        parameter: String,
        value: String,
        reason: String,
    },

    /// A vector's length does not match the width expected at that point
    DimensionMismatch {
        expected: usize,
        got: usize,
        context: String,
    },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::InvalidConfiguration {
                parameter,
                value,
                reason,
            } => {
                write!(
                    f,
                    "Invalid configuration for parameter '{}' with value '{}': {}",
                    parameter, value, reason
                )
            }
            NetworkError::DimensionMismatch {
                expected,
                got,
                context,
            } => {
                write!(
                    f,
                    "Dimension mismatch in {}: expected {} values, got {}",
                    context, expected, got
                )
            }
        }
    }
}

impl std::error::Error for NetworkError {}

impl NetworkError {
    /// Create an invalid configuration error
    pub fn invalid_config(
        parameter: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        NetworkError::InvalidConfiguration {
            parameter: parameter.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(expected: usize, got: usize, context: impl Into<String>) -> Self {
        NetworkError::DimensionMismatch {
            expected,
            got,
            context: context.into(),
        }
    }

    /// Fails with a dimension mismatch unless `got == expected`.
    pub(crate) fn check_width(
        expected: usize,
        got: usize,
        context: impl Into<String>,
    ) -> NetworkResult<()> {
        if expected == got {
            Ok(())
        } else {
            Err(Self::dimension_mismatch(expected, got, context))
        }
    }
}
