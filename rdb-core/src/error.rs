//! Error types for rdb

use thiserror::Error;

/// The main error type for rdb operations
#[derive(Error, Debug)]
pub enum Error {
    /// Failure reported by the sqlx driver
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failure reported by any other driver implementation
    #[error("Driver error: {message}")]
    Driver { message: String },

    /// Bad arguments handed to a factory, modifier or finalizer
    #[error("Contract violation: {message}")]
    ContractViolation { message: String },

    /// The builder was used in a state that does not allow the call
    #[error("Invalid usage: {message}")]
    UsageState { message: String },

    /// Two placeholders of one statement resolved to the same name
    #[error("Bind parameter ':{name}' is bound twice")]
    DuplicateParameter { name: String },

    /// Row deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid connection configuration
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Convenience Result type for rdb operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new contract violation error
    pub fn contract_violation(message: impl Into<String>) -> Self {
        Self::ContractViolation {
            message: message.into(),
        }
    }

    /// Create a new usage state error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::UsageState {
            message: message.into(),
        }
    }

    /// Create a new driver error
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a new duplicate parameter error
    pub fn duplicate_parameter(name: impl Into<String>) -> Self {
        Self::DuplicateParameter { name: name.into() }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error came from the driver rather than from the builder
    pub fn is_driver_failure(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Driver { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_error() {
        let err = Error::contract_violation("columns must not be empty");
        assert!(matches!(err, Error::ContractViolation { .. }));
        assert_eq!(
            err.to_string(),
            "Contract violation: columns must not be empty"
        );
    }

    #[test]
    fn test_usage_error() {
        let err = Error::usage("statement already materialized");
        assert!(matches!(err, Error::UsageState { .. }));
        assert_eq!(err.to_string(), "Invalid usage: statement already materialized");
    }

    #[test]
    fn test_duplicate_parameter_error() {
        let err = Error::duplicate_parameter("age_0_0");
        assert_eq!(err.to_string(), "Bind parameter ':age_0_0' is bound twice");
    }

    #[test]
    fn test_driver_failures_are_classified() {
        assert!(Error::driver("connection reset").is_driver_failure());
        assert!(Error::Database(sqlx::Error::RowNotFound).is_driver_failure());
        assert!(!Error::contract_violation("x").is_driver_failure());
        assert!(!Error::config("x").is_driver_failure());
    }
}
