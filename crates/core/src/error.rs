//! Unified error types for the warehouse ETL.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for provisioning and loading.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing or malformed. Fatal at startup.
    #[error("config error: {0}")]
    Config(String),

    /// A cloud control-plane call failed. Carries the operation name so
    /// best-effort call sites can log something actionable.
    #[error("cloud error during {operation}: {message}")]
    Cloud {
        operation: &'static str,
        message: String,
    },

    /// A SQL statement failed. Statements commit independently, so earlier
    /// statements in the run stay applied.
    #[error("sql error executing {statement}: {message}")]
    Sql {
        statement: &'static str,
        message: String,
    },

    /// The cluster never reached the expected status within the attempt
    /// budget.
    #[error("timed out waiting for cluster after {attempts} attempts ({interval:?} apart)")]
    Timeout { attempts: u32, interval: Duration },

    /// The control plane returned a response without a field we need.
    #[error("missing field in control-plane response: {0}")]
    MissingField(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a cloud control-plane error for a named operation.
    pub fn cloud(operation: &'static str, msg: impl ToString) -> Self {
        Self::Cloud {
            operation,
            message: msg.to_string(),
        }
    }

    /// Create a SQL error for a named statement.
    pub fn sql(statement: &'static str, msg: impl ToString) -> Self {
        Self::Sql {
            statement,
            message: msg.to_string(),
        }
    }

    pub fn timeout(attempts: u32, interval: Duration) -> Self {
        Self::Timeout { attempts, interval }
    }

    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField(field)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error is a wait-budget exhaustion.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
