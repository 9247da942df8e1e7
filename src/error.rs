//! Unified error type for reserva.
//!
//! This module provides a clean error type that wraps internal errors
//! and presents a consistent interface to callers.

use thiserror::Error;

/// All reserva errors.
///
/// This is the canonical error type for callers of the facade. It folds
/// request-construction failures and execution outcomes into one enum so
/// application code matches on a single type.
#[derive(Debug, Error)]
pub enum Error {
    /// The request was structurally invalid before any attempt ran
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A business rule blocked the request
    #[error("rejected by rule '{rule}': {message}")]
    Rejected {
        /// Identifier of the violated rule
        rule: &'static str,
        /// Human-readable reason
        message: String,
        /// Structured parameters behind the message
        params: serde_json::Value,
    },

    /// Every attempt was consumed by conflicts; resubmit later
    #[error("conflict: {attempts} attempts exhausted, please resubmit")]
    ConflictExhausted {
        /// Attempts performed before giving up
        attempts: u32,
    },

    /// Non-retryable storage failure, with the original diagnostic
    #[error("storage error: {0}")]
    Storage(String),

    /// The caller cancelled the execution
    #[error("cancelled")]
    Cancelled,
}

/// Result type for reserva operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<reserva_core::CoreError> for Error {
    fn from(e: reserva_core::CoreError) -> Self {
        use reserva_core::CoreError;
        match e {
            CoreError::Rejected(v) => Error::Rejected {
                rule: v.rule,
                message: v.message,
                params: v.params,
            },
            CoreError::ConflictExhausted { attempts } => Error::ConflictExhausted { attempts },
            CoreError::Fatal(source) => Error::Storage(source.to_string()),
            CoreError::Cancelled => Error::Cancelled,
        }
    }
}

impl From<reserva_core::RequestError> for Error {
    fn from(e: reserva_core::RequestError) -> Self {
        Error::InvalidRequest(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reserva_core::{CoreError, Severity, ValidationViolation};

    #[test]
    fn test_rejection_keeps_rule_and_params() {
        let core = CoreError::Rejected(ValidationViolation::with_params(
            "capacity",
            "full",
            serde_json::json!({"limit": 10}),
            Severity::Rejects,
        ));
        match Error::from(core) {
            Error::Rejected { rule, params, .. } => {
                assert_eq!(rule, "capacity");
                assert_eq!(params["limit"], 10);
            }
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn test_fatal_keeps_diagnostic_text() {
        let core = CoreError::Fatal(reserva_core::StorageError::Corruption(
            "page 7 checksum".to_string(),
        ));
        assert!(Error::from(core).to_string().contains("page 7 checksum"));
    }
}
