//! Error taxonomy for the coordinator
//!
//! Two layers of errors, kept deliberately separate:
//!
//! - [`StorageError`]: raw signals from the storage engine (serialization
//!   failures, deadlock victim selection, integrity violations). These are
//!   the only place engine-specific failure codes appear; the conflict
//!   classifier in `reserva-concurrency` is the only consumer that inspects
//!   them.
//! - [`CoreError`]: the public outcome taxonomy a caller sees from
//!   `execute`. Business rejections and exhausted conflicts are recovered
//!   into typed variants; fatal errors carry the original storage
//!   diagnostic as their source.

use crate::violation::ValidationViolation;
use thiserror::Error;

/// Storage-layer failure signals
///
/// Raised by `StoreTransaction` implementations during snapshot capture,
/// leaf writes, or commit. Variants group into the three classifications
/// the coordinator cares about:
///
/// | Variant | Typical engine signal |
/// |---------|-----------------------|
/// | Serialization | first-committer-wins validation failure, phantom detected |
/// | Deadlock | engine chose this transaction as the deadlock victim |
/// | LockTimeout | lock wait exceeded the engine's budget |
/// | ConstraintViolation | unique/foreign-key/check failure |
/// | NotFound | referenced row does not exist |
/// | InvalidState | transaction used after commit/rollback, misuse |
/// | Corruption | unreadable or inconsistent stored data |
/// | Io | underlying I/O failure |
#[derive(Debug, Error)]
pub enum StorageError {
    /// Serialization/write-write conflict detected at commit
    #[error("serialization conflict: {0}")]
    Serialization(String),

    /// This transaction was chosen as the deadlock victim
    #[error("deadlock victim: {0}")]
    Deadlock(String),

    /// Lock acquisition timed out
    #[error("lock wait timeout: {0}")]
    LockTimeout(String),

    /// Integrity constraint violated (unique, reference, check)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Transaction handle misused (already finished, wrong store)
    #[error("invalid transaction state: {0}")]
    InvalidState(String),

    /// Stored data is unreadable or internally inconsistent
    #[error("corruption: {0}")]
    Corruption(String),

    /// I/O error from the underlying medium
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Check if this error is a concurrency conflict.
    ///
    /// Conflicts may succeed on retry against fresh state; everything else
    /// will fail the same way again.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::Serialization(_)
                | StorageError::Deadlock(_)
                | StorageError::LockTimeout(_)
        )
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Terminal outcome taxonomy for a coordinated execution
///
/// Exactly one of these is returned when `execute` does not succeed.
/// The mapping is deliberate:
///
/// - [`CoreError::Rejected`] carries the violating rule's structured
///   violation verbatim — the definitive, user-meaningful reason.
/// - [`CoreError::ConflictExhausted`] is a single generic outcome; which
///   attempt failed and why is an implementation detail the caller cannot
///   observe.
/// - [`CoreError::Fatal`] propagates the original storage diagnostic for
///   operator diagnosis, never swallowed.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A validation rule blocked the request; never retried
    #[error("rejected: {0}")]
    Rejected(ValidationViolation),

    /// Every attempt was consumed by retryable conflicts
    #[error("conflict: {attempts} attempts exhausted, please resubmit")]
    ConflictExhausted {
        /// Number of attempts performed before giving up
        attempts: u32,
    },

    /// Non-retryable storage or integrity failure
    #[error("fatal storage error")]
    Fatal(#[source] StorageError),

    /// The caller's cancellation token fired; the open attempt was rolled back
    #[error("cancelled by caller")]
    Cancelled,
}

impl CoreError {
    /// Check if this outcome is a business rejection.
    pub fn is_rejection(&self) -> bool {
        matches!(self, CoreError::Rejected(_))
    }

    /// Check if this outcome is an exhausted conflict budget.
    pub fn is_conflict_exhausted(&self) -> bool {
        matches!(self, CoreError::ConflictExhausted { .. })
    }

    /// The violation behind a rejection, if any.
    pub fn violation(&self) -> Option<&ValidationViolation> {
        match self {
            CoreError::Rejected(v) => Some(v),
            _ => None,
        }
    }
}

/// Result alias for coordinator operations.
pub type Result<T> = std::result::Result<T, CoreError>;
