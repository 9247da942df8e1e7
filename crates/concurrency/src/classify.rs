//! Failure classification
//!
//! The classifier is the only component that inspects storage-engine error
//! codes. The coordinator asks it one question per failed attempt: is this
//! worth retrying?

use reserva_core::StorageError;

/// What a failed attempt means for the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Concurrency conflict; a fresh attempt against fresh state may succeed
    Retryable,
    /// Integrity or environment failure; retrying cannot help
    Fatal,
    /// A business rule blocked the request; retrying cannot change user input
    BusinessRejection,
}

/// Maps storage failures to a [`Classification`]
///
/// Implementations must be pure: the same error classifies the same way
/// every time, regardless of attempt number.
pub trait ConflictClassifier: Send + Sync {
    /// Classify one storage failure
    fn classify(&self, error: &StorageError) -> Classification;
}

/// Default classifier over [`StorageError`] variants
///
/// | Signal | Classification |
/// |--------|----------------|
/// | Serialization, Deadlock, LockTimeout | Retryable |
/// | ConstraintViolation, NotFound, InvalidState, Corruption, Io | Fatal |
///
/// Business rejections never reach the classifier: rules produce typed
/// violations, not storage errors, and the coordinator routes them before
/// classification. The pass-through guarantee is structural.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageClassifier;

impl ConflictClassifier for StorageClassifier {
    fn classify(&self, error: &StorageError) -> Classification {
        if error.is_conflict() {
            Classification::Retryable
        } else {
            Classification::Fatal
        }
    }
}
