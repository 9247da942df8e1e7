//! Ordered mutation steps
//!
//! A [`MutationStep`] is one unit of durable work inside an attempt. Steps
//! execute strictly in declared order; outputs (generated identifiers,
//! computed values) are threaded to later steps through a [`StepContext`].
//! A step that fails fails the whole attempt, and the coordinator discards
//! the transaction, so no partial write ever survives.

use reserva_core::{BookingRequest, StorageError, StorageResult};
use reserva_storage::StoreTransaction;

/// Output key for the primary claim identifier
///
/// Convention shared by the stock steps: the step that inserts the primary
/// claim records its id under this key, and the coordinator copies it onto
/// the receipt.
pub const OUTPUT_BOOKING_ID: &str = "booking_id";

/// Outputs produced by earlier steps in the current attempt
///
/// Reset at the start of every attempt; a retried attempt starts from an
/// empty context so identifiers from an aborted attempt cannot leak
/// forward.
#[derive(Debug, Default)]
pub struct StepContext {
    outputs: serde_json::Map<String, serde_json::Value>,
}

impl StepContext {
    /// Empty context for a fresh attempt
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an output for later steps
    pub fn record(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.outputs.insert(key.into(), value);
    }

    /// Read an output recorded by an earlier step
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.outputs.get(key)
    }

    /// Read an output that must exist
    ///
    /// A missing dependency is a wiring bug in the step sequence, not a
    /// transient condition, so it surfaces as [`StorageError::InvalidState`]
    /// and classifies as fatal.
    pub fn require(&self, key: &str) -> StorageResult<&serde_json::Value> {
        self.outputs.get(key).ok_or_else(|| {
            StorageError::InvalidState(format!("missing step output '{}'", key))
        })
    }

    /// All outputs recorded so far
    pub fn outputs(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.outputs
    }

    /// Consume the context, yielding the outputs
    pub fn into_outputs(self) -> serde_json::Map<String, serde_json::Value> {
        self.outputs
    }
}

/// One ordered unit of durable work
///
/// Steps receive a borrowed transaction: they write through it but cannot
/// commit or roll it back (the coordinator owns the box). A step must not
/// retain state across invocations — the same step sequence re-runs on
/// every retry attempt.
pub trait MutationStep: Send + Sync {
    /// Name used in logs and failure diagnostics
    fn name(&self) -> &'static str;

    /// Perform this step's writes
    fn apply(
        &self,
        txn: &mut dyn StoreTransaction,
        request: &BookingRequest,
        ctx: &mut StepContext,
    ) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outputs_thread_through() {
        let mut ctx = StepContext::new();
        ctx.record("id", json!("abc"));
        assert_eq!(ctx.get("id"), Some(&json!("abc")));
        assert_eq!(ctx.require("id").unwrap(), &json!("abc"));
    }

    #[test]
    fn test_missing_dependency_is_invalid_state() {
        let ctx = StepContext::new();
        let err = ctx.require("absent").unwrap_err();
        assert!(matches!(err, StorageError::InvalidState(_)));
        assert!(!err.is_conflict());
    }
}
