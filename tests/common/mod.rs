//! Shared test support for the integration suites.
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use reserva::prelude::*;
use reserva::{Classification, ConflictClassifier, StorageError, StorageResult};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
});

/// Install a test-writer subscriber once per test binary.
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// A window on a fixed day, for deterministic overlap scenarios.
pub fn window(h1: u32, h2: u32) -> TimeRange {
    TimeRange::new(
        Utc.with_ymd_and_hms(2024, 6, 1, h1, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 6, 1, h2, 0, 0).unwrap(),
    )
    .unwrap()
}

/// The standard booking step sequence: claim, consume, fan out children.
pub fn booking_steps() -> Vec<Box<dyn MutationStep>> {
    vec![
        Box::new(InsertClaimStep),
        Box::new(ConsumeCapacityStep),
        Box::new(InsertChildRowsStep),
    ]
}

/// Options with no backoff delay and the given attempt budget.
pub fn fast_options(isolation: IsolationGuarantee, max_attempts: u32) -> ExecuteOptions {
    ExecuteOptions::new(isolation).with_retry(RetryPolicy::new(max_attempts, BackoffSchedule::None))
}

/// Classifier that treats every storage failure as retryable, for
/// exercising the retry budget.
pub struct AlwaysRetryClassifier;

impl ConflictClassifier for AlwaysRetryClassifier {
    fn classify(&self, _error: &StorageError) -> Classification {
        Classification::Retryable
    }
}

/// Step that counts how many times it ran.
pub struct CountingStep(pub Arc<AtomicU32>);

impl MutationStep for CountingStep {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn apply(
        &self,
        _txn: &mut dyn StoreTransaction,
        _request: &BookingRequest,
        _ctx: &mut StepContext,
    ) -> StorageResult<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Step that always fails with a deadlock signal.
pub struct AlwaysDeadlockStep;

impl MutationStep for AlwaysDeadlockStep {
    fn name(&self) -> &'static str {
        "always_deadlock"
    }

    fn apply(
        &self,
        _txn: &mut dyn StoreTransaction,
        _request: &BookingRequest,
        _ctx: &mut StepContext,
    ) -> StorageResult<()> {
        Err(StorageError::Deadlock("forced".to_string()))
    }
}

/// Step that fails with a deadlock signal a fixed number of times, then
/// delegates to the wrapped step.
pub struct FlakyThen<S: MutationStep> {
    pub remaining: AtomicU32,
    pub inner: S,
}

impl<S: MutationStep> FlakyThen<S> {
    pub fn new(failures: u32, inner: S) -> Self {
        FlakyThen {
            remaining: AtomicU32::new(failures),
            inner,
        }
    }
}

impl<S: MutationStep> MutationStep for FlakyThen<S> {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn apply(
        &self,
        txn: &mut dyn StoreTransaction,
        request: &BookingRequest,
        ctx: &mut StepContext,
    ) -> StorageResult<()> {
        let fail = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(StorageError::Deadlock("forced".to_string()));
        }
        self.inner.apply(txn, request, ctx)
    }
}

/// Step that runs the wrapped step and then fails the attempt, for
/// atomicity probes.
pub struct FailAfter<S: MutationStep>(pub S);

impl<S: MutationStep> MutationStep for FailAfter<S> {
    fn name(&self) -> &'static str {
        "fail_after"
    }

    fn apply(
        &self,
        txn: &mut dyn StoreTransaction,
        request: &BookingRequest,
        ctx: &mut StepContext,
    ) -> StorageResult<()> {
        self.0.apply(txn, request, ctx)?;
        Err(StorageError::Deadlock("injected after step".to_string()))
    }
}
