//! Transaction coordinator
//!
//! The coordinator owns the attempt loop. Each attempt walks the state
//! machine `Opening → Validating → Mutating → Committing`, and ends either
//! `Committed` or rolled back. A rolled-back attempt is classified, and
//! only storage conflicts consult the retry policy; business rejections and
//! fatal errors terminate immediately.
//!
//! ## Attempt sequence
//!
//! ```text
//! 1. begin(isolation)            - open the transaction context
//! 2. snapshot()                  - capture the read-only view
//! 3. pipeline.evaluate()         - business rules, short-circuit
//! 4. IF rejected: rollback and return BusinessRejection (never retried)
//! 5. steps[i].apply() in order   - buffered leaf writes
//! 6. commit()                    - validate + apply atomically
//! 7. on conflict: classify, consult retry policy, back off, go to 1
//! ```
//!
//! The coordinator is the single owner of transaction lifetime: rules and
//! steps receive borrows of the active context and structurally cannot
//! commit or roll it back. Every exit path out of an attempt either commits
//! the transaction or consumes it in rollback — no path leaves one open.

use crate::mutation::{MutationStep, StepContext, OUTPUT_BOOKING_ID};
use crate::pipeline::{PipelineVerdict, ValidationPipeline};
use reserva_concurrency::{
    CancellationToken, Classification, ConflictClassifier, IsolationGuarantee, RetryPolicy,
    StorageClassifier,
};
use reserva_core::{
    BookingRequest, CoreError, Result, Severity, StorageError, ValidationViolation,
};
use reserva_storage::TransactionalStore;
use std::sync::Arc;

/// Configuration for one `execute` call
///
/// Isolation is explicit per call rather than ambient session state; two
/// calls on the same coordinator can run under different guarantees.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Isolation guarantee each attempt's transaction is opened with
    pub isolation: IsolationGuarantee,
    /// Attempt budget and backoff schedule
    pub retry: RetryPolicy,
    /// Optional caller-driven abort
    pub cancel: Option<CancellationToken>,
}

impl ExecuteOptions {
    /// Options with the given guarantee and the default retry policy
    pub fn new(isolation: IsolationGuarantee) -> Self {
        ExecuteOptions {
            isolation,
            retry: RetryPolicy::default(),
            cancel: None,
        }
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Success payload of a committed execution
#[derive(Debug, Clone)]
pub struct BookingReceipt {
    /// Commit version of the attempt that succeeded
    pub commit_version: u64,
    /// Number of attempts performed, including the successful one
    pub attempts: u32,
    /// Non-blocking violations from the successful attempt's validation
    pub warnings: Vec<ValidationViolation>,
    /// Outputs recorded by the mutation steps
    pub outputs: serde_json::Map<String, serde_json::Value>,
}

impl BookingReceipt {
    /// The primary claim id, when a step recorded one
    pub fn booking_id(&self) -> Option<&str> {
        self.outputs.get(OUTPUT_BOOKING_ID).and_then(|v| v.as_str())
    }
}

/// Outcome of a single attempt
///
/// Created at the top of each loop iteration and consumed immediately;
/// never persisted across attempts.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The attempt committed
    Committed(BookingReceipt),
    /// A rule blocked the request; terminal, never retried
    Rejected(ValidationViolation),
    /// A retryable storage conflict rolled the attempt back
    ConflictRetry(StorageError),
    /// A non-retryable storage failure
    Fatal(StorageError),
    /// The caller's token fired; the attempt was rolled back
    Cancelled,
}

/// The orchestrator: bounded-retry, rule-validated, multi-step execution
///
/// Holds the store handle and the conflict classifier; `execute` is
/// synchronous from the caller's point of view and safe to call from many
/// threads at once — cross-call coordination is whatever the storage
/// isolation guarantee provides.
pub struct TransactionCoordinator {
    store: Arc<dyn TransactionalStore>,
    classifier: Box<dyn ConflictClassifier>,
}

impl TransactionCoordinator {
    /// Coordinator over a store, with the default storage classifier
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        TransactionCoordinator {
            store,
            classifier: Box::new(StorageClassifier),
        }
    }

    /// Coordinator with a custom conflict classifier
    pub fn with_classifier(
        store: Arc<dyn TransactionalStore>,
        classifier: Box<dyn ConflictClassifier>,
    ) -> Self {
        TransactionCoordinator { store, classifier }
    }

    /// Run one coordinated execution to completion
    ///
    /// Loops attempts until one commits, a rule rejects, the classifier
    /// reports a fatal error, the retry budget runs out, or the caller
    /// cancels. Exactly one transaction is open at any moment, and it is
    /// always resolved (committed or rolled back) before this returns.
    pub fn execute(
        &self,
        request: &BookingRequest,
        pipeline: &ValidationPipeline,
        steps: &[Box<dyn MutationStep>],
        options: &ExecuteOptions,
    ) -> Result<BookingReceipt> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            tracing::debug!(attempt, isolation = %options.isolation, "starting attempt");

            match self.run_attempt(request, pipeline, steps, options, attempt) {
                AttemptOutcome::Committed(receipt) => {
                    tracing::debug!(
                        attempt,
                        commit_version = receipt.commit_version,
                        "execution committed"
                    );
                    return Ok(receipt);
                }
                AttemptOutcome::Rejected(violation) => {
                    return Err(CoreError::Rejected(violation));
                }
                AttemptOutcome::Cancelled => {
                    return Err(CoreError::Cancelled);
                }
                AttemptOutcome::ConflictRetry(error) => {
                    if !options
                        .retry
                        .should_retry(attempt, &Classification::Retryable)
                    {
                        tracing::warn!(attempts = attempt, "retry budget exhausted");
                        return Err(CoreError::ConflictExhausted { attempts: attempt });
                    }
                    let delay = options.retry.backoff_for(attempt);
                    tracing::warn!(
                        attempt,
                        error = %error,
                        backoff_ms = delay.as_millis() as u64,
                        "retryable conflict, backing off"
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                AttemptOutcome::Fatal(error) => {
                    tracing::error!(attempt, error = %error, "fatal storage error");
                    return Err(CoreError::Fatal(error));
                }
            }
        }
    }

    /// One pass of the attempt state machine
    fn run_attempt(
        &self,
        request: &BookingRequest,
        pipeline: &ValidationPipeline,
        steps: &[Box<dyn MutationStep>],
        options: &ExecuteOptions,
        attempt: u32,
    ) -> AttemptOutcome {
        if is_cancelled(options) {
            return AttemptOutcome::Cancelled;
        }

        // Opening
        let mut txn = match self.store.begin(options.isolation) {
            Ok(txn) => txn,
            Err(error) => return self.failed(error),
        };

        // Validating: fresh snapshot each attempt, nothing cached across
        // retries.
        let snapshot = match txn.snapshot(&request.resources, &request.actor) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                txn.rollback();
                return self.failed(error);
            }
        };
        let warnings = match pipeline.evaluate(&snapshot, request) {
            PipelineVerdict::Reject { violation, .. } => {
                // Re-running cannot change prior user input: terminal even
                // with retries remaining.
                txn.rollback();
                return AttemptOutcome::Rejected(violation);
            }
            PipelineVerdict::Pass { warnings } => warnings,
        };

        // Mutating
        let mut ctx = StepContext::new();
        for step in steps {
            if is_cancelled(options) {
                txn.rollback();
                return AttemptOutcome::Cancelled;
            }
            if let Err(error) = step.apply(txn.as_mut(), request, &mut ctx) {
                tracing::debug!(step = step.name(), error = %error, "mutation step failed");
                txn.rollback();
                return self.failed(error);
            }
        }

        // Committing: commit consumes the transaction, so a failure here
        // leaves it discarded just like a failed step.
        match txn.commit() {
            Ok(commit_version) => AttemptOutcome::Committed(BookingReceipt {
                commit_version,
                attempts: attempt,
                warnings,
                outputs: ctx.into_outputs(),
            }),
            Err(error) => self.failed(error),
        }
    }

    /// Route a storage failure through the classifier
    fn failed(&self, error: StorageError) -> AttemptOutcome {
        match self.classifier.classify(&error) {
            Classification::Retryable => AttemptOutcome::ConflictRetry(error),
            Classification::Fatal => AttemptOutcome::Fatal(error),
            // A classifier that maps a storage signal to a business
            // rejection surfaces it as one, with the diagnostic as the
            // message.
            Classification::BusinessRejection => {
                AttemptOutcome::Rejected(ValidationViolation::new(
                    "storage_rejection",
                    error.to_string(),
                    Severity::Rejects,
                ))
            }
        }
    }
}

fn is_cancelled(options: &ExecuteOptions) -> bool {
    options
        .cancel
        .as_ref()
        .is_some_and(CancellationToken::is_cancelled)
}
