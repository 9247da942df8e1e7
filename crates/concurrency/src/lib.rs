//! Concurrency-control policy layer for reserva
//!
//! This crate implements the policy half of the coordinator's conflict
//! handling:
//! - [`IsolationGuarantee`]: the visibility contract an attempt runs under
//! - [`ConflictClassifier`]: maps storage failures to Retryable / Fatal
//! - [`RetryPolicy`]: bounded attempt budget with a backoff schedule
//! - [`CancellationToken`]: caller-driven abort with deadline support
//!
//! The mechanics (transactions, snapshots, commit validation) live in
//! `reserva-storage`; the orchestration lives in `reserva-engine`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod classify;
pub mod isolation;
pub mod retry;

pub use cancel::CancellationToken;
pub use classify::{Classification, ConflictClassifier, StorageClassifier};
pub use isolation::IsolationGuarantee;
pub use retry::{BackoffSchedule, RetryPolicy};
