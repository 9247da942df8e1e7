//! # Reserva
//!
//! Rule-validated, bounded-retry transaction coordinator for capacity-bound
//! resources.
//!
//! Reserva is the engine behind "book it if the rules allow it" flows:
//! class enrolment, ward admission, court reservation, order placement.
//! One call validates a chain of business rules against a consistent
//! snapshot, performs a multi-step write, retries bounded times on storage
//! conflicts, and returns a single meaningful outcome.
//!
//! ## Quick Start
//!
//! ```ignore
//! use reserva::prelude::*;
//! use std::sync::Arc;
//!
//! let store = MemStore::new();
//! let court = store.register_resource(1);
//! let member = store.register_actor(true, 0);
//!
//! let reserva = Reserva::new(Arc::new(store.clone()));
//!
//! let request = BookingRequest::new(member, vec![court])?
//!     .with_window(window);
//! let pipeline = ValidationPipeline::new(vec![
//!     Box::new(EligibilityRule),
//!     Box::new(OverlapRule),
//! ]);
//! let steps: Vec<Box<dyn MutationStep>> = vec![
//!     Box::new(InsertClaimStep),
//!     Box::new(ConsumeCapacityStep),
//! ];
//!
//! let receipt = reserva.execute(
//!     &request,
//!     &pipeline,
//!     &steps,
//!     &ExecuteOptions::new(IsolationGuarantee::Serializable),
//! )?;
//! ```
//!
//! ## Layers
//!
//! - [`reserva_core`]: requests, snapshots, violations, errors
//! - [`reserva_concurrency`]: isolation, classification, retry, cancel
//! - [`reserva_storage`]: the transactional store seam + [`MemStore`]
//! - [`reserva_engine`]: pipeline, steps, and the coordinator itself

#![warn(missing_docs)]

mod error;
mod service;

pub mod prelude;

// Re-export main entry points
pub use error::{Error, Result};
pub use service::Reserva;

// Re-export the engine surface
pub use reserva_engine::{
    AttemptOutcome, BookingReceipt, ExecuteOptions, MutationStep, PipelineVerdict, StepContext,
    TransactionCoordinator, ValidationPipeline, ValidationRule,
};

// Re-export concurrency policy types
pub use reserva_concurrency::{
    BackoffSchedule, CancellationToken, Classification, ConflictClassifier, IsolationGuarantee,
    RetryPolicy, StorageClassifier,
};

// Re-export the storage seam
pub use reserva_storage::{MemStore, NewClaim, StoreTransaction, TransactionalStore};

// Re-export core data types
pub use reserva_core::{
    ActorId, ActorProfile, BookingId, BookingRequest, ClaimRecord, ResourceId, ResourceSnapshot,
    ResourceState, Severity, StorageError, StorageResult, SubEntity, TimeRange,
    ValidationViolation,
};
