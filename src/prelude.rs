//! Convenient imports for reserva.
//!
//! This module re-exports the most commonly used types so you can get
//! started with a single import:
//!
//! ```ignore
//! use reserva::prelude::*;
//!
//! let reserva = Reserva::new(store);
//! let receipt = reserva.execute(&request, &pipeline, &steps, &options)?;
//! ```

// Main entry point
pub use crate::service::Reserva;

// Error handling
pub use crate::error::{Error, Result};

// Request and outcome types
pub use reserva_core::{
    ActorId, BookingId, BookingRequest, ResourceId, Severity, SubEntity, TimeRange,
    ValidationViolation,
};

// Engine surface
pub use reserva_engine::{
    BookingReceipt, ExecuteOptions, MutationStep, StepContext, TransactionCoordinator,
    ValidationPipeline, ValidationRule,
};

// Stock rules and steps
pub use reserva_engine::rules::{
    CapacityRule, DoubleBookingRule, DuplicateSubEntityRule, EligibilityRule, NearCapacityRule,
    OverlapRule, QuantityBudgetRule, RequiresSubEntitiesRule,
};
pub use reserva_engine::steps::{ConsumeCapacityStep, InsertChildRowsStep, InsertClaimStep};

// Concurrency policy
pub use reserva_concurrency::{
    BackoffSchedule, CancellationToken, IsolationGuarantee, RetryPolicy,
};

// Storage seam
pub use reserva_storage::{MemStore, StoreTransaction, TransactionalStore};

// Re-export serde_json for convenience
pub use serde_json::json;
