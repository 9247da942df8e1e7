//! Orchestration core: the transaction coordinator
//!
//! This crate implements the engine that every booking-style flow shares:
//! - [`ValidationPipeline`]: ordered, short-circuiting business rules over
//!   a consistent snapshot
//! - [`MutationStep`] / [`StepContext`]: ordered durable writes with
//!   outputs threaded from step to step
//! - [`TransactionCoordinator`]: the bounded-retry attempt loop that owns
//!   transaction lifetime
//! - Stock rules ([`rules`]) and steps ([`steps`]) generic over any
//!   capacity-bound domain

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod mutation;
pub mod pipeline;
pub mod rules;
pub mod steps;

pub use coordinator::{
    AttemptOutcome, BookingReceipt, ExecuteOptions, TransactionCoordinator,
};
pub use mutation::{MutationStep, StepContext};
pub use pipeline::{PipelineVerdict, ValidationPipeline, ValidationRule};
