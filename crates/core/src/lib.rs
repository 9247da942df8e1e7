//! Core types for the reserva coordinator
//!
//! This crate defines the fundamental types shared by every layer:
//! - Identifiers ([`ActorId`], [`ResourceId`], [`BookingId`]) and [`TimeRange`]
//! - [`BookingRequest`]: the immutable input to a coordinated booking
//! - [`ResourceSnapshot`]: the per-attempt read-only view of shared state
//! - [`ValidationViolation`]: structured rule rejections and warnings
//! - [`StorageError`] / [`CoreError`]: the error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod request;
pub mod snapshot;
pub mod types;
pub mod violation;

pub use error::{CoreError, Result, StorageError, StorageResult};
pub use request::{BookingRequest, RequestError, SubEntity};
pub use snapshot::{ActorProfile, ClaimRecord, ResourceSnapshot, ResourceState};
pub use types::{ActorId, BookingId, ResourceId, TimeRange};
pub use violation::{Severity, ValidationViolation};
