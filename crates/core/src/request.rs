//! Booking request input type
//!
//! [`BookingRequest`] is the immutable input to a coordinated execution.
//! Construction is fallible: structural invariants (non-empty resource set,
//! well-formed window) are enforced once here so that rules and steps can
//! rely on them without re-checking.

use crate::types::{ActorId, ResourceId, TimeRange};
use serde::Serialize;

/// One flat sub-entity record attached to a request
///
/// Models the "table-valued parameter" idiom: an ordered collection of
/// related child records (participant IDs, order lines) carried alongside
/// the primary claim. No uniqueness is assumed; a rule enforces it when the
/// domain requires it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubEntity {
    /// Caller-scoped identifier of the child record
    pub id: String,
    /// Opaque domain attributes, passed through to mutation steps
    pub attributes: serde_json::Value,
}

impl SubEntity {
    /// Create a sub-entity with no attributes
    pub fn new(id: impl Into<String>) -> Self {
        SubEntity {
            id: id.into(),
            attributes: serde_json::Value::Null,
        }
    }

    /// Create a sub-entity carrying domain attributes
    pub fn with_attributes(id: impl Into<String>, attributes: serde_json::Value) -> Self {
        SubEntity {
            id: id.into(),
            attributes,
        }
    }
}

/// Immutable input to one coordinated booking
///
/// Invariants (enforced by [`BookingRequest::new`]):
/// - `resources` is non-empty
/// - the window, if present, satisfies `start < end` (guaranteed by
///   [`TimeRange`] construction)
///
/// Empty `sub_entities` is valid; a rule rejects it when a domain requires
/// at least one.
#[derive(Debug, Clone, Serialize)]
pub struct BookingRequest {
    /// The requesting party
    pub actor: ActorId,
    /// Resources the request claims, in declaration order
    pub resources: Vec<ResourceId>,
    /// Optional time window the claim covers
    pub window: Option<TimeRange>,
    /// Optional quantity claimed (seats, copies, units)
    pub quantity: Option<u32>,
    /// Ordered child records accompanying the claim
    pub sub_entities: Vec<SubEntity>,
}

/// Why a request could not be constructed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The resource list was empty
    #[error("request must name at least one resource")]
    NoResources,
}

impl BookingRequest {
    /// Create a request for the given actor and resource set
    ///
    /// Returns [`RequestError::NoResources`] when `resources` is empty.
    pub fn new(actor: ActorId, resources: Vec<ResourceId>) -> Result<Self, RequestError> {
        if resources.is_empty() {
            return Err(RequestError::NoResources);
        }
        Ok(BookingRequest {
            actor,
            resources,
            window: None,
            quantity: None,
            sub_entities: Vec::new(),
        })
    }

    /// Attach a time window
    pub fn with_window(mut self, window: TimeRange) -> Self {
        self.window = Some(window);
        self
    }

    /// Attach a claimed quantity
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Attach ordered sub-entity records
    pub fn with_sub_entities(mut self, sub_entities: Vec<SubEntity>) -> Self {
        self.sub_entities = sub_entities;
        self
    }

    /// Quantity claimed, defaulting to one unit
    pub fn claimed_quantity(&self) -> u32 {
        self.quantity.unwrap_or(1)
    }

    /// The first (primary) resource of the request
    pub fn primary_resource(&self) -> ResourceId {
        // Non-empty by construction.
        self.resources[0]
    }
}
