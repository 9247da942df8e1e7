//! Fundamental identifier and time types
//!
//! This module defines the types used throughout the system:
//! - [`ActorId`]: the party making a request (member, patient, customer)
//! - [`ResourceId`]: a capacity-bound resource (class, ward, court, title)
//! - [`BookingId`]: a durable claim produced by a committed booking
//! - [`TimeRange`]: a half-open `[start, end)` window

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for the actor placing a request
///
/// ActorId identifies the requesting party across:
/// - Booking requests
/// - Eligibility lookups in snapshots
/// - Claim records attributing prior bookings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(Uuid);

impl ActorId {
    /// Create a new random ActorId using UUID v4
    pub fn new() -> Self {
        ActorId(Uuid::new_v4())
    }

    /// Create ActorId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        ActorId(Uuid::from_bytes(bytes))
    }

    /// Get raw bytes representation
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a capacity-bound resource
///
/// A resource is anything with a capacity and a set of claims against it:
/// a class section, a hospital ward, a tennis court, a stocked title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Create a new random ResourceId using UUID v4
    pub fn new() -> Self {
        ResourceId(Uuid::new_v4())
    }

    /// Create ResourceId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        ResourceId(Uuid::from_bytes(bytes))
    }

    /// Get raw bytes representation
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a committed claim
///
/// Allocated inside a transaction when the primary claim row is inserted;
/// child rows reference it, and the caller receives it on the receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Create a new random BookingId using UUID v4
    pub fn new() -> Self {
        BookingId(Uuid::new_v4())
    }

    /// Create BookingId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        BookingId(Uuid::from_bytes(bytes))
    }

    /// Get raw bytes representation
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Half-open time window `[start, end)`
///
/// Invariant: `start < end`. Enforced by [`TimeRange::new`]; the struct
/// cannot be constructed with an inverted or empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a time range, rejecting `start >= end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start < end {
            Some(TimeRange { start, end })
        } else {
            None
        }
    }

    /// Start of the window (inclusive)
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the window (exclusive)
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether two windows overlap
    ///
    /// Half-open semantics: ranges that merely touch (`a.end == b.start`)
    /// do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the window contains the given instant
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ActorId::new(), ActorId::new());
        assert_ne!(ResourceId::new(), ResourceId::new());
        assert_ne!(BookingId::new(), BookingId::new());
    }

    #[test]
    fn test_id_byte_roundtrip() {
        let id = ResourceId::new();
        assert_eq!(id, ResourceId::from_bytes(*id.as_bytes()));
    }

    #[test]
    fn test_time_range_rejects_inverted() {
        assert!(TimeRange::new(at(10), at(9)).is_none());
        assert!(TimeRange::new(at(10), at(10)).is_none());
        assert!(TimeRange::new(at(9), at(10)).is_some());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = TimeRange::new(at(9), at(10)).unwrap();
        let b = TimeRange::new(at(10), at(11)).unwrap();
        let c = TimeRange::new(at(9), at(11)).unwrap();

        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_contains_excludes_end() {
        let r = TimeRange::new(at(9), at(10)).unwrap();
        assert!(r.contains(at(9)));
        assert!(!r.contains(at(10)));
    }
}
