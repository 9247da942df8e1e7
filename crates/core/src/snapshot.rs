//! Per-attempt resource snapshot
//!
//! [`ResourceSnapshot`] is the read-only view a validation pipeline runs
//! against: capacity counters, prior claims, and the requesting actor's
//! profile, captured once per attempt under the attempt's isolation
//! guarantee. It is never mutated in place; each retry captures a fresh one
//! and the old one is dropped with the rolled-back transaction.

use crate::types::{ActorId, BookingId, ResourceId, TimeRange};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// An existing claim against a resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimRecord {
    /// The committed claim's identifier
    pub booking: BookingId,
    /// Who holds the claim
    pub claimant: ActorId,
    /// Window the claim covers, if windowed
    pub window: Option<TimeRange>,
    /// Units the claim consumes
    pub quantity: u32,
}

/// State of one resource at capture time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceState {
    /// Maximum units the resource can hold
    pub capacity: u32,
    /// Units currently committed
    pub in_use: u32,
    /// Storage version of the resource row at capture
    pub version: u64,
    /// Committed claims against this resource
    pub claims: Vec<ClaimRecord>,
}

impl ResourceState {
    /// Units still available at capture time
    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.in_use)
    }

    /// Claims whose window overlaps the given one
    pub fn claims_overlapping<'a>(
        &'a self,
        window: &'a TimeRange,
    ) -> impl Iterator<Item = &'a ClaimRecord> {
        self.claims
            .iter()
            .filter(move |c| c.window.as_ref().is_some_and(|w| w.overlaps(window)))
    }
}

/// The requesting actor's standing at capture time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorProfile {
    /// Whether the actor is currently eligible to book
    pub eligible: bool,
    /// Units the actor has accumulated across prior claims
    pub cumulative_quantity: u32,
}

/// Read-only view of shared state for one validation run
///
/// Captured once per attempt; `captured_at` is the single timestamp every
/// rule in the pipeline compares against, so all rules in one run see the
/// same clock.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSnapshot {
    /// Instant the snapshot was taken
    pub captured_at: DateTime<Utc>,
    /// State of each resource the request touches
    pub resources: BTreeMap<ResourceId, ResourceState>,
    /// The requesting actor's profile
    pub actor: ActorProfile,
}

impl ResourceSnapshot {
    /// Look up the state of one resource
    pub fn resource(&self, id: &ResourceId) -> Option<&ResourceState> {
        self.resources.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(h1: u32, h2: u32) -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2024, 6, 1, h1, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, h2, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn claim(w: Option<TimeRange>) -> ClaimRecord {
        ClaimRecord {
            booking: BookingId::new(),
            claimant: ActorId::new(),
            window: w,
            quantity: 1,
        }
    }

    #[test]
    fn test_available_saturates() {
        let state = ResourceState {
            capacity: 5,
            in_use: 7,
            version: 1,
            claims: vec![],
        };
        assert_eq!(state.available(), 0);
    }

    #[test]
    fn test_overlapping_claims_filter() {
        let state = ResourceState {
            capacity: 2,
            in_use: 2,
            version: 1,
            claims: vec![claim(Some(window(9, 10))), claim(Some(window(12, 13))), claim(None)],
        };
        let probe = window(9, 11);
        assert_eq!(state.claims_overlapping(&probe).count(), 1);
    }
}
