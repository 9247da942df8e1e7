//! Stock validation rules
//!
//! Generic rules over the abstract snapshot, reusable by any capacity-bound
//! domain. Domain-specific phrasing stays with the caller; these cover the
//! checks every booking flow repeats: capacity, window overlap, duplicate
//! claims, actor eligibility, quantity budgets, duplicate child records.

use crate::pipeline::ValidationRule;
use reserva_core::{BookingRequest, ResourceSnapshot, Severity, ValidationViolation};
use serde_json::json;
use std::collections::HashSet;

/// Rejects when any requested resource lacks room for the claimed quantity
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityRule;

impl ValidationRule for CapacityRule {
    fn id(&self) -> &'static str {
        "capacity"
    }

    fn evaluate(
        &self,
        snapshot: &ResourceSnapshot,
        request: &BookingRequest,
    ) -> Option<ValidationViolation> {
        let requested = request.claimed_quantity();
        for id in &request.resources {
            let state = snapshot.resource(id)?;
            if state.available() < requested {
                return Some(ValidationViolation::with_params(
                    self.id(),
                    format!(
                        "resource {} has {} of {} units free, {} requested",
                        id,
                        state.available(),
                        state.capacity,
                        requested
                    ),
                    json!({
                        "resource": id.to_string(),
                        "capacity": state.capacity,
                        "in_use": state.in_use,
                        "requested": requested,
                    }),
                    Severity::Rejects,
                ));
            }
        }
        None
    }
}

/// Rejects when the requested window overlaps any existing claim on a
/// requested resource
///
/// Exclusive-resource semantics (a court, an operating theatre): one claim
/// at a time. Domains where overlap is fine per-resource but not per-actor
/// want [`DoubleBookingRule`] instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapRule;

impl ValidationRule for OverlapRule {
    fn id(&self) -> &'static str {
        "overlap"
    }

    fn evaluate(
        &self,
        snapshot: &ResourceSnapshot,
        request: &BookingRequest,
    ) -> Option<ValidationViolation> {
        let window = request.window?;
        for id in &request.resources {
            let state = snapshot.resource(id)?;
            if let Some(existing) = state.claims_overlapping(&window).next() {
                return Some(ValidationViolation::with_params(
                    self.id(),
                    format!("resource {} is already claimed during {}", id, window),
                    json!({
                        "resource": id.to_string(),
                        "window": window.to_string(),
                        "conflicting_claim": existing.booking.to_string(),
                    }),
                    Severity::Rejects,
                ));
            }
        }
        None
    }
}

/// Rejects when the actor already holds an overlapping claim on a
/// requested resource
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleBookingRule;

impl ValidationRule for DoubleBookingRule {
    fn id(&self) -> &'static str {
        "double_booking"
    }

    fn evaluate(
        &self,
        snapshot: &ResourceSnapshot,
        request: &BookingRequest,
    ) -> Option<ValidationViolation> {
        for id in &request.resources {
            let state = snapshot.resource(id)?;
            let held = state.claims.iter().find(|c| {
                c.claimant == request.actor
                    && match (&request.window, &c.window) {
                        (Some(requested), Some(existing)) => requested.overlaps(existing),
                        // Un-windowed claims collide with everything.
                        _ => true,
                    }
            });
            if let Some(existing) = held {
                return Some(ValidationViolation::with_params(
                    self.id(),
                    format!("actor already holds a claim on resource {}", id),
                    json!({
                        "resource": id.to_string(),
                        "existing_claim": existing.booking.to_string(),
                    }),
                    Severity::Rejects,
                ));
            }
        }
        None
    }
}

/// Rejects when the actor is not eligible to book
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityRule;

impl ValidationRule for EligibilityRule {
    fn id(&self) -> &'static str {
        "eligibility"
    }

    fn evaluate(
        &self,
        snapshot: &ResourceSnapshot,
        request: &BookingRequest,
    ) -> Option<ValidationViolation> {
        if snapshot.actor.eligible {
            return None;
        }
        Some(ValidationViolation::with_params(
            self.id(),
            "actor is not eligible to book",
            json!({ "actor": request.actor.to_string() }),
            Severity::Rejects,
        ))
    }
}

/// Rejects when the actor's accumulated quantity would exceed a budget
#[derive(Debug, Clone, Copy)]
pub struct QuantityBudgetRule {
    /// Maximum units an actor may hold across all claims
    pub max_cumulative: u32,
}

impl ValidationRule for QuantityBudgetRule {
    fn id(&self) -> &'static str {
        "quantity_budget"
    }

    fn evaluate(
        &self,
        snapshot: &ResourceSnapshot,
        request: &BookingRequest,
    ) -> Option<ValidationViolation> {
        let projected = snapshot
            .actor
            .cumulative_quantity
            .saturating_add(request.claimed_quantity());
        if projected <= self.max_cumulative {
            return None;
        }
        Some(ValidationViolation::with_params(
            self.id(),
            format!(
                "quantity budget exceeded: {} held + {} requested > {}",
                snapshot.actor.cumulative_quantity,
                request.claimed_quantity(),
                self.max_cumulative
            ),
            json!({
                "held": snapshot.actor.cumulative_quantity,
                "requested": request.claimed_quantity(),
                "budget": self.max_cumulative,
            }),
            Severity::Rejects,
        ))
    }
}

/// Rejects requests whose sub-entity records contain duplicate ids
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateSubEntityRule;

impl ValidationRule for DuplicateSubEntityRule {
    fn id(&self) -> &'static str {
        "duplicate_sub_entity"
    }

    fn evaluate(
        &self,
        _snapshot: &ResourceSnapshot,
        request: &BookingRequest,
    ) -> Option<ValidationViolation> {
        let mut seen = HashSet::new();
        for entity in &request.sub_entities {
            if !seen.insert(entity.id.as_str()) {
                return Some(ValidationViolation::with_params(
                    self.id(),
                    format!("duplicate sub-entity '{}'", entity.id),
                    json!({ "id": entity.id }),
                    Severity::Rejects,
                ));
            }
        }
        None
    }
}

/// Rejects requests with no sub-entity records
///
/// For domains where the children are the point (an order with no lines is
/// meaningless). Empty collections are otherwise valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiresSubEntitiesRule;

impl ValidationRule for RequiresSubEntitiesRule {
    fn id(&self) -> &'static str {
        "requires_sub_entities"
    }

    fn evaluate(
        &self,
        _snapshot: &ResourceSnapshot,
        request: &BookingRequest,
    ) -> Option<ValidationViolation> {
        if !request.sub_entities.is_empty() {
            return None;
        }
        Some(ValidationViolation::new(
            self.id(),
            "request must carry at least one sub-entity",
            Severity::Rejects,
        ))
    }
}

/// Warns when a booking would leave little headroom on a resource
#[derive(Debug, Clone, Copy)]
pub struct NearCapacityRule {
    /// Warn when remaining units after this booking would be at or below
    /// this threshold
    pub headroom: u32,
}

impl ValidationRule for NearCapacityRule {
    fn id(&self) -> &'static str {
        "near_capacity"
    }

    fn evaluate(
        &self,
        snapshot: &ResourceSnapshot,
        request: &BookingRequest,
    ) -> Option<ValidationViolation> {
        let requested = request.claimed_quantity();
        for id in &request.resources {
            let state = snapshot.resource(id)?;
            let remaining = state.available().saturating_sub(requested);
            if state.available() >= requested && remaining <= self.headroom {
                return Some(ValidationViolation::with_params(
                    self.id(),
                    format!("resource {} will have {} units left", id, remaining),
                    json!({
                        "resource": id.to_string(),
                        "remaining": remaining,
                    }),
                    Severity::Warns,
                ));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use reserva_core::{
        ActorId, ActorProfile, BookingId, ClaimRecord, ResourceId, ResourceState, TimeRange,
    };
    use std::collections::BTreeMap;

    fn window(h1: u32, h2: u32) -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2024, 6, 1, h1, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, h2, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn snapshot_with(
        resource: ResourceId,
        state: ResourceState,
        actor: ActorProfile,
    ) -> ResourceSnapshot {
        let mut resources = BTreeMap::new();
        resources.insert(resource, state);
        ResourceSnapshot {
            captured_at: Utc::now(),
            resources,
            actor,
        }
    }

    fn ok_actor() -> ActorProfile {
        ActorProfile {
            eligible: true,
            cumulative_quantity: 0,
        }
    }

    #[test]
    fn test_capacity_rejects_full_resource() {
        let resource = ResourceId::new();
        let snap = snapshot_with(
            resource,
            ResourceState {
                capacity: 10,
                in_use: 10,
                version: 1,
                claims: vec![],
            },
            ok_actor(),
        );
        let request = BookingRequest::new(ActorId::new(), vec![resource]).unwrap();

        let violation = CapacityRule.evaluate(&snap, &request).unwrap();
        assert_eq!(violation.rule, "capacity");
        assert!(violation.rejects());
        assert_eq!(violation.params["capacity"], 10);
    }

    #[test]
    fn test_capacity_passes_with_room() {
        let resource = ResourceId::new();
        let snap = snapshot_with(
            resource,
            ResourceState {
                capacity: 10,
                in_use: 9,
                version: 1,
                claims: vec![],
            },
            ok_actor(),
        );
        let request = BookingRequest::new(ActorId::new(), vec![resource]).unwrap();
        assert!(CapacityRule.evaluate(&snap, &request).is_none());
    }

    #[test]
    fn test_overlap_rejects_contended_window() {
        let resource = ResourceId::new();
        let snap = snapshot_with(
            resource,
            ResourceState {
                capacity: 1,
                in_use: 0,
                version: 1,
                claims: vec![ClaimRecord {
                    booking: BookingId::new(),
                    claimant: ActorId::new(),
                    window: Some(window(9, 11)),
                    quantity: 1,
                }],
            },
            ok_actor(),
        );
        let request = BookingRequest::new(ActorId::new(), vec![resource])
            .unwrap()
            .with_window(window(10, 12));

        let violation = OverlapRule.evaluate(&snap, &request).unwrap();
        assert_eq!(violation.rule, "overlap");
    }

    #[test]
    fn test_overlap_ignores_adjacent_window() {
        let resource = ResourceId::new();
        let snap = snapshot_with(
            resource,
            ResourceState {
                capacity: 1,
                in_use: 0,
                version: 1,
                claims: vec![ClaimRecord {
                    booking: BookingId::new(),
                    claimant: ActorId::new(),
                    window: Some(window(9, 10)),
                    quantity: 1,
                }],
            },
            ok_actor(),
        );
        let request = BookingRequest::new(ActorId::new(), vec![resource])
            .unwrap()
            .with_window(window(10, 11));
        assert!(OverlapRule.evaluate(&snap, &request).is_none());
    }

    #[test]
    fn test_double_booking_matches_actor_only() {
        let resource = ResourceId::new();
        let actor = ActorId::new();
        let snap = snapshot_with(
            resource,
            ResourceState {
                capacity: 10,
                in_use: 1,
                version: 1,
                claims: vec![ClaimRecord {
                    booking: BookingId::new(),
                    claimant: actor,
                    window: None,
                    quantity: 1,
                }],
            },
            ok_actor(),
        );

        let same_actor = BookingRequest::new(actor, vec![resource]).unwrap();
        assert!(DoubleBookingRule.evaluate(&snap, &same_actor).is_some());

        let other_actor = BookingRequest::new(ActorId::new(), vec![resource]).unwrap();
        assert!(DoubleBookingRule.evaluate(&snap, &other_actor).is_none());
    }

    #[test]
    fn test_eligibility_rejects_ineligible_actor() {
        let resource = ResourceId::new();
        let snap = snapshot_with(
            resource,
            ResourceState {
                capacity: 10,
                in_use: 0,
                version: 1,
                claims: vec![],
            },
            ActorProfile {
                eligible: false,
                cumulative_quantity: 0,
            },
        );
        let request = BookingRequest::new(ActorId::new(), vec![resource]).unwrap();
        assert_eq!(
            EligibilityRule.evaluate(&snap, &request).unwrap().rule,
            "eligibility"
        );
    }

    #[test]
    fn test_quantity_budget_counts_held_units() {
        let resource = ResourceId::new();
        let snap = snapshot_with(
            resource,
            ResourceState {
                capacity: 100,
                in_use: 0,
                version: 1,
                claims: vec![],
            },
            ActorProfile {
                eligible: true,
                cumulative_quantity: 4,
            },
        );
        let rule = QuantityBudgetRule { max_cumulative: 5 };

        let within = BookingRequest::new(ActorId::new(), vec![resource]).unwrap();
        assert!(rule.evaluate(&snap, &within).is_none());

        let over = BookingRequest::new(ActorId::new(), vec![resource])
            .unwrap()
            .with_quantity(2);
        assert_eq!(rule.evaluate(&snap, &over).unwrap().rule, "quantity_budget");
    }

    #[test]
    fn test_duplicate_sub_entities_rejected() {
        let resource = ResourceId::new();
        let snap = snapshot_with(
            resource,
            ResourceState {
                capacity: 10,
                in_use: 0,
                version: 1,
                claims: vec![],
            },
            ok_actor(),
        );
        let request = BookingRequest::new(ActorId::new(), vec![resource])
            .unwrap()
            .with_sub_entities(vec![
                reserva_core::SubEntity::new("p1"),
                reserva_core::SubEntity::new("p1"),
            ]);
        assert!(DuplicateSubEntityRule.evaluate(&snap, &request).is_some());
    }

    #[test]
    fn test_empty_sub_entities_valid_by_default() {
        let resource = ResourceId::new();
        let snap = snapshot_with(
            resource,
            ResourceState {
                capacity: 10,
                in_use: 0,
                version: 1,
                claims: vec![],
            },
            ok_actor(),
        );
        let request = BookingRequest::new(ActorId::new(), vec![resource]).unwrap();
        assert!(DuplicateSubEntityRule.evaluate(&snap, &request).is_none());
        assert!(RequiresSubEntitiesRule.evaluate(&snap, &request).is_some());
    }

    #[test]
    fn test_near_capacity_warns_without_blocking() {
        let resource = ResourceId::new();
        let snap = snapshot_with(
            resource,
            ResourceState {
                capacity: 10,
                in_use: 8,
                version: 1,
                claims: vec![],
            },
            ok_actor(),
        );
        let request = BookingRequest::new(ActorId::new(), vec![resource]).unwrap();
        let violation = NearCapacityRule { headroom: 2 }.evaluate(&snap, &request).unwrap();
        assert!(!violation.rejects());
        assert_eq!(violation.rule, "near_capacity");
    }
}
