//! Property Tests
//!
//! proptest suites over the coordinator's contracts: validation
//! determinism, short-circuit ordering, and exact retry accounting.

mod common;

use common::*;
use chrono::Utc;
use proptest::prelude::*;
use reserva::prelude::*;
use reserva::{ActorProfile, Error, ResourceSnapshot, ResourceState};
use std::collections::BTreeMap;
use std::sync::Arc;

fn snapshot_with(capacity: u32, in_use: u32, resource: ResourceId) -> ResourceSnapshot {
    let mut resources = BTreeMap::new();
    resources.insert(
        resource,
        ResourceState {
            capacity,
            in_use,
            version: 1,
            claims: vec![],
        },
    );
    ResourceSnapshot {
        captured_at: Utc::now(),
        resources,
        actor: ActorProfile {
            eligible: true,
            cumulative_quantity: 0,
        },
    }
}

proptest! {
    /// Re-evaluating the same pipeline against the same (snapshot,
    /// request) pair always yields the same outcome and the same first
    /// violated rule.
    #[test]
    fn validation_is_deterministic(
        capacity in 0u32..50,
        in_use in 0u32..60,
        quantity in 1u32..5,
        budget in 1u32..10,
    ) {
        let resource = ResourceId::new();
        let snapshot = snapshot_with(capacity, in_use, resource);
        let request = BookingRequest::new(ActorId::new(), vec![resource])
            .unwrap()
            .with_quantity(quantity);
        let pipeline = ValidationPipeline::new(vec![
            Box::new(CapacityRule),
            Box::new(QuantityBudgetRule { max_cumulative: budget }),
        ]);

        let first = pipeline.evaluate(&snapshot, &request);
        for _ in 0..5 {
            let again = pipeline.evaluate(&snapshot, &request);
            match (first.rejection(), again.rejection()) {
                (None, None) => {}
                (Some(a), Some(b)) => prop_assert_eq!(a.rule, b.rule),
                _ => prop_assert!(false, "verdict flipped between evaluations"),
            }
        }

        // And the verdict matches the arithmetic.
        let fits = capacity.saturating_sub(in_use) >= quantity;
        let within_budget = quantity <= budget;
        match first.rejection() {
            None => prop_assert!(fits && within_budget),
            Some(v) if v.rule == "capacity" => prop_assert!(!fits),
            Some(v) => {
                prop_assert_eq!(v.rule, "quantity_budget");
                // capacity is declared first, so it must have passed
                prop_assert!(fits && !within_budget);
            }
        }
    }

    /// With an always-conflicting step, `execute` performs exactly the
    /// configured number of attempts, then reports exhaustion with that
    /// count.
    #[test]
    fn retries_are_exactly_bounded(budget in 1u32..6) {
        let store = MemStore::new();
        let resource = store.register_resource(10);
        let actor = store.register_actor(true, 0);
        let reserva = Reserva::new(Arc::new(store.clone()));

        let attempts_seen = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let steps: Vec<Box<dyn MutationStep>> = vec![
            Box::new(CountingStep(Arc::clone(&attempts_seen))),
            Box::new(AlwaysDeadlockStep),
        ];
        let request = BookingRequest::new(actor, vec![resource]).unwrap();

        let err = reserva
            .execute(
                &request,
                &ValidationPipeline::empty(),
                &steps,
                &fast_options(IsolationGuarantee::Serializable, budget),
            )
            .unwrap_err();

        match err {
            Error::ConflictExhausted { attempts } => prop_assert_eq!(attempts, budget),
            other => prop_assert!(false, "expected exhaustion, got {:?}", other),
        }
        prop_assert_eq!(
            attempts_seen.load(std::sync::atomic::Ordering::SeqCst),
            budget
        );
        prop_assert_eq!(store.claim_count(&resource), 0);
    }

    /// Whichever rejecting rule is declared first is the one reported,
    /// regardless of how many rejecting rules follow it.
    #[test]
    fn first_declared_rejection_wins(extra_rules in 0usize..4) {
        let resource = ResourceId::new();
        // capacity 0 makes CapacityRule reject; the budget rules after it
        // would also reject but must never be reached.
        let snapshot = snapshot_with(0, 0, resource);
        let request = BookingRequest::new(ActorId::new(), vec![resource]).unwrap();

        let mut rules: Vec<Box<dyn ValidationRule>> = vec![Box::new(CapacityRule)];
        for _ in 0..extra_rules {
            rules.push(Box::new(QuantityBudgetRule { max_cumulative: 0 }));
        }
        let pipeline = ValidationPipeline::new(rules);

        let verdict = pipeline.evaluate(&snapshot, &request);
        prop_assert_eq!(verdict.rejection().unwrap().rule, "capacity");
    }
}
