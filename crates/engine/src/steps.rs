//! Stock mutation steps
//!
//! The three writes every booking flow performs, expressed as reusable
//! steps: insert the claim rows, bump the usage counters, and fan the
//! request's sub-entities out into child rows. The child-row step depends
//! on the claim step's output, which is how the ordered-dependency contract
//! is exercised in practice.

use crate::mutation::{MutationStep, StepContext, OUTPUT_BOOKING_ID};
use reserva_core::{BookingId, BookingRequest, StorageError, StorageResult};
use reserva_storage::{NewClaim, StoreTransaction};
use serde_json::json;

/// Inserts one claim row per requested resource
///
/// Records the primary claim's id under [`OUTPUT_BOOKING_ID`] and the full
/// list under `"claim_ids"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertClaimStep;

impl MutationStep for InsertClaimStep {
    fn name(&self) -> &'static str {
        "insert_claim"
    }

    fn apply(
        &self,
        txn: &mut dyn StoreTransaction,
        request: &BookingRequest,
        ctx: &mut StepContext,
    ) -> StorageResult<()> {
        let mut ids = Vec::with_capacity(request.resources.len());
        for resource in &request.resources {
            let booking = txn.insert_claim(NewClaim {
                resource: *resource,
                claimant: request.actor,
                window: request.window,
                quantity: request.claimed_quantity(),
            })?;
            ids.push(booking);
        }
        // Non-empty by request invariant.
        ctx.record(OUTPUT_BOOKING_ID, json!(ids[0].to_string()));
        ctx.record(
            "claim_ids",
            json!(ids.iter().map(|id| id.to_string()).collect::<Vec<_>>()),
        );
        Ok(())
    }
}

/// Consumes the claimed quantity from every requested resource's usage
/// counter
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumeCapacityStep;

impl MutationStep for ConsumeCapacityStep {
    fn name(&self) -> &'static str {
        "consume_capacity"
    }

    fn apply(
        &self,
        txn: &mut dyn StoreTransaction,
        request: &BookingRequest,
        _ctx: &mut StepContext,
    ) -> StorageResult<()> {
        for resource in &request.resources {
            txn.update_usage(*resource, i64::from(request.claimed_quantity()))?;
        }
        Ok(())
    }
}

/// Inserts one child row per sub-entity under the primary claim
///
/// Requires [`InsertClaimStep`]'s output; fails with an invalid-state error
/// if sequenced before it. Iterates the sub-entities in declaration order —
/// the per-row cursor loop of the source pattern, as plain iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertChildRowsStep;

impl MutationStep for InsertChildRowsStep {
    fn name(&self) -> &'static str {
        "insert_child_rows"
    }

    fn apply(
        &self,
        txn: &mut dyn StoreTransaction,
        request: &BookingRequest,
        ctx: &mut StepContext,
    ) -> StorageResult<()> {
        let booking = parse_booking_id(ctx.require(OUTPUT_BOOKING_ID)?)?;
        for entity in &request.sub_entities {
            txn.insert_child_row(booking, &entity.id, entity.attributes.clone())?;
        }
        Ok(())
    }
}

fn parse_booking_id(value: &serde_json::Value) -> StorageResult<BookingId> {
    let text = value.as_str().ok_or_else(|| {
        StorageError::InvalidState("booking id output is not a string".to_string())
    })?;
    let raw = uuid::Uuid::parse_str(text).map_err(|e| {
        StorageError::InvalidState(format!("malformed booking id '{}': {}", text, e))
    })?;
    Ok(BookingId::from_bytes(*raw.as_bytes()))
}
