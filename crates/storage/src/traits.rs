//! Transactional store traits
//!
//! The coordinator is written against these traits, never against a
//! concrete engine. A production deployment implements them over its
//! database; the test suites use [`MemStore`](crate::mem::MemStore).

use reserva_core::{ActorId, BookingId, ResourceId, ResourceSnapshot, StorageResult, TimeRange};
use reserva_concurrency::IsolationGuarantee;

/// Input for inserting a new claim row
#[derive(Debug, Clone)]
pub struct NewClaim {
    /// Resource the claim is against
    pub resource: ResourceId,
    /// Holder of the claim
    pub claimant: ActorId,
    /// Window the claim covers, if windowed
    pub window: Option<TimeRange>,
    /// Units the claim consumes
    pub quantity: u32,
}

/// One attempt's transaction handle
///
/// All writes are buffered until [`commit`](Self::commit); a dropped or
/// rolled-back transaction leaves no trace. Leaf mutators validate their
/// inputs eagerly (missing resource, usage underflow) so a failing step is
/// detected at step time, and the commit re-validates under the commit lock
/// against the then-current state.
///
/// `commit` and `rollback` take `Box<Self>` by value: a borrowed
/// transaction (what rules and steps receive) cannot end its own lifetime.
pub trait StoreTransaction: Send {
    /// The guarantee this transaction was opened with
    fn isolation(&self) -> IsolationGuarantee;

    /// Capture the read-only view for validation
    ///
    /// Records the read set under the transaction's isolation guarantee;
    /// under `RepeatableRead` and above, commit fails with a serialization
    /// conflict if any captured row changed underneath the attempt.
    fn snapshot(
        &mut self,
        resources: &[ResourceId],
        actor: &ActorId,
    ) -> StorageResult<ResourceSnapshot>;

    /// Buffer a claim insert; returns the generated claim identifier
    fn insert_claim(&mut self, claim: NewClaim) -> StorageResult<BookingId>;

    /// Buffer a usage-counter adjustment (positive to consume, negative to
    /// release)
    fn update_usage(&mut self, resource: ResourceId, delta: i64) -> StorageResult<()>;

    /// Buffer a child-row insert referencing a claim created earlier in
    /// this transaction (or already committed)
    fn insert_child_row(
        &mut self,
        booking: BookingId,
        child_id: &str,
        attributes: serde_json::Value,
    ) -> StorageResult<()>;

    /// Buffer deletion of a committed claim and its child rows
    fn delete_claim(&mut self, booking: BookingId) -> StorageResult<()>;

    /// Validate and apply all buffered writes atomically
    ///
    /// Returns the commit version. On error the transaction is gone and
    /// nothing was applied.
    fn commit(self: Box<Self>) -> StorageResult<u64>;

    /// Discard all buffered writes
    fn rollback(self: Box<Self>);
}

/// Factory for transactions
pub trait TransactionalStore: Send + Sync {
    /// Begin a transaction under the given guarantee
    fn begin(&self, isolation: IsolationGuarantee) -> StorageResult<Box<dyn StoreTransaction>>;
}
