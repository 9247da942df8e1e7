//! In-memory transactional store
//!
//! [`MemStore`] backs the test suites and serves as the reference
//! implementation of the storage seam. Writes are buffered per transaction
//! and applied under a commit serialization lock; conflicts are detected
//! optimistically at commit time according to the transaction's isolation
//! guarantee:
//!
//! - `ReadCommitted`: no commit-time read validation (only committed state
//!   is ever visible, so dirty reads cannot happen by construction)
//! - `RepeatableRead`: resource rows read by the attempt must be unchanged
//!   at commit
//! - `Serializable`: additionally, no claim may have been added to or
//!   removed from a read resource since capture (phantom protection for
//!   capacity and overlap predicates)
//! - `SnapshotVersioned`: first-committer-wins validation over the rows the
//!   transaction writes
//!
//! The commit lock prevents the TOCTOU race between validation and apply:
//! without it a second writer could commit between this transaction's
//! validation and its apply, invalidating the checks it just passed.

use crate::traits::{NewClaim, StoreTransaction, TransactionalStore};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use reserva_concurrency::IsolationGuarantee;
use reserva_core::{
    ActorId, ActorProfile, BookingId, ClaimRecord, ResourceId, ResourceSnapshot, ResourceState,
    StorageError, StorageResult,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct ResourceRow {
    capacity: u32,
    in_use: u32,
    /// Bumped when the row's own counters change
    version: u64,
    /// Bumped when a claim against this resource is inserted or deleted
    claim_epoch: u64,
}

#[derive(Debug, Clone)]
struct ClaimRow {
    resource: ResourceId,
    claimant: ActorId,
    window: Option<reserva_core::TimeRange>,
    quantity: u32,
}

#[derive(Debug, Clone)]
struct ChildRow {
    child_id: String,
    attributes: serde_json::Value,
}

#[derive(Debug, Clone)]
struct ActorRow {
    eligible: bool,
    cumulative_quantity: u32,
}

#[derive(Debug, Default)]
struct Tables {
    resources: BTreeMap<ResourceId, ResourceRow>,
    claims: BTreeMap<BookingId, ClaimRow>,
    children: BTreeMap<BookingId, Vec<ChildRow>>,
    actors: BTreeMap<ActorId, ActorRow>,
}

#[derive(Debug)]
struct Shared {
    tables: RwLock<Tables>,
    /// Global commit version counter; gaps are allowed on failed commits
    version: AtomicU64,
    /// Serializes validate-then-apply across committers
    commit_lock: Mutex<()>,
}

/// In-memory transactional store
///
/// Cheap to clone; all clones share the same tables.
#[derive(Debug, Clone)]
pub struct MemStore {
    shared: Arc<Shared>,
}

impl MemStore {
    /// Create an empty store
    pub fn new() -> Self {
        MemStore {
            shared: Arc::new(Shared {
                tables: RwLock::new(Tables::default()),
                version: AtomicU64::new(0),
                commit_lock: Mutex::new(()),
            }),
        }
    }

    /// Current global commit version
    pub fn current_version(&self) -> u64 {
        self.shared.version.load(Ordering::SeqCst)
    }

    /// Register a resource with the given capacity; returns its id
    pub fn register_resource(&self, capacity: u32) -> ResourceId {
        let id = ResourceId::new();
        self.shared.tables.write().resources.insert(
            id,
            ResourceRow {
                capacity,
                in_use: 0,
                version: 0,
                claim_epoch: 0,
            },
        );
        id
    }

    /// Register an actor with explicit standing; returns their id
    pub fn register_actor(&self, eligible: bool, cumulative_quantity: u32) -> ActorId {
        let id = ActorId::new();
        self.shared.tables.write().actors.insert(
            id,
            ActorRow {
                eligible,
                cumulative_quantity,
            },
        );
        id
    }

    /// Force a resource's usage counter, for test setup
    pub fn set_usage(&self, resource: ResourceId, in_use: u32) {
        let mut tables = self.shared.tables.write();
        if let Some(row) = tables.resources.get_mut(&resource) {
            row.in_use = in_use;
            row.version += 1;
        }
    }

    /// Probe: a resource's current usage counter
    pub fn usage(&self, resource: &ResourceId) -> Option<u32> {
        self.shared.tables.read().resources.get(resource).map(|r| r.in_use)
    }

    /// Probe: number of committed claims against a resource
    pub fn claim_count(&self, resource: &ResourceId) -> usize {
        self.shared
            .tables
            .read()
            .claims
            .values()
            .filter(|c| c.resource == *resource)
            .count()
    }

    /// Probe: whether a committed claim exists
    pub fn has_claim(&self, booking: &BookingId) -> bool {
        self.shared.tables.read().claims.contains_key(booking)
    }

    /// Probe: child rows recorded under a claim, in insertion order
    pub fn child_rows(&self, booking: &BookingId) -> Vec<(String, serde_json::Value)> {
        self.shared
            .tables
            .read()
            .children
            .get(booking)
            .map(|rows| {
                rows.iter()
                    .map(|r| (r.child_id.clone(), r.attributes.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Probe: an actor's accumulated quantity
    pub fn actor_cumulative(&self, actor: &ActorId) -> u32 {
        self.shared
            .tables
            .read()
            .actors
            .get(actor)
            .map(|a| a.cumulative_quantity)
            .unwrap_or(0)
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionalStore for MemStore {
    fn begin(&self, isolation: IsolationGuarantee) -> StorageResult<Box<dyn StoreTransaction>> {
        tracing::debug!(%isolation, "beginning transaction");
        Ok(Box::new(MemTxn {
            shared: Arc::clone(&self.shared),
            isolation,
            reads: BTreeMap::new(),
            writes: Vec::new(),
            buffered_claims: BTreeSet::new(),
        }))
    }
}

/// Versions of a resource row at capture time
#[derive(Debug, Clone, Copy)]
struct ReadMark {
    version: u64,
    claim_epoch: u64,
}

#[derive(Debug)]
enum BufferedWrite {
    InsertClaim { booking: BookingId, claim: NewClaim },
    UpdateUsage { resource: ResourceId, delta: i64 },
    InsertChild {
        booking: BookingId,
        child_id: String,
        attributes: serde_json::Value,
    },
    DeleteClaim { booking: BookingId },
}

struct MemTxn {
    shared: Arc<Shared>,
    isolation: IsolationGuarantee,
    reads: BTreeMap<ResourceId, ReadMark>,
    writes: Vec<BufferedWrite>,
    buffered_claims: BTreeSet<BookingId>,
}

impl MemTxn {
    /// Resources this transaction writes, for SnapshotVersioned validation
    fn written_resources(&self, tables: &Tables) -> BTreeSet<ResourceId> {
        let mut out = BTreeSet::new();
        for write in &self.writes {
            match write {
                BufferedWrite::InsertClaim { claim, .. } => {
                    out.insert(claim.resource);
                }
                BufferedWrite::UpdateUsage { resource, .. } => {
                    out.insert(*resource);
                }
                BufferedWrite::DeleteClaim { booking } => {
                    if let Some(row) = tables.claims.get(booking) {
                        out.insert(row.resource);
                    }
                }
                BufferedWrite::InsertChild { .. } => {}
            }
        }
        out
    }

    /// Conflict validation per the transaction's isolation guarantee.
    /// Runs under the commit lock, before any table is touched.
    fn validate(&self, tables: &Tables) -> StorageResult<()> {
        if self.isolation.validates_reads() {
            for (id, mark) in &self.reads {
                let row = tables.resources.get(id).ok_or_else(|| {
                    StorageError::Serialization(format!("resource {} deleted under transaction", id))
                })?;
                if row.version != mark.version {
                    return Err(StorageError::Serialization(format!(
                        "resource {} changed under transaction (read v{}, now v{})",
                        id, mark.version, row.version
                    )));
                }
                if self.isolation.protects_ranges() && row.claim_epoch != mark.claim_epoch {
                    return Err(StorageError::Serialization(format!(
                        "phantom claim on resource {} (read epoch {}, now {})",
                        id, mark.claim_epoch, row.claim_epoch
                    )));
                }
            }
        }

        if self.isolation.validates_writes() {
            for id in self.written_resources(tables) {
                let Some(mark) = self.reads.get(&id) else {
                    continue;
                };
                let row = tables.resources.get(&id).ok_or_else(|| {
                    StorageError::Serialization(format!("resource {} deleted under transaction", id))
                })?;
                if row.version != mark.version || row.claim_epoch != mark.claim_epoch {
                    return Err(StorageError::Serialization(format!(
                        "first committer wins: resource {} modified since snapshot",
                        id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Integrity dry run over the buffered writes.
    ///
    /// Every check that could fail must happen here, before apply: apply
    /// itself is infallible so a half-applied commit cannot exist.
    fn check_integrity(&self, tables: &Tables) -> StorageResult<()> {
        let mut projected_usage: BTreeMap<ResourceId, i64> = BTreeMap::new();
        let mut inserted: BTreeSet<BookingId> = BTreeSet::new();
        let mut deleted: BTreeSet<BookingId> = BTreeSet::new();

        for write in &self.writes {
            match write {
                BufferedWrite::InsertClaim { booking, claim } => {
                    if !tables.resources.contains_key(&claim.resource) {
                        return Err(StorageError::NotFound(format!(
                            "resource {}",
                            claim.resource
                        )));
                    }
                    if tables.claims.contains_key(booking) || !inserted.insert(*booking) {
                        return Err(StorageError::ConstraintViolation(format!(
                            "duplicate claim id {}",
                            booking
                        )));
                    }
                }
                BufferedWrite::UpdateUsage { resource, delta } => {
                    let row = tables.resources.get(resource).ok_or_else(|| {
                        StorageError::NotFound(format!("resource {}", resource))
                    })?;
                    let projected = projected_usage
                        .entry(*resource)
                        .or_insert(i64::from(row.in_use));
                    *projected += delta;
                    if *projected < 0 {
                        return Err(StorageError::ConstraintViolation(format!(
                            "usage underflow on resource {}",
                            resource
                        )));
                    }
                }
                BufferedWrite::InsertChild { booking, .. } => {
                    let exists = tables.claims.contains_key(booking)
                        || (inserted.contains(booking) && !deleted.contains(booking));
                    if !exists {
                        return Err(StorageError::ConstraintViolation(format!(
                            "child row references unknown claim {}",
                            booking
                        )));
                    }
                }
                BufferedWrite::DeleteClaim { booking } => {
                    if !tables.claims.contains_key(booking) || !deleted.insert(*booking) {
                        return Err(StorageError::NotFound(format!("claim {}", booking)));
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply the buffered writes. Must be preceded by `check_integrity`;
    /// nothing in here can fail.
    fn apply(&mut self, tables: &mut Tables) {
        let writes = std::mem::take(&mut self.writes);
        for write in writes {
            match write {
                BufferedWrite::InsertClaim { booking, claim } => {
                    if let Some(row) = tables.resources.get_mut(&claim.resource) {
                        row.claim_epoch += 1;
                    }
                    let actor = tables.actors.entry(claim.claimant).or_insert(ActorRow {
                        eligible: true,
                        cumulative_quantity: 0,
                    });
                    actor.cumulative_quantity =
                        actor.cumulative_quantity.saturating_add(claim.quantity);
                    tables.claims.insert(
                        booking,
                        ClaimRow {
                            resource: claim.resource,
                            claimant: claim.claimant,
                            window: claim.window,
                            quantity: claim.quantity,
                        },
                    );
                }
                BufferedWrite::UpdateUsage { resource, delta } => {
                    if let Some(row) = tables.resources.get_mut(&resource) {
                        row.in_use = (i64::from(row.in_use) + delta).max(0) as u32;
                        row.version += 1;
                    }
                }
                BufferedWrite::InsertChild {
                    booking,
                    child_id,
                    attributes,
                } => {
                    tables.children.entry(booking).or_default().push(ChildRow {
                        child_id,
                        attributes,
                    });
                }
                BufferedWrite::DeleteClaim { booking } => {
                    if let Some(claim) = tables.claims.remove(&booking) {
                        if let Some(row) = tables.resources.get_mut(&claim.resource) {
                            row.claim_epoch += 1;
                        }
                        if let Some(actor) = tables.actors.get_mut(&claim.claimant) {
                            actor.cumulative_quantity =
                                actor.cumulative_quantity.saturating_sub(claim.quantity);
                        }
                        tables.children.remove(&booking);
                    }
                }
            }
        }
    }
}

impl StoreTransaction for MemTxn {
    fn isolation(&self) -> IsolationGuarantee {
        self.isolation
    }

    fn snapshot(
        &mut self,
        resources: &[ResourceId],
        actor: &ActorId,
    ) -> StorageResult<ResourceSnapshot> {
        let tables = self.shared.tables.read();
        let mut states = BTreeMap::new();

        for id in resources {
            let row = tables
                .resources
                .get(id)
                .ok_or_else(|| StorageError::NotFound(format!("resource {}", id)))?;

            self.reads.entry(*id).or_insert(ReadMark {
                version: row.version,
                claim_epoch: row.claim_epoch,
            });

            let claims = tables
                .claims
                .iter()
                .filter(|(_, c)| c.resource == *id)
                .map(|(booking, c)| ClaimRecord {
                    booking: *booking,
                    claimant: c.claimant,
                    window: c.window,
                    quantity: c.quantity,
                })
                .collect();

            states.insert(
                *id,
                ResourceState {
                    capacity: row.capacity,
                    in_use: row.in_use,
                    version: row.version,
                    claims,
                },
            );
        }

        // Unknown actors have no standing recorded against them; domains
        // that gate on eligibility register their actors up front.
        let profile = tables
            .actors
            .get(actor)
            .map(|a| ActorProfile {
                eligible: a.eligible,
                cumulative_quantity: a.cumulative_quantity,
            })
            .unwrap_or(ActorProfile {
                eligible: true,
                cumulative_quantity: 0,
            });

        Ok(ResourceSnapshot {
            captured_at: Utc::now(),
            resources: states,
            actor: profile,
        })
    }

    fn insert_claim(&mut self, claim: NewClaim) -> StorageResult<BookingId> {
        {
            let tables = self.shared.tables.read();
            if !tables.resources.contains_key(&claim.resource) {
                return Err(StorageError::NotFound(format!("resource {}", claim.resource)));
            }
        }
        let booking = BookingId::new();
        self.buffered_claims.insert(booking);
        self.writes.push(BufferedWrite::InsertClaim { booking, claim });
        Ok(booking)
    }

    fn update_usage(&mut self, resource: ResourceId, delta: i64) -> StorageResult<()> {
        let current = {
            let tables = self.shared.tables.read();
            let row = tables
                .resources
                .get(&resource)
                .ok_or_else(|| StorageError::NotFound(format!("resource {}", resource)))?;
            i64::from(row.in_use)
        };
        let buffered: i64 = self
            .writes
            .iter()
            .filter_map(|w| match w {
                BufferedWrite::UpdateUsage { resource: r, delta } if *r == resource => Some(*delta),
                _ => None,
            })
            .sum();
        if current + buffered + delta < 0 {
            return Err(StorageError::ConstraintViolation(format!(
                "usage underflow on resource {}",
                resource
            )));
        }
        self.writes.push(BufferedWrite::UpdateUsage { resource, delta });
        Ok(())
    }

    fn insert_child_row(
        &mut self,
        booking: BookingId,
        child_id: &str,
        attributes: serde_json::Value,
    ) -> StorageResult<()> {
        if !self.buffered_claims.contains(&booking)
            && !self.shared.tables.read().claims.contains_key(&booking)
        {
            return Err(StorageError::ConstraintViolation(format!(
                "child row references unknown claim {}",
                booking
            )));
        }
        self.writes.push(BufferedWrite::InsertChild {
            booking,
            child_id: child_id.to_string(),
            attributes,
        });
        Ok(())
    }

    fn delete_claim(&mut self, booking: BookingId) -> StorageResult<()> {
        if !self.shared.tables.read().claims.contains_key(&booking) {
            return Err(StorageError::NotFound(format!("claim {}", booking)));
        }
        self.writes.push(BufferedWrite::DeleteClaim { booking });
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> StorageResult<u64> {
        let shared = Arc::clone(&self.shared);
        let _commit_guard = shared.commit_lock.lock();
        let mut tables = shared.tables.write();

        if let Err(e) = self.validate(&tables) {
            tracing::warn!(isolation = %self.isolation, error = %e, "commit validation failed");
            return Err(e);
        }
        self.check_integrity(&tables)?;

        let commit_version = shared.version.fetch_add(1, Ordering::SeqCst) + 1;
        self.apply(&mut tables);

        tracing::debug!(commit_version, "transaction committed");
        Ok(commit_version)
    }

    fn rollback(self: Box<Self>) {
        tracing::debug!(writes = self.writes.len(), "transaction rolled back");
    }
}
