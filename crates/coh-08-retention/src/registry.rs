//! Explicit process-wide stores.
//!
//! All three registries are owned by the host and passed to the retention
//! service; nothing here is a global. Mutation happens only through
//! receipt-ingest calls, which the host serializes (one writer); readers
//! may be concurrent, hence `parking_lot::RwLock` inside.

use std::collections::HashMap;

use parking_lot::RwLock;
use shared_types::Digest;

use crate::domain::finalize::FinalizeReceipt;
use crate::domain::slab::{DisputeInfo, SlabRecord};

/// All registered slabs, keyed by slab chain hash.
#[derive(Default)]
pub struct SlabStore {
    slabs: RwLock<HashMap<Digest, SlabRecord>>,
}

impl SlabStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a slab record.
    pub fn insert(&self, record: SlabRecord) {
        self.slabs.write().insert(record.slab_chain_hash, record);
    }

    /// Snapshot of one slab record.
    pub fn get(&self, slab: &Digest) -> Option<SlabRecord> {
        self.slabs.read().get(slab).cloned()
    }

    /// Apply a mutation to one slab record, if present. Returns the
    /// closure's result, or `None` when the slab is unknown.
    pub fn with_mut<T>(
        &self,
        slab: &Digest,
        f: impl FnOnce(&mut SlabRecord) -> T,
    ) -> Option<T> {
        self.slabs.write().get_mut(slab).map(f)
    }

    /// Snapshot of every slab record.
    pub fn all(&self) -> Vec<SlabRecord> {
        self.slabs.read().values().cloned().collect()
    }

    /// All slabs eligible for deletion.
    pub fn deletable(&self) -> Vec<SlabRecord> {
        self.slabs.read().values().filter(|s| s.can_delete()).cloned().collect()
    }

    /// Number of registered slabs.
    pub fn len(&self) -> usize {
        self.slabs.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.slabs.read().is_empty()
    }
}

/// Accepted disputes, keyed by slab chain hash.
#[derive(Default)]
pub struct DisputeRegistry {
    disputes: RwLock<HashMap<Digest, DisputeInfo>>,
}

impl DisputeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dispute.
    pub fn register(&self, slab: Digest, info: DisputeInfo) {
        self.disputes.write().insert(slab, info);
    }

    /// Whether a slab is disputed.
    pub fn is_disputed(&self, slab: &Digest) -> bool {
        self.disputes.read().contains_key(slab)
    }

    /// Dispute details for a slab.
    pub fn get(&self, slab: &Digest) -> Option<DisputeInfo> {
        self.disputes.read().get(slab).cloned()
    }
}

/// Verified finalize receipts, keyed by slab chain hash.
#[derive(Default)]
pub struct FinalizedRegistry {
    finalized: RwLock<HashMap<Digest, FinalizeReceipt>>,
}

impl FinalizedRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a verified finalize receipt.
    pub fn register(&self, slab: Digest, receipt: FinalizeReceipt) {
        self.finalized.write().insert(slab, receipt);
    }

    /// Whether a slab is finalized.
    pub fn is_finalized(&self, slab: &Digest) -> bool {
        self.finalized.read().contains_key(slab)
    }

    /// The finalize receipt for a slab.
    pub fn get(&self, slab: &Digest) -> Option<FinalizeReceipt> {
        self.finalized.read().get(slab).cloned()
    }
}
