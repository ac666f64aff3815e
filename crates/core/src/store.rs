//! The work-item store contract.
//!
//! The store owns all cross-session mutual exclusion: claiming and final
//! submission are single atomic operations on its side, and the client
//! never reads-then-writes across a round trip where correctness depends
//! on atomicity. This trait is implemented by `memelab-db` over Postgres
//! and by in-memory mocks in the session tests.

use async_trait::async_trait;
use serde::Serialize;

use crate::types::{AnnotatorId, DbId};

/// Snapshot of a work item as observed at claim time.
///
/// Owned by one session's lookahead queue; never shared across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimedItem {
    pub id: DbId,
    /// Opaque reference to the image blob.
    pub storage_path: String,
    /// Annotation count as observed at claim time. A nonzero value means
    /// the read was stale and the item must not be shown.
    pub annotation_count: i32,
    /// Source group label the item was ingested under.
    pub source_folder: String,
}

/// Errors surfaced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The item was completed by another annotator between claim and
    /// submit. An expected outcome of correct concurrent operation, not
    /// a bug; callers pattern-match on this variant.
    #[error("Item already has a final annotation")]
    AlreadyAnnotated,

    /// The session's credentials were rejected. Fatal to the session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Transient transport or database failure. Safe to retry.
    #[error("Store unavailable: {0}")]
    Transport(String),
}

/// Atomic operations the assignment client requires from the store.
///
/// Implementations must guarantee:
/// - `claim_batch` marks returned rows reserved in the same atomic step
///   that selects them, so no two concurrent callers receive the same row;
/// - `submit_final` re-checks completion server-side and reports the race
///   as [`StoreError::AlreadyAnnotated`];
/// - `release_reservation` is idempotent.
#[async_trait]
pub trait WorkItemStore: Send + Sync {
    /// Atomically claim up to `batch_size` claimable items for one
    /// annotator. May return fewer than requested, or none when the pool
    /// is exhausted.
    async fn claim_batch(
        &self,
        annotator_id: AnnotatorId,
        batch_size: u32,
    ) -> Result<Vec<ClaimedItem>, StoreError>;

    /// Clear the reservation on one item. Releasing an item that is not
    /// reserved, or already completed, is a no-op.
    async fn release_reservation(&self, item_id: DbId) -> Result<(), StoreError>;

    /// Persist the final annotation for an item, clearing its reservation
    /// and removing it from the claimable pool.
    async fn submit_final(
        &self,
        item_id: DbId,
        annotator_id: AnnotatorId,
        caption: &str,
    ) -> Result<(), StoreError>;

    /// Total completed annotations for one annotator, used once at session
    /// start to seed the session counter.
    async fn history_count(&self, annotator_id: AnnotatorId) -> Result<u64, StoreError>;
}
