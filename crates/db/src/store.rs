//! Postgres-backed implementation of the work-item store contract.
//!
//! Thin adapter: each trait method is one repository call plus error
//! classification. The atomicity guarantees live in the repository SQL.

use async_trait::async_trait;

use memelab_core::store::{ClaimedItem, StoreError, WorkItemStore};
use memelab_core::types::{AnnotatorId, DbId};

use crate::models::meme::Meme;
use crate::repositories::annotation_repo::SubmitResult;
use crate::repositories::{AnnotationRepo, MemeRepo};
use crate::DbPool;

/// Default reservation staleness threshold, in seconds. A claim older than
/// this is treated as abandoned and reclaimed by the next claimer.
pub const DEFAULT_STALENESS_SECS: u64 = 900;

/// Work-item store over a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
    staleness_secs: u64,
}

impl PgStore {
    pub fn new(pool: DbPool, staleness_secs: u64) -> Self {
        Self {
            pool,
            staleness_secs,
        }
    }

    /// Build with [`DEFAULT_STALENESS_SECS`], overridable via the
    /// `RESERVATION_STALENESS_SECS` environment variable.
    pub fn from_env(pool: DbPool) -> Self {
        let staleness_secs = std::env::var("RESERVATION_STALENESS_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_STALENESS_SECS);
        Self::new(pool, staleness_secs)
    }
}

#[async_trait]
impl WorkItemStore for PgStore {
    async fn claim_batch(
        &self,
        annotator_id: AnnotatorId,
        batch_size: u32,
    ) -> Result<Vec<ClaimedItem>, StoreError> {
        let rows = MemeRepo::claim_batch(&self.pool, annotator_id, batch_size, self.staleness_secs)
            .await
            .map_err(classify)?;
        tracing::debug!(
            %annotator_id,
            requested = batch_size,
            claimed = rows.len(),
            "claim batch"
        );
        Ok(rows.into_iter().map(to_claimed).collect())
    }

    async fn release_reservation(&self, item_id: DbId) -> Result<(), StoreError> {
        MemeRepo::release_reservation(&self.pool, item_id)
            .await
            .map_err(classify)
    }

    async fn submit_final(
        &self,
        item_id: DbId,
        annotator_id: AnnotatorId,
        caption: &str,
    ) -> Result<(), StoreError> {
        match AnnotationRepo::submit_final(&self.pool, item_id, annotator_id, caption)
            .await
            .map_err(classify)?
        {
            SubmitResult::Saved(_) => Ok(()),
            SubmitResult::AlreadyAnnotated => Err(StoreError::AlreadyAnnotated),
        }
    }

    async fn history_count(&self, annotator_id: AnnotatorId) -> Result<u64, StoreError> {
        let count = AnnotationRepo::count_by_annotator(&self.pool, annotator_id)
            .await
            .map_err(classify)?;
        Ok(count.max(0) as u64)
    }
}

fn to_claimed(meme: Meme) -> ClaimedItem {
    ClaimedItem {
        id: meme.id,
        storage_path: meme.storage_path,
        annotation_count: meme.annotation_count,
        source_folder: meme.source_folder,
    }
}

/// Map sqlx failures onto the store error taxonomy.
///
/// Unique violations surface as the distinguished race error; everything
/// else is a transient transport failure from the session's perspective.
fn classify(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return StoreError::AlreadyAnnotated;
        }
    }
    StoreError::Transport(e.to_string())
}
