//! Repository for the `memes` table (the shared work-item pool).
//!
//! Claiming is the one operation in the system that needs true mutual
//! exclusion, and it is done entirely here: a single `UPDATE … WHERE id IN
//! (SELECT … FOR UPDATE SKIP LOCKED)` statement selects and marks rows in
//! one atomic step, so no two concurrent claimers can receive the same row.

use sqlx::PgPool;

use memelab_core::types::{AnnotatorId, DbId};

use crate::models::meme::{CreateMeme, Meme};

/// Column list for `memes` queries.
const COLUMNS: &str = "\
    id, file_name, storage_path, source_folder, annotation_count, \
    is_active, reserved_by, reserved_at, created_at, updated_at";

/// Upper bound on a single claim batch, regardless of caller request.
const MAX_BATCH_SIZE: i64 = 50;

/// Provides CRUD and claim operations for the work-item pool.
pub struct MemeRepo;

impl MemeRepo {
    /// Insert a freshly uploaded meme. New rows start unannotated, active,
    /// and unreserved.
    pub async fn insert(pool: &PgPool, input: &CreateMeme) -> Result<Meme, sqlx::Error> {
        let query = format!(
            "INSERT INTO memes (file_name, storage_path, source_folder) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Meme>(&query)
            .bind(&input.file_name)
            .bind(&input.storage_path)
            .bind(&input.source_folder)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim up to `batch_size` claimable memes for one annotator.
    ///
    /// A meme is claimable when it is active, has no final annotation yet,
    /// and is not live-reserved by someone else. "Live-reserved" excludes:
    /// - reservations older than `staleness_secs` (abandoned claims are
    ///   reclaimed by time, never by client signal);
    /// - the caller's own reservations, so an annotator whose earlier claim
    ///   call failed mid-flight is served the same rows on retry.
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` so concurrent claimers never block on
    /// or receive each other's rows. Rows are returned oldest-first and the
    /// batch may be smaller than requested, or empty.
    pub async fn claim_batch(
        pool: &PgPool,
        annotator_id: AnnotatorId,
        batch_size: u32,
        staleness_secs: u64,
    ) -> Result<Vec<Meme>, sqlx::Error> {
        let limit = i64::from(batch_size).clamp(0, MAX_BATCH_SIZE);
        let query = format!(
            "UPDATE memes \
             SET reserved_by = $1, reserved_at = NOW(), updated_at = NOW() \
             WHERE id IN ( \
                 SELECT id FROM memes \
                 WHERE is_active \
                   AND annotation_count = 0 \
                   AND ( \
                       reserved_by IS NULL \
                       OR reserved_by = $1 \
                       OR reserved_at < NOW() - ($3 * INTERVAL '1 second') \
                   ) \
                 ORDER BY created_at ASC \
                 LIMIT $2 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Meme>(&query)
            .bind(annotator_id)
            .bind(limit)
            .bind(staleness_secs as i64)
            .fetch_all(pool)
            .await
    }

    /// Clear the reservation on one meme unconditionally.
    ///
    /// Idempotent: releasing an unreserved or already-completed meme
    /// matches zero rows and is not an error.
    pub async fn release_reservation(pool: &PgPool, meme_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE memes \
             SET reserved_by = NULL, reserved_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND reserved_by IS NOT NULL",
        )
        .bind(meme_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Activate or deactivate a meme (admin-side lifecycle; inactive memes
    /// are never claimed). Returns `false` if the meme does not exist.
    pub async fn set_active(
        pool: &PgPool,
        meme_id: DbId,
        is_active: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE memes SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(meme_id)
        .bind(is_active)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a meme by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Meme>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM memes WHERE id = $1");
        sqlx::query_as::<_, Meme>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
