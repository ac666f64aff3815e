//! Repository for the `annotations` table.
//!
//! `submit_final` is the second correctness-critical atomic operation:
//! it re-checks completion server-side (compare-and-set on
//! `memes.annotation_count`) inside one transaction, because the client
//! cannot make that check reliably across a network round trip.

use sqlx::PgPool;

use memelab_core::types::{AnnotationStatus, AnnotatorId, DbId};

use crate::models::annotation::{Annotation, AnnotationListQuery};

/// Column list for `annotations` queries.
const COLUMNS: &str = "\
    id, meme_id, user_id, caption, status, feedback, created_at, updated_at";

/// Maximum page size for annotation listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for annotation listing.
const DEFAULT_LIMIT: i64 = 50;

/// Outcome of a final-submission attempt.
#[derive(Debug)]
pub enum SubmitResult {
    /// The annotation was persisted as pending and the meme left the pool.
    Saved(Annotation),
    /// Another annotator's submission landed first.
    AlreadyAnnotated,
}

/// Provides submission and moderation operations for annotations.
pub struct AnnotationRepo;

impl AnnotationRepo {
    /// Atomically persist the final annotation for a meme.
    ///
    /// In one transaction:
    /// 1. compare-and-set the meme out of the claimable pool
    ///    (`annotation_count = 0` guard) and clear its reservation;
    /// 2. insert the caption as a `pending` annotation.
    ///
    /// Zero rows affected by step 1 means another annotator completed the
    /// meme first; the transaction rolls back and the race is reported as
    /// [`SubmitResult::AlreadyAnnotated`]. The partial unique index on
    /// `annotations (meme_id) WHERE status <> 'rejected'` backs the same
    /// guarantee at the constraint level.
    pub async fn submit_final(
        pool: &PgPool,
        meme_id: DbId,
        annotator_id: AnnotatorId,
        caption: &str,
    ) -> Result<SubmitResult, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE memes \
             SET annotation_count = annotation_count + 1, \
                 reserved_by = NULL, reserved_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND annotation_count = 0",
        )
        .bind(meme_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(SubmitResult::AlreadyAnnotated);
        }

        let query = format!(
            "INSERT INTO annotations (meme_id, user_id, caption, status) \
             VALUES ($1, $2, $3, 'pending') \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Annotation>(&query)
            .bind(meme_id)
            .bind(annotator_id)
            .bind(caption)
            .fetch_one(&mut *tx)
            .await;

        match inserted {
            Ok(annotation) => {
                tx.commit().await?;
                Ok(SubmitResult::Saved(annotation))
            }
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                Ok(SubmitResult::AlreadyAnnotated)
            }
            Err(e) => Err(e),
        }
    }

    /// Total annotations ever submitted by one annotator. Seeds the
    /// session counter at session start.
    pub async fn count_by_annotator(
        pool: &PgPool,
        annotator_id: AnnotatorId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM annotations WHERE user_id = $1")
                .bind(annotator_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Update a caption. Only the owning annotator may edit, and only
    /// while the annotation is still pending. Returns `false` when no row
    /// matched (wrong owner, already moderated, or missing).
    pub async fn update_caption(
        pool: &PgPool,
        annotation_id: DbId,
        annotator_id: AnnotatorId,
        caption: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE annotations \
             SET caption = $3, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND status = 'pending'",
        )
        .bind(annotation_id)
        .bind(annotator_id)
        .bind(caption)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Moderation transition: pending -> approved | rejected, with an
    /// optional feedback note. Returns `false` when the annotation is
    /// missing or no longer pending.
    pub async fn review(
        pool: &PgPool,
        annotation_id: DbId,
        status: AnnotationStatus,
        feedback: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE annotations \
             SET status = $2, feedback = $3, updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(annotation_id)
        .bind(status.as_str())
        .bind(feedback)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List pending annotations oldest-first (the moderation queue).
    pub async fn list_pending(
        pool: &PgPool,
        params: &AnnotationListQuery,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);

        let query = format!(
            "SELECT {COLUMNS} FROM annotations \
             WHERE status = 'pending' \
             ORDER BY created_at ASC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}

/// True when the error is a Postgres unique-constraint violation (23505).
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}
