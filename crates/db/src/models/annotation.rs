//! Annotation entity models and DTOs.

use memelab_core::types::{AnnotatorId, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `annotations` table.
///
/// `status` holds one of the `AnnotationStatus` strings; it is kept as
/// text here so partial rows from joins deserialize without a lookup.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Annotation {
    pub id: DbId,
    pub meme_id: DbId,
    pub user_id: AnnotatorId,
    pub caption: String,
    pub status: String,
    pub feedback: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Query parameters for listing pending annotations (moderation queue).
#[derive(Debug, Default, Deserialize)]
pub struct AnnotationListQuery {
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
