//! Meme (work-item) entity models and DTOs.

use memelab_core::types::{AnnotatorId, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `memes` table.
///
/// A row with `reserved_by` set is in flight: the claim operation must not
/// hand it to a second annotator until the reservation goes stale.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Meme {
    pub id: DbId,
    pub file_name: String,
    pub storage_path: String,
    pub source_folder: String,
    pub annotation_count: i32,
    pub is_active: bool,
    pub reserved_by: Option<AnnotatorId>,
    pub reserved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a freshly uploaded meme.
///
/// New rows always start unannotated and active; the ingestion collaborator
/// has no say in reservation or count fields.
#[derive(Debug, Deserialize)]
pub struct CreateMeme {
    pub file_name: String,
    pub storage_path: String,
    pub source_folder: String,
}
