//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod annotation_repo;
pub mod meme_repo;

pub use annotation_repo::AnnotationRepo;
pub use meme_repo::MemeRepo;
