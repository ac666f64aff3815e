//! Blob preloading seam.
//!
//! Every item accepted into the queue has its image fetched eagerly so
//! display is instant when the item reaches the head. Preloading is
//! best-effort: failures are logged and the UI falls back to a normal
//! fetch at display time.

use async_trait::async_trait;

/// Fetches an image blob into whatever cache the UI reads from.
#[async_trait]
pub trait BlobPreloader: Send + Sync {
    async fn preload(&self, storage_path: &str);
}

/// Preloader that does nothing. Used in tests and headless runs.
pub struct NoopPreloader;

#[async_trait]
impl BlobPreloader for NoopPreloader {
    async fn preload(&self, _storage_path: &str) {}
}
