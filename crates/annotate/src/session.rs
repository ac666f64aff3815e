//! The annotator session: assignment client, submission pipeline, and
//! session counter for one annotator's tab.
//!
//! Concurrency model: all cross-session exclusivity is delegated to the
//! store's atomic claim/submit operations. Within one session the only
//! coordination needed is a pair of single-flight guards (one fill, one
//! submission outstanding at a time); state sits behind one mutex that is
//! never held across a store call.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use memelab_core::caption::{sanitize_caption, validate_caption};
use memelab_core::error::CoreError;
use memelab_core::store::{ClaimedItem, StoreError, WorkItemStore};
use memelab_core::types::{AnnotatorId, DbId};

use crate::config::SessionConfig;
use crate::error::{SessionError, SubmitOutcome};
use crate::preload::BlobPreloader;
use crate::queue::LookaheadQueue;

/// Point-in-time view of the session for the UI collaborator.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionView {
    /// The item currently on display, if any.
    pub head: Option<ClaimedItem>,
    /// True when the pool is exhausted for this annotator.
    pub caught_up: bool,
    /// True while a fill is running and there is nothing to show yet.
    pub loading: bool,
    /// True while a submission is in flight (UI disables the submit
    /// action to prevent duplicate submissions of the same caption).
    pub submitting: bool,
    /// Buffered item count, exposed for diagnostics and tests.
    pub queue_depth: usize,
    /// Items completed by this annotator, seeded from their historical
    /// total at session start. Informational only.
    pub session_count: u64,
}

struct SessionState {
    queue: LookaheadQueue,
    session_count: u64,
    submitting: bool,
}

/// One annotator's session over a shared work-item store.
///
/// Cheaply cloneable; clones share the same state and guards, so spawned
/// background refills observe the same single-flight flags.
#[derive(Clone)]
pub struct AnnotatorSession {
    annotator_id: AnnotatorId,
    store: Arc<dyn WorkItemStore>,
    preloader: Arc<dyn BlobPreloader>,
    config: SessionConfig,
    state: Arc<Mutex<SessionState>>,
}

impl AnnotatorSession {
    pub fn new(
        store: Arc<dyn WorkItemStore>,
        preloader: Arc<dyn BlobPreloader>,
        annotator_id: AnnotatorId,
        config: SessionConfig,
    ) -> Self {
        let queue = LookaheadQueue::new(config.low_water_mark);
        Self {
            annotator_id,
            store,
            preloader,
            config,
            state: Arc::new(Mutex::new(SessionState {
                queue,
                session_count: 0,
                submitting: false,
            })),
        }
    }

    /// Seed the session counter from the annotator's historical total and
    /// run the initial foreground fill.
    pub async fn start(&self) -> Result<(), SessionError> {
        let history = self.store.history_count(self.annotator_id).await?;
        {
            let mut state = self.state.lock().await;
            state.session_count = history;
        }
        self.ensure_filled().await
    }

    /// Fill the queue if no fill is already outstanding. A concurrent
    /// second call is a no-op returning `Ok`.
    pub async fn ensure_filled(&self) -> Result<(), SessionError> {
        {
            let mut state = self.state.lock().await;
            if !state.queue.begin_fill() {
                return Ok(());
            }
        }
        self.run_fill().await
    }

    /// Explicit UI-driven refresh: clears the caught-up state so the pool
    /// is probed again even after a previous fill came up empty.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        {
            let mut state = self.state.lock().await;
            state.queue.reset_caught_up();
        }
        self.ensure_filled().await
    }

    /// Read-only access to the current item.
    pub async fn peek_head(&self) -> Option<ClaimedItem> {
        self.state.lock().await.queue.peek_head().cloned()
    }

    /// Snapshot of everything the UI renders from.
    pub async fn snapshot(&self) -> SessionView {
        let state = self.state.lock().await;
        SessionView {
            head: state.queue.peek_head().cloned(),
            caught_up: state.queue.is_caught_up(),
            loading: state.queue.is_filling() && state.queue.is_empty(),
            submitting: state.submitting,
            queue_depth: state.queue.depth(),
            session_count: state.session_count,
        }
    }

    /// Validate and submit a caption for the current item.
    ///
    /// Validation failures and the in-flight guard fail fast without a
    /// store call. On success the queue advances and the counter
    /// increments. On the already-annotated race the whole buffer is
    /// refreshed (the raced entry proves the claim snapshot was stale) and
    /// `Ok(Raced)` is returned even if the follow-up refill fails. The
    /// caller shows a low-alarm notice, not an error. On any other store
    /// failure the queue and the typed caption are left untouched for
    /// retry.
    pub async fn submit(&self, caption: &str) -> Result<SubmitOutcome, SessionError> {
        validate_caption(caption).map_err(|e| match e {
            CoreError::Validation(msg) => SessionError::Validation(msg),
            other => SessionError::Validation(other.to_string()),
        })?;
        let sanitized = sanitize_caption(caption);

        let item_id = {
            let mut state = self.state.lock().await;
            if state.submitting {
                return Err(SessionError::SubmitInFlight);
            }
            let head = state.queue.peek_head().ok_or(SessionError::NoCurrentItem)?;
            let id = head.id;
            state.submitting = true;
            id
        };

        let result = self
            .store
            .submit_final(item_id, self.annotator_id, &sanitized)
            .await;

        match result {
            Ok(()) => {
                let spawn_refill = {
                    let mut state = self.state.lock().await;
                    state.submitting = false;
                    state.queue.pop_head();
                    state.session_count += 1;
                    state.queue.needs_refill() && state.queue.begin_fill()
                };
                if spawn_refill {
                    self.spawn_background_fill();
                }
                Ok(SubmitOutcome::Saved)
            }
            Err(StoreError::AlreadyAnnotated) => {
                debug!(item_id, "submission raced; refreshing queue");
                let drained = {
                    let mut state = self.state.lock().await;
                    state.submitting = false;
                    state.queue.drain_for_refresh()
                };
                for entry in drained {
                    self.spawn_release(entry.id);
                }
                // The race already classified this submit; a refill failure
                // must not mask it. The queue is left empty and not
                // caught-up, so refresh() or the next consume retries.
                if let Err(e) = self.ensure_filled().await {
                    warn!(error = %e, "refill after raced submission failed");
                }
                Ok(SubmitOutcome::Raced)
            }
            Err(e) => {
                let mut state = self.state.lock().await;
                state.submitting = false;
                Err(e.into())
            }
        }
    }

    /// Skip the current item: advance the queue by exactly one and release
    /// the reservation best-effort.
    ///
    /// The release is fire-and-forget: a failure is logged, never
    /// surfaced, because the reservation self-heals via the store's
    /// staleness reclamation. Returns the skipped item's id, or `None`
    /// when there was nothing to skip.
    pub async fn skip(&self) -> Option<DbId> {
        let (skipped, spawn_refill) = {
            let mut state = self.state.lock().await;
            let skipped = state.queue.pop_head();
            let spawn_refill = skipped.is_some()
                && state.queue.needs_refill()
                && state.queue.begin_fill();
            (skipped, spawn_refill)
        };

        let skipped_id = skipped.map(|entry| entry.id);
        if let Some(id) = skipped_id {
            self.spawn_release(id);
        }
        if spawn_refill {
            self.spawn_background_fill();
        }
        skipped_id
    }

    /// Run one fill. The caller must already hold the fill slot
    /// (`begin_fill` returned true); the slot is released on every path.
    async fn run_fill(&self) -> Result<(), SessionError> {
        let result = self
            .store
            .claim_batch(self.annotator_id, self.config.batch_size)
            .await;

        let mut state = self.state.lock().await;
        state.queue.finish_fill();
        match result {
            Ok(batch) => {
                let accepted = state.queue.enqueue_batch(batch);
                drop(state);
                for entry in &accepted {
                    let preloader = Arc::clone(&self.preloader);
                    let path = entry.storage_path.clone();
                    tokio::spawn(async move {
                        preloader.preload(&path).await;
                    });
                }
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Spawn a background refill. The fill slot must already be held;
    /// failures are logged and the next consume retriggers.
    fn spawn_background_fill(&self) {
        let session = self.clone();
        tokio::spawn(async move {
            if let Err(e) = session.run_fill().await {
                warn!(error = %e, "background refill failed");
            }
        });
    }

    /// Spawn a fire-and-forget reservation release.
    fn spawn_release(&self, item_id: DbId) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.release_reservation(item_id).await {
                warn!(item_id, error = %e, "release_reservation failed; staleness reclamation will recover the item");
            }
        });
    }
}
