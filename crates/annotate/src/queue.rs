//! The lookahead queue: an ordered buffer of claimed-but-unshown items.
//!
//! Pure state container; all store I/O is orchestrated by the session.
//! Items are shown in the order the store returned them, with no
//! reordering or priority logic. The caught-up flag is re-derived on
//! every enqueue, so a refill landing after the queue drained to empty
//! flips the session back out of the caught-up state.

use std::collections::VecDeque;

use memelab_core::store::ClaimedItem;

/// FIFO buffer of claimed work items for one annotator session.
#[derive(Debug)]
pub struct LookaheadQueue {
    entries: VecDeque<ClaimedItem>,
    low_water_mark: usize,
    /// Single-flight guard: true while a claim call is outstanding.
    filling: bool,
    /// True once a fill produced nothing enqueueable while the queue was
    /// empty. Cleared by any successful enqueue.
    caught_up: bool,
}

impl LookaheadQueue {
    pub fn new(low_water_mark: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            low_water_mark,
            filling: false,
            caught_up: false,
        }
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_filling(&self) -> bool {
        self.filling
    }

    pub fn is_caught_up(&self) -> bool {
        self.caught_up
    }

    /// Read-only access to the current item.
    pub fn peek_head(&self) -> Option<&ClaimedItem> {
        self.entries.front()
    }

    /// Remove and return the current item. Refill triggering is the
    /// caller's job via [`needs_refill`](Self::needs_refill).
    pub fn pop_head(&mut self) -> Option<ClaimedItem> {
        self.entries.pop_front()
    }

    /// True when the queue has drained to the low-water mark and no fill
    /// is outstanding. A caught-up queue never asks for a refill; an
    /// explicit refresh clears that state first.
    pub fn needs_refill(&self) -> bool {
        self.entries.len() <= self.low_water_mark && !self.filling && !self.caught_up
    }

    /// Claim the single fill slot. Returns `false` when a fill is already
    /// outstanding, making a concurrent second fill a no-op.
    pub fn begin_fill(&mut self) -> bool {
        if self.filling {
            return false;
        }
        self.filling = true;
        true
    }

    /// Release the fill slot. Must be called on every fill completion
    /// path, success or failure, so a failed refill cannot wedge the
    /// queue into never refilling again.
    pub fn finish_fill(&mut self) {
        self.filling = false;
    }

    /// Append a claim batch in store order, returning the entries that
    /// were actually accepted.
    ///
    /// Two filters apply, at initial fill and at every background refill:
    /// - items whose observed annotation_count is nonzero are dropped
    ///   (stale read defense);
    /// - items already buffered are dropped by id (a refill racing a
    ///   previous one could otherwise duplicate an entry).
    ///
    /// Accepting at least one entry clears the caught-up flag. Accepting
    /// none while the queue is empty sets it; a raw batch that filtered
    /// to nothing counts as exhausted, not as a reason to refetch.
    pub fn enqueue_batch(&mut self, batch: Vec<ClaimedItem>) -> Vec<ClaimedItem> {
        let mut accepted = Vec::new();
        for item in batch {
            if item.annotation_count != 0 {
                continue;
            }
            if self.entries.iter().any(|e| e.id == item.id) {
                continue;
            }
            self.entries.push_back(item.clone());
            accepted.push(item);
        }

        if accepted.is_empty() {
            if self.entries.is_empty() {
                self.caught_up = true;
            }
        } else {
            self.caught_up = false;
        }

        accepted
    }

    /// Drain every buffered entry and reset the caught-up flag.
    ///
    /// Used when a submit races: the raced head proves the claim snapshot
    /// was stale, so the rest of the batch is suspect too. Returned
    /// entries still hold reservations the caller should release.
    pub fn drain_for_refresh(&mut self) -> Vec<ClaimedItem> {
        self.caught_up = false;
        self.entries.drain(..).collect()
    }

    /// Clear the caught-up flag so the next fill attempt runs. Used by
    /// explicit UI-driven refreshes.
    pub fn reset_caught_up(&mut self) {
        self.caught_up = false;
    }
}
