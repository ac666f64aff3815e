use memelab_core::store::StoreError;

/// Errors surfaced by the annotator session to its UI collaborator.
///
/// Always returned as values, never panicked across the session/UI
/// boundary. `Validation` and `SubmitInFlight` are recovered locally and
/// never reach the store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Local precondition failure (empty/too-long caption). No store call
    /// was made; the typed caption is untouched.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// There is no current item to act on.
    #[error("No work item is currently assigned")]
    NoCurrentItem,

    /// A submission is already in flight for this session.
    #[error("A submission is already in flight")]
    SubmitInFlight,

    /// The session's credentials were rejected; the caller should
    /// re-authenticate. No retry loop.
    #[error("Session unauthorized: {0}")]
    Unauthorized(String),

    /// Transient store failure; safe to retry. Submit failures with this
    /// error leave the queue and the typed caption in place.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unauthorized(msg) => Self::Unauthorized(msg),
            other => Self::Store(other),
        }
    }
}

/// Successful resolutions of a submit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The caption was persisted as pending; the queue advanced and the
    /// session counter was incremented.
    Saved,
    /// Another annotator completed the item first. Not a user error: the
    /// queue was fully refreshed, the counter was not incremented, and the
    /// UI should show a low-alarm "someone else got there first" notice.
    Raced,
}
