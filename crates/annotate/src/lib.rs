//! Annotator session engine: the work-item assignment and lifecycle core.
//!
//! One [`session::AnnotatorSession`] exists per active annotator session.
//! It keeps a lookahead queue of pre-claimed work items warm so the UI
//! never waits on the network between items, submits captions through the
//! store's atomic final-submit operation, and classifies the
//! already-annotated race as a normal outcome rather than an error.
//!
//! All cross-session exclusivity lives in the store (`WorkItemStore`
//! implementations); this crate never attempts distributed locking.

pub mod config;
pub mod error;
pub mod preload;
pub mod queue;
pub mod session;

pub use config::SessionConfig;
pub use error::{SessionError, SubmitOutcome};
pub use preload::{BlobPreloader, NoopPreloader};
pub use queue::LookaheadQueue;
pub use session::{AnnotatorSession, SessionView};
