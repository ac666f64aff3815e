//! Pure domain logic for the annotation platform.
//!
//! This crate has no internal dependencies and no I/O. It defines the
//! shared id/timestamp types, the error taxonomy, caption validation,
//! and the [`store::WorkItemStore`] contract that the persistence layer
//! implements and the session layer consumes.

pub mod caption;
pub mod error;
pub mod store;
pub mod types;
