//! Trait abstractions for the runtime's external collaborators.
//!
//! The runtime never talks to a transport or a database directly; it is
//! handed implementations of these traits, which keeps it testable with the
//! in-memory doubles in [`crate::adapters::mock`].
//!
//! # Traits
//!
//! - [`EventSource`] - opens the event stream for one run
//! - [`ThreadStore`] - persistence gateway for threads and messages

pub mod event_source;
pub mod store;

pub use event_source::{EventSource, EventStream};
pub use store::ThreadStore;
