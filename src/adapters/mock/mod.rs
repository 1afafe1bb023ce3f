//! Mock implementations for testing.
//!
//! Test doubles for the trait abstractions, usable without network access.
//!
//! # Available Mocks
//!
//! - [`ScriptedEventSource`] - replays queued run scripts
//! - [`InMemoryThreadStore`] - thread store with call recording and delays

pub mod event_source;
pub mod store;

pub use event_source::{RunScript, ScriptedEventSource};
pub use store::{InMemoryThreadStore, StoreCall};
