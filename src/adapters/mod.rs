//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`HttpEventSource`] - run events over HTTP + SSE using reqwest
//! - [`HttpThreadStore`] - thread store over the REST endpoints
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::ScriptedEventSource`] - scripted run events
//! - [`mock::InMemoryThreadStore`] - in-memory persistence

pub mod error;
pub mod http_event_source;
pub mod http_store;
pub mod mock;

pub use error::HttpAdapterError;
pub use http_event_source::{sse_events, HttpEventSource};
pub use http_store::HttpThreadStore;
pub use mock::{InMemoryThreadStore, RunScript, ScriptedEventSource, StoreCall};
