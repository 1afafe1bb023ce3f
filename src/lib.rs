//! Threadline - a streaming conversation runtime for chat clients
//!
//! This library exposes modules for use in integration tests and by
//! front-ends that render the published snapshots.

pub mod accumulator;
pub mod adapters;
pub mod attachments;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod render;
pub mod session;
pub mod sse;
pub mod traits;

pub use config::RuntimeConfig;
pub use error::{RuntimeError, RuntimeResult};
pub use session::{RunHandle, SessionRuntime, Snapshot};
