//! Event source trait abstraction.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::events::RunEvent;
use crate::models::StreamRequest;

/// Stream of one run's events, in production order.
///
/// The stream ends after a terminal event. If it ends (or yields an error)
/// before one, the run terminated without completion.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<RunEvent, TransportError>> + Send>>;

/// Trait for opening a run's event stream.
///
/// Implementations must stop producing events promptly once `cancel` fires;
/// events already in flight may still be delivered and are discarded by the
/// runtime.
///
/// # Example
///
/// ```ignore
/// use threadline::traits::EventSource;
///
/// async fn first_event<S: EventSource>(source: &S, request: &StreamRequest) {
///     let mut stream = source.open(request, CancellationToken::new()).await?;
///     let event = stream.next().await;
/// }
/// ```
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Submit `request` and return its event stream.
    async fn open(
        &self,
        request: &StreamRequest,
        cancel: CancellationToken,
    ) -> Result<EventStream, TransportError>;
}
