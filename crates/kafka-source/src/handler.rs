use std::future::Future;
use std::pin::Pin;

use kafka_types::Message;

/// Future returned by a [`Handler`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// Per-record callback invoked by the dispatcher.
///
/// Implemented for any `Fn(Message) -> impl Future<Output = anyhow::Result<()>>`.
/// Both an `Err` return and a panic count as a failed record; neither stops
/// the receive loop.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, message: Message) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn handle(&self, message: Message) -> HandlerFuture {
        Box::pin(self(message))
    }
}
