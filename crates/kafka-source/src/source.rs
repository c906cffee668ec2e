use async_trait::async_trait;
use kafka_types::Message;
use tokio::sync::{mpsc, Mutex};

use crate::error::Result;

/// Where the dispatcher pulls records from.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Wait for the next record.
    ///
    /// `Ok(None)` means the source is exhausted and the receive loop should
    /// stop. A Kafka consumer never returns it.
    async fn recv(&self) -> Result<Option<Message>>;
}

/// In-process record source fed through a channel.
///
/// Records (and receive errors) pushed into the sender are yielded in order.
/// The source is exhausted once every sender is dropped.
pub struct ChannelSource {
    rx: Mutex<mpsc::Receiver<Result<Message>>>,
}

impl ChannelSource {
    pub fn new(capacity: usize) -> (mpsc::Sender<Result<Message>>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx: Mutex::new(rx) })
    }
}

#[async_trait]
impl RecordSource for ChannelSource {
    async fn recv(&self) -> Result<Option<Message>> {
        match self.rx.lock().await.recv().await {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}
