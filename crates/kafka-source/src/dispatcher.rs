//! Receive loop that hands each record to the handler in its own task.
//!
//! For every record the dispatcher:
//!
//! 1. waits for a free handler slot when `max_in_flight` is non-zero, before
//!    reading the record from the source,
//! 2. spawns a task that runs the decode step (if a decoder is set) and then
//!    the handler,
//! 3. catches panics and errors inside that task and logs them.
//!
//! Receive errors are logged and polling continues immediately. The loop ends
//! when the cancellation token fires or the source is exhausted; it then waits
//! for the tasks still running.
//!
//! ## Panic handling
//! Record tasks use `catch_unwind` with `AssertUnwindSafe`. A handler that
//! panics while holding a lock on shared state may leave that state
//! inconsistent for later records.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use kafka_types::Message;
use kafkalib_schema_registry::{AvroDecoder, DecodeError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::handler::Handler;
use crate::source::RecordSource;

/// Record counts observed by one run of the receive loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Records pulled from the source
    pub received: u64,
    /// Errors returned by the source
    pub receive_errors: u64,
    /// Records the handler completed successfully
    pub handled: u64,
    /// Records dropped because schema lookup or Avro decoding failed
    pub decode_failures: u64,
    /// Records whose handler returned an error or panicked
    pub handler_failures: u64,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    receive_errors: AtomicU64,
    handled: AtomicU64,
    decode_failures: AtomicU64,
    handler_failures: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            received: self.received.load(Ordering::SeqCst),
            receive_errors: self.receive_errors.load(Ordering::SeqCst),
            handled: self.handled.load(Ordering::SeqCst),
            decode_failures: self.decode_failures.load(Ordering::SeqCst),
            handler_failures: self.handler_failures.load(Ordering::SeqCst),
        }
    }
}

enum Failure {
    Decode(DecodeError),
    Handler(anyhow::Error),
}

pub struct Dispatcher<S: RecordSource> {
    source: S,
    handler: Arc<dyn Handler>,
    decoder: Option<AvroDecoder>,
    max_in_flight: usize,
    tracker: TaskTracker,
    counters: Arc<Counters>,
}

impl<S: RecordSource> Dispatcher<S> {
    pub fn new<H: Handler>(source: S, handler: H) -> Self {
        Self {
            source,
            handler: Arc::new(handler),
            decoder: None,
            max_in_flight: crate::config::DEFAULT_MAX_IN_FLIGHT,
            tracker: TaskTracker::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Decode registry-framed payloads before they reach the handler.
    pub fn with_decoder(mut self, decoder: AvroDecoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Bound the number of concurrently running handlers; 0 means unbounded.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Run the receive loop until `token` is cancelled or the source ends.
    ///
    /// Returns once every spawned record task has finished.
    pub async fn run(self, token: CancellationToken) -> DispatchStats {
        let semaphore = self.build_semaphore();
        info!(
            "Listening for messages (max in flight: {})",
            match self.max_in_flight {
                0 => "unbounded".to_string(),
                n => n.to_string(),
            }
        );

        loop {
            // Take a handler slot before pulling a record, so cancellation
            // never leaves a received record unprocessed.
            let permit = match &semaphore {
                Some(semaphore) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        info!("Dispatcher cancelled while waiting for a handler slot");
                        break;
                    }
                    permit = Arc::clone(semaphore).acquire_owned() => match permit {
                        Ok(permit) => Some(permit),
                        Err(_) => break,
                    },
                },
                None => None,
            };

            let received = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!("Dispatcher cancelled, no longer polling");
                    break;
                }
                received = self.source.recv() => received,
            };

            let message = match received {
                Ok(Some(message)) => message,
                Ok(None) => {
                    info!("Record source exhausted");
                    break;
                }
                Err(e) => {
                    // The client recovers from broker errors on its own.
                    self.counters.receive_errors.fetch_add(1, Ordering::SeqCst);
                    error!("Consumer error: {e}");
                    continue;
                }
            };

            self.counters.received.fetch_add(1, Ordering::SeqCst);
            debug!(
                "New message received from {}/{}@{}",
                message.topic, message.partition, message.offset
            );

            self.spawn_isolated(message, permit);
        }

        self.tracker.close();
        if !self.tracker.is_empty() {
            info!("Waiting for {} in-flight messages", self.tracker.len());
        }
        self.tracker.wait().await;

        let stats = self.counters.snapshot();
        info!("Dispatcher stopped: {stats:?}");
        stats
    }

    fn build_semaphore(&self) -> Option<Arc<Semaphore>> {
        match self.max_in_flight {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        }
    }

    fn spawn_isolated(&self, message: Message, permit: Option<OwnedSemaphorePermit>) {
        let handler = Arc::clone(&self.handler);
        let decoder = self.decoder.clone();
        let counters = Arc::clone(&self.counters);
        let location = format!(
            "{}/{}@{}",
            message.topic, message.partition, message.offset
        );

        self.tracker.spawn(async move {
            let _permit = permit;
            let outcome = AssertUnwindSafe(process(message, decoder, handler))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => {
                    counters.handled.fetch_add(1, Ordering::SeqCst);
                }
                Ok(Err(Failure::Decode(e))) => {
                    counters.decode_failures.fetch_add(1, Ordering::SeqCst);
                    error!("Dropping message at {location}: {e}");
                }
                Ok(Err(Failure::Handler(e))) => {
                    counters.handler_failures.fetch_add(1, Ordering::SeqCst);
                    error!("Handler failed for message at {location}: {e:#}");
                }
                Err(panic) => {
                    counters.handler_failures.fetch_add(1, Ordering::SeqCst);
                    error!(
                        "Panic occurred while processing message at {location}: {}",
                        panic_message(panic.as_ref())
                    );
                }
            }
        });
    }
}

async fn process(
    message: Message,
    decoder: Option<AvroDecoder>,
    handler: Arc<dyn Handler>,
) -> Result<(), Failure> {
    let message = match decoder {
        Some(decoder) => decoder.decode(message).await.map_err(Failure::Decode)?,
        None => message,
    };

    debug!("Calling handler with kafka message");
    handler.handle(message).await.map_err(Failure::Handler)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
