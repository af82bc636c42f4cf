//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! Distributes each [`Event`] to all subscribers **without awaiting** their
//! processing: `emit` pushes an `Arc<Event>` into one bounded queue per
//! subscriber; a dedicated worker drains each queue.
//!
//! ## Guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and logged (isolation).
//!
//! ## Non-guarantees
//! - No global ordering across different subscribers.
//! - No retries on queue overflow; events are dropped for that subscriber.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::events::Event;

use super::Subscribe;

/// Per-subscriber bounded queue with metadata.
struct SubscriberChannel {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Workers exit when the set is dropped (their senders close).
    #[must_use]
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subscribers.len());
        for subscriber in subscribers {
            let name = subscriber.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(subscriber.queue_capacity().max(1));

            tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let handled = std::panic::AssertUnwindSafe(subscriber.on_event(&ev))
                        .catch_unwind()
                        .await;
                    if handled.is_err() {
                        tracing::error!(subscriber = name, "subscriber panicked while handling event");
                    }
                }
            });

            channels.push(SubscriberChannel { name, tx });
        }
        Self { channels }
    }

    /// Hands one event to every subscriber queue (fire-and-forget).
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.tx.try_send(shared.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = channel.name, "subscriber queue full; dropping event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
    }

    /// Number of attached subscribers.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True if no subscribers are attached.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
