//! Broadcast coordinator: the single owner of the live subscriber set.
//!
//! The coordinator loop multiplexes two sources with crossbeam `select!`:
//! control requests (`Control::Register` / `Control::Unregister`) sent through
//! a `CoordinatorHandle`, and quote batches coming from the generator. Every
//! batch is serialized once and the same JSON text is offered to each live
//! subscriber under the configured `OverflowPolicy`.
//!
//! Guarantees:
//! - Mutation and iteration of the set happen on one thread only.
//! - A batch that fails to serialize is skipped for every subscriber.
//! - Batches reach each subscriber in the order they were received.
//! - Registering the same subscriber twice delivers every batch to it twice.
//! - A subscriber whose consumer is gone never stalls the loop, even under
//!   `OverflowPolicy::Block`.

use crate::model::subscriber::{Offer, OverflowPolicy, Subscriber, SubscriberId};
use crossbeam_channel::{Receiver, Sender, never, select, unbounded};
use log::{debug, error, info};
use quote_common::{QuoteError, Result};
use serde::Serialize;
use std::thread;

/// Requests accepted by the coordinator loop.
#[derive(Debug)]
pub enum Control {
    /// Append a subscriber to the live set.
    Register(Subscriber),
    /// Remove every entry with this id from the live set.
    Unregister(SubscriberId),
}

/// Outcome of broadcasting one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fanout {
    /// Entries whose queue accepted the message.
    pub delivered: usize,
    /// Entries whose queue was full and lost the message (`DropNewest`) or an
    /// older one (`DropOldest`), plus entries whose consumer is already gone.
    pub dropped: usize,
}

/// Owner of the live subscriber set.
pub struct BroadcastCoordinator {
    subscribers: Vec<Subscriber>,
    overflow: OverflowPolicy,
}

impl BroadcastCoordinator {
    /// Create a coordinator with an empty live set.
    pub fn new(overflow: OverflowPolicy) -> Self {
        Self {
            subscribers: Vec::new(),
            overflow,
        }
    }

    /// Number of entries in the live set.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether the live set is empty.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Append `subscriber`. It only sees batches broadcast from now on.
    pub fn register(&mut self, subscriber: Subscriber) {
        let id = subscriber.id();
        self.subscribers.push(subscriber);
        info!(
            "Subscriber {} registered. Total subscribers: {}",
            id,
            self.len()
        );
    }

    /// Remove every entry with `id` and return how many were removed.
    pub fn unregister(&mut self, id: SubscriberId) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id() != id);
        let removed = before - self.subscribers.len();
        if removed > 0 {
            info!(
                "Subscriber {} removed. Total subscribers: {}",
                id,
                self.len()
            );
        }
        removed
    }

    /// Serialize `batch` and offer the same text to every live subscriber.
    ///
    /// On a serialization error nothing is delivered. With no subscribers the
    /// batch is not even serialized.
    pub fn on_batch<T: Serialize + ?Sized>(&self, batch: &T) -> Result<Fanout, QuoteError> {
        if self.is_empty() {
            return Ok(Fanout::default());
        }
        let payload = serde_json::to_string(batch)?;
        let mut fanout = Fanout::default();
        for subscriber in &self.subscribers {
            match subscriber.offer(payload.clone(), self.overflow) {
                Offer::Queued => fanout.delivered += 1,
                Offer::ReplacedOldest => {
                    debug!("Subscriber {} queue full, oldest batch discarded", subscriber.id());
                    fanout.delivered += 1;
                    fanout.dropped += 1;
                }
                Offer::Dropped => {
                    debug!("Subscriber {} queue full, batch discarded", subscriber.id());
                    fanout.dropped += 1;
                }
                Offer::Closed => {
                    debug!("Subscriber {} disconnected, batch discarded", subscriber.id());
                    fanout.dropped += 1;
                }
            }
        }
        Ok(fanout)
    }

    /// Run the coordinator loop on the current thread.
    ///
    /// Returns when `batch_rx` closes. A closed control channel only stops
    /// registrations; batches keep flowing to the current set.
    pub fn run<T: Serialize>(mut self, control_rx: Receiver<Control>, batch_rx: Receiver<T>) {
        let closed = never();
        let mut registrations_open = true;
        loop {
            let control = if registrations_open { &control_rx } else { &closed };
            select! {
                recv(control) -> msg => match msg {
                    Ok(Control::Register(subscriber)) => self.register(subscriber),
                    Ok(Control::Unregister(id)) => {
                        self.unregister(id);
                    }
                    Err(_) => {
                        info!("All coordinator handles dropped, no further registrations");
                        registrations_open = false;
                    }
                },
                recv(batch_rx) -> msg => match msg {
                    Ok(batch) => match self.on_batch(&batch) {
                        Ok(fanout) => debug!(
                            "Batch delivered to {} subscriber(s), {} overflow(s)",
                            fanout.delivered, fanout.dropped
                        ),
                        Err(e) => error!("Can't serialize batch, skipped for all subscribers: {}", e),
                    },
                    Err(_) => {
                        info!("Batch source closed, coordinator stopping");
                        return;
                    }
                },
            }
        }
    }

    /// Start the coordinator loop on its own thread, fed by `batch_rx`.
    pub fn spawn<T: Serialize + Send + 'static>(self, batch_rx: Receiver<T>) -> CoordinatorHandle {
        let (control_tx, control_rx) = unbounded::<Control>();
        thread::spawn(move || self.run(control_rx, batch_rx));
        CoordinatorHandle { control_tx }
    }
}

/// Cloneable access point to a running coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    control_tx: Sender<Control>,
}

impl CoordinatorHandle {
    /// Ask the coordinator to add `subscriber` to the live set.
    ///
    /// Fails only if the coordinator loop has stopped.
    pub fn register(&self, subscriber: Subscriber) -> Result<()> {
        Ok(self.control_tx.send(Control::Register(subscriber))?)
    }

    /// Ask the coordinator to drop `id` from the live set.
    pub fn unregister(&self, id: SubscriberId) -> Result<()> {
        Ok(self.control_tx.send(Control::Unregister(id))?)
    }
}
