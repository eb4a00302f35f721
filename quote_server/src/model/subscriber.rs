//! Per-connection delivery queues.
//!
//! A `Subscriber` is the coordinator-side end of a bounded queue of serialized
//! batches; the transport adapter keeps the matching `SubscriberQueue` and
//! forwards whatever it drains to its peer. What happens when the queue is
//! full is decided by the coordinator's `OverflowPolicy`.
//!
//! Dropping the `SubscriberQueue` marks the subscriber closed. Offers to a
//! closed subscriber return at once, even under `OverflowPolicy::Block`.

use clap::ValueEnum;
use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TrySendError, bounded};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// How often a blocked offer checks whether the consumer went away.
const CLOSED_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Identity shared by a subscriber and all of its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What to do with a new message when a subscriber's queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OverflowPolicy {
    /// Discard the oldest queued message to make room. Never blocks.
    #[default]
    DropOldest,
    /// Discard the new message. Never blocks.
    DropNewest,
    /// Wait until the consumer makes room or goes away. A stalled but
    /// connected peer stalls every broadcast behind it.
    Block,
}

/// Result of offering one message to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The message is in the queue.
    Queued,
    /// The message is in the queue, an older one was discarded.
    ReplacedOldest,
    /// The queue stayed full and the message was discarded.
    Dropped,
    /// The consumer is gone; the message was discarded.
    Closed,
}

/// Coordinator-side handle of a subscriber's delivery queue.
///
/// Clones share the same queue and the same `SubscriberId`.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: SubscriberId,
    queue: Sender<String>,
    // Lets the producer evict the oldest message under `DropOldest`. It also
    // keeps the channel connected, hence the separate `closed` flag.
    evict: Receiver<String>,
    closed: Arc<AtomicBool>,
}

/// Adapter-side end of a subscriber's queue.
///
/// Derefs to the underlying `Receiver`. Dropping it closes the subscriber.
#[derive(Debug)]
pub struct SubscriberQueue {
    rx: Receiver<String>,
    closed: Arc<AtomicBool>,
}

impl Deref for SubscriberQueue {
    type Target = Receiver<String>;

    fn deref(&self) -> &Self::Target {
        &self.rx
    }
}

impl Drop for SubscriberQueue {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Outcome of a `DropOldest` retry. Only a retry that followed an actual
/// eviction replaced anything.
fn after_eviction(evicted: bool, sent: bool) -> Offer {
    match (evicted, sent) {
        (true, true) => Offer::ReplacedOldest,
        (false, true) => Offer::Queued,
        (_, false) => Offer::Dropped,
    }
}

impl Subscriber {
    /// Create a subscriber with a queue of `capacity` messages.
    ///
    /// Returns the subscriber to register with the coordinator and the
    /// queue the transport adapter drains. A capacity of zero is raised
    /// to one; a rendezvous queue could never hold a message to evict.
    pub fn channel(capacity: usize) -> (Self, SubscriberQueue) {
        let (queue, rx) = bounded(capacity.max(1));
        let closed = Arc::new(AtomicBool::new(false));
        let subscriber = Self {
            id: SubscriberId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            queue,
            evict: rx.clone(),
            closed: Arc::clone(&closed),
        };
        (subscriber, SubscriberQueue { rx, closed })
    }

    /// Identity of this subscriber.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether the adapter side of the queue has been dropped.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Offer `message` to the queue according to `policy`.
    pub fn offer(&self, message: String, policy: OverflowPolicy) -> Offer {
        if self.is_closed() {
            return Offer::Closed;
        }
        match policy {
            OverflowPolicy::Block => self.offer_blocking(message),
            OverflowPolicy::DropNewest => match self.queue.try_send(message) {
                Ok(()) => Offer::Queued,
                Err(_) => Offer::Dropped,
            },
            OverflowPolicy::DropOldest => match self.queue.try_send(message) {
                Ok(()) => Offer::Queued,
                Err(TrySendError::Full(message)) => {
                    // The consumer may have drained the queue in between.
                    let evicted = self.evict.try_recv().is_ok();
                    after_eviction(evicted, self.queue.try_send(message).is_ok())
                }
                Err(TrySendError::Disconnected(_)) => Offer::Closed,
            },
        }
    }

    fn offer_blocking(&self, mut message: String) -> Offer {
        loop {
            match self.queue.send_timeout(message, CLOSED_CHECK_INTERVAL) {
                Ok(()) => return Offer::Queued,
                Err(SendTimeoutError::Timeout(pending)) => {
                    if self.is_closed() {
                        return Offer::Closed;
                    }
                    message = pending;
                }
                Err(SendTimeoutError::Disconnected(_)) => return Offer::Closed,
            }
        }
    }
}
