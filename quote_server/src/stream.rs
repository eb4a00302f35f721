//! Per-client WebSocket stream.
//!
//! Each upgraded connection gets its own `Subscriber` queue, registered with
//! the coordinator. The queue is a blocking crossbeam channel, so a pump on
//! the blocking pool moves its messages into a small tokio channel, and the
//! connection task forwards those as text frames while it watches the socket
//! for a close. On exit the queue is dropped, which marks the subscriber
//! closed, and the subscriber is unregistered.
use crate::model::coordinator::CoordinatorHandle;
use crate::model::subscriber::{Subscriber, SubscriberQueue};
use axum::extract::ws::{Message, WebSocket};
use crossbeam_channel::RecvTimeoutError;
use log::{debug, error, info, warn};
use quote_common::{QuoteError, Result};
use std::time::Duration;
use tokio::sync::mpsc;

/// Longest the pump waits on a subscriber queue before checking the connection is still there.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Register a subscriber for `socket` and forward batches until the peer leaves.
pub async fn stream_quotes(mut socket: WebSocket, coordinator: CoordinatorHandle, queue_capacity: usize) {
    let (subscriber, queue) = Subscriber::channel(queue_capacity);
    let id = subscriber.id();
    if let Err(e) = coordinator.register(subscriber) {
        error!("Can't register subscriber {}: {}", id, e);
        return;
    }
    info!("A stream has been created for subscriber {}", id);

    let (frame_tx, mut frame_rx) = mpsc::channel::<String>(1);
    let pump = tokio::task::spawn_blocking(move || pump_queue(queue, frame_tx));

    let result = forward_batches(&mut socket, &mut frame_rx).await;
    drop(frame_rx);
    if let Err(e) = pump.await {
        warn!("Queue pump for subscriber {} failed: {}", id, e);
    }
    if let Err(e) = coordinator.unregister(id) {
        warn!("Failed to unregister subscriber {}: {}", id, e);
    }
    match result {
        Ok(()) => info!("Stream for subscriber {} closed", id),
        Err(e) => warn!("Stream for subscriber {} ended with error: {}", id, e),
    }
}

/// Move messages from `queue` into `frames` until either side goes away.
///
/// Runs on a blocking thread. Returning drops `queue`.
fn pump_queue(queue: SubscriberQueue, frames: mpsc::Sender<String>) {
    while !frames.is_closed() {
        match queue.recv_timeout(POLL_INTERVAL) {
            Ok(text) => {
                if frames.blocking_send(text).is_err() {
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// Send every message from `frames` as a text frame until the peer closes.
async fn forward_batches(socket: &mut WebSocket, frames: &mut mpsc::Receiver<String>) -> Result<()> {
    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(text) => socket.send(Message::Text(text)).await.map_err(transport)?,
                None => return Ok(()),
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(frame))) => {
                    debug!("Peer sent close frame: {:?}", frame);
                    return Ok(());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(transport(e)),
                None => return Ok(()),
            },
        }
    }
}

fn transport(e: axum::Error) -> QuoteError {
    QuoteError::Transport(e.to_string())
}
