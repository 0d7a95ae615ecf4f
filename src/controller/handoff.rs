//! # Handoff Channel
//!
//! Single-producer, single-consumer rendezvous channel.
//!
//! `send` only completes once the receiver has taken the item, so a producer
//! can never run ahead of the consumer by more than the item it is currently
//! offering. Tokio's `mpsc` channels need a capacity of at least one, so the
//! rendezvous is built from a one-slot `mpsc` channel plus a `oneshot`
//! acknowledgement per item.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// The receiving side was dropped; the item was not accepted
#[derive(Debug, Error, PartialEq, Eq)]
#[error("handoff receiver closed")]
pub struct HandoffClosed;

struct Delivery<T> {
    item: T,
    accepted: oneshot::Sender<()>,
}

/// Sending half of a handoff channel
pub struct HandoffSender<T> {
    tx: mpsc::Sender<Delivery<T>>,
}

/// Receiving half of a handoff channel
pub struct HandoffReceiver<T> {
    rx: mpsc::Receiver<Delivery<T>>,
}

impl<T> std::fmt::Debug for HandoffSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<T> std::fmt::Debug for HandoffReceiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffReceiver").finish_non_exhaustive()
    }
}

/// Create a rendezvous channel
pub fn handoff<T>() -> (HandoffSender<T>, HandoffReceiver<T>) {
    let (tx, rx) = mpsc::channel(1);
    (HandoffSender { tx }, HandoffReceiver { rx })
}

impl<T> HandoffSender<T> {
    /// Offer an item and wait until the receiver has taken it
    pub async fn send(&self, item: T) -> Result<(), HandoffClosed> {
        let (accepted, ack) = oneshot::channel();
        self.tx
            .send(Delivery { item, accepted })
            .await
            .map_err(|_send_error| HandoffClosed)?;
        // An Err here means the receiver was dropped with the item still queued
        ack.await.map_err(|_recv_error| HandoffClosed)
    }
}

impl<T> HandoffReceiver<T> {
    /// Take the next item, releasing its sender
    ///
    /// Returns `None` once the sender is dropped. Cancel-safe: if the future
    /// is dropped before completing, no item is lost.
    pub async fn recv(&mut self) -> Option<T> {
        let Delivery { item, accepted } = self.rx.recv().await?;
        // The sender may have given up waiting; the item is still ours
        let _ = accepted.send(());
        Some(item)
    }
}
