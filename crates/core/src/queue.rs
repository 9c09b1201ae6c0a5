// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, Mutex};

use crate::model::LogPacket;

/// Bounded, multi-producer multi-consumer ingress queue.
///
/// `/ingest` handlers call [`Queue::offer`], which never blocks: it either
/// enqueues the packet or reports the queue as full or closed. Worker tasks
/// call [`Queue::take`], which suspends the worker until a packet is
/// available or the queue is closed and drained.
///
/// The sending half is wrapped in an `Arc<Mutex<Option<..>>>` shared by every
/// clone so that [`Queue::close`] takes effect for all holders at once,
/// rather than only for the clone it was called on; `flume`'s own
/// sender-drop-based closing only fires once *every* clone's sender is
/// dropped, which a handle shared across request handlers cannot arrange on
/// its own.
#[derive(Clone)]
pub struct Queue {
    sender: Arc<Mutex<Option<flume::Sender<LogPacket>>>>,
    receiver: flume::Receiver<LogPacket>,
    capacity: usize,
}

impl Queue {
    /// Creates a queue bounded at `capacity` packets (`Qmax`).
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity);
        Self {
            sender: Arc::new(Mutex::new(Some(sender))),
            receiver,
            capacity,
        }
    }

    /// Attempts to enqueue `packet` without blocking. Returns the packet
    /// back to the caller if the queue is at capacity or has been closed.
    pub fn offer(&self, packet: LogPacket) -> Result<(), LogPacket> {
        let guard = self.sender.lock().unwrap_or_else(|p| p.into_inner());
        match guard.as_ref() {
            Some(sender) => match sender.try_send(packet) {
                Ok(()) => Ok(()),
                Err(flume::TrySendError::Full(packet)) => Err(packet),
                Err(flume::TrySendError::Disconnected(packet)) => Err(packet),
            },
            None => Err(packet),
        }
    }

    /// Awaits the next packet, or `None` once the queue is closed and
    /// drained. Workers use this in their main loop.
    pub async fn take(&self) -> Option<LogPacket> {
        self.receiver.recv_async().await.ok()
    }

    /// Closes the queue to new `offer`s. Packets already buffered are still
    /// delivered to `take()` callers until the buffer is empty, at which
    /// point `take()` starts returning `None`.
    pub fn close(&self) {
        if let Some(sender) = self.sender.lock().unwrap_or_else(|p| p.into_inner()).take() {
            drop(sender);
        }
    }

    /// Number of packets currently buffered.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True if the queue currently holds no packets.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Capacity this queue was constructed with (`Qmax`).
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
