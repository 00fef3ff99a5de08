//! Forkable outbound queue
//!
//! A FIFO of pending sends that survives reconnection. Forking a queue
//! produces a child that inherits a snapshot of the pending items *and*
//! every future push on the parent, so a restart in progress never loses a
//! message that was queued but not yet written. Handshake messages
//! (Identify/Resume) preempt to the head so they are always the first
//! frame written on a fresh link.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{oneshot, Notify};

use cord_common::GatewayError;

use crate::protocol::OpCode;

/// A message waiting to be written, shared between a queue and its forks.
///
/// The result slot is take-once: whichever write pump transmits (or fails)
/// the message first signals the sender; if every queue holding the message
/// is dropped without transmitting it, the waiting `send` call observes
/// [`GatewayError::Closed`].
pub(crate) struct QueuedMessage {
    /// Operation code, consulted for the handshake-preemption rule.
    pub op: OpCode,
    /// The encoded envelope, ready for the wire.
    pub text: String,
    result: Mutex<Option<oneshot::Sender<Result<(), GatewayError>>>>,
}

impl QueuedMessage {
    /// Create a message and the receiver its outcome will be delivered on.
    pub fn new(
        op: OpCode,
        text: String,
    ) -> (Arc<Self>, oneshot::Receiver<Result<(), GatewayError>>) {
        let (tx, rx) = oneshot::channel();
        let message = Arc::new(Self {
            op,
            text,
            result: Mutex::new(Some(tx)),
        });
        (message, rx)
    }

    /// Deliver the write outcome to the waiting sender, if any.
    pub fn complete(&self, outcome: Result<(), GatewayError>) {
        let sender = self
            .result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(outcome);
        }
    }
}

impl Drop for QueuedMessage {
    fn drop(&mut self) {
        // Last reference going away without a transmission: fail the waiter.
        self.complete(Err(GatewayError::Closed));
    }
}

#[derive(Default)]
struct QueueInner {
    items: VecDeque<Arc<QueuedMessage>>,
    forks: Vec<Arc<MessageQueue>>,
    closed: bool,
}

/// FIFO of pending sends with fork-on-reconnect semantics.
#[derive(Default)]
pub(crate) struct MessageQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
}

impl MessageQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append a message, mirroring it to every fork and waking the poller.
    ///
    /// Handshake messages replace an already-queued handshake at the head,
    /// or jump the queue otherwise. A closed queue no longer accepts items
    /// itself but still mirrors to its forks: a send racing a restart
    /// lands on the old branch and must reach the new link's queue.
    pub fn push(&self, message: Arc<QueuedMessage>) {
        let mut inner = self.lock();
        for fork in &inner.forks {
            fork.push(message.clone());
        }
        if inner.closed {
            return;
        }

        if message.op.is_handshake() {
            if inner.items.front().is_some_and(|head| head.op.is_handshake()) {
                inner.items.pop_front();
            }
            inner.items.push_front(message);
        } else {
            inner.items.push_back(message);
        }

        drop(inner);
        self.notify.notify_one();
    }

    /// Wait for the next message.
    ///
    /// Returns `None` once the queue is closed and drained; items queued
    /// before close still come out.
    pub async fn poll(&self) -> Option<Arc<QueuedMessage>> {
        loop {
            let notified = self.notify.notified();
            {
                let mut inner = self.lock();
                if let Some(message) = inner.items.pop_front() {
                    return Some(message);
                }
                if inner.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Create a queue that inherits all current and future items.
    pub fn fork(self: &Arc<Self>) -> Arc<Self> {
        let mut inner = self.lock();
        let child = Self::new();
        child.lock().items = inner.items.clone();
        inner.forks.push(child.clone());
        child
    }

    /// Signal that no further messages may be expected. Idempotent.
    pub fn close(&self) {
        {
            let mut inner = self.lock();
            if inner.closed {
                return;
            }
            inner.closed = true;
        }
        self.notify.notify_waiters();
    }

    /// Close the queue and fail every still-pending item with `Closed`.
    ///
    /// Used when the socket terminates; restart paths use [`close`] alone
    /// so items live on in the fork.
    pub fn drain(&self) {
        self.close();
        let items: Vec<_> = {
            let mut inner = self.lock();
            inner.items.drain(..).collect()
        };
        for message in items {
            message.complete(Err(GatewayError::Closed));
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
