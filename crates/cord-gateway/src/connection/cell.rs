//! Connection cell
//!
//! A connection cell pairs a transport link with the outbound queue. The
//! socket holds exactly one current cell; restarts install a fresh cell
//! via a compare-and-swap so that however many pumps observe the same
//! failure, only one of them drives the reconnect.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::queue::MessageQueue;
use crate::transport::Link;

/// One connection attempt: a (possibly not-yet-dialed) link plus the
/// queue of pending sends.
pub(crate) struct ConnCell {
    /// The live transport, absent while a dial is in progress.
    pub link: Option<Arc<dyn Link>>,
    /// Pending sends; forked into the successor cell on restart.
    pub queue: Arc<MessageQueue>,
}

impl ConnCell {
    /// The cell installed at socket construction, before the first dial.
    pub fn initial() -> Arc<Self> {
        Arc::new(Self {
            link: None,
            queue: MessageQueue::new(),
        })
    }

    /// A successor cell whose queue inherits everything pending in `prev`.
    pub fn fork(prev: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            link: None,
            queue: prev.queue.fork(),
        })
    }

    /// The cell installed once a dial and handshake succeed.
    pub fn with_link(link: Arc<dyn Link>, queue: Arc<MessageQueue>) -> Arc<Self> {
        Arc::new(Self {
            link: Some(link),
            queue,
        })
    }

    /// Close the queue and the link, if any. Idempotent.
    pub async fn close(&self) {
        self.queue.close();
        if let Some(link) = &self.link {
            let _ = link.close().await;
        }
    }
}

/// The socket's single mutable reference to its current [`ConnCell`].
///
/// `None` is the tombstone installed by `close()`; every operation
/// observes it as Closed and no further transitions occur.
pub(crate) struct ConnectionCell {
    slot: Mutex<Option<Arc<ConnCell>>>,
}

impl ConnectionCell {
    pub fn new(initial: Arc<ConnCell>) -> Self {
        Self {
            slot: Mutex::new(Some(initial)),
        }
    }

    /// The current cell, or `None` once the socket is closed.
    pub fn load(&self) -> Option<Arc<ConnCell>> {
        self.lock().clone()
    }

    /// Install `next` if and only if the current cell is still `prev`.
    ///
    /// A false return means another task already swapped this failure out
    /// (or the socket closed); the caller must back off without acting.
    pub fn swap(&self, prev: &Arc<ConnCell>, next: Arc<ConnCell>) -> bool {
        let mut slot = self.lock();
        match slot.as_ref() {
            Some(current) if Arc::ptr_eq(current, prev) => {
                *slot = Some(next);
                true
            }
            _ => false,
        }
    }

    /// Unconditionally install `next`, unless the socket has closed.
    ///
    /// Used for the final install of a live cell: readers may have loaded
    /// the dial-in-progress cell in the meantime, so this must not be a
    /// compare-and-swap. It still refuses to overwrite the tombstone: a
    /// close that raced the dial wins.
    pub fn store_if_open(&self, next: Arc<ConnCell>) -> bool {
        let mut slot = self.lock();
        if slot.is_none() {
            return false;
        }
        *slot = Some(next);
        true
    }

    /// Install the tombstone, returning the previous cell for cleanup.
    pub fn close(&self) -> Option<Arc<ConnCell>> {
        self.lock().take()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<ConnCell>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
