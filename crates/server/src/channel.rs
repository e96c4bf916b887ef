use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rink::ServerMessage;
use tokio::sync::{Notify, mpsc};

/// Outbound half of one client connection, independent of the transport.
///
/// Sends are best-effort and never block: a full or closed channel drops
/// the message.
pub trait Channel: Send + Sync {
    /// Queues `message`; returns `false` when it was dropped.
    fn send(&self, message: ServerMessage) -> bool;
    fn close(&self);
    fn is_closed(&self) -> bool;
}

pub type SharedChannel = Arc<dyn Channel>;

#[derive(Debug)]
pub enum Outgoing {
    Message(ServerMessage),
    Close,
}

/// [`Channel`] backed by a bounded queue drained by a writer task.
#[derive(Clone)]
pub struct QueuedChannel {
    tx: mpsc::Sender<Outgoing>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

/// Receiving side handed to the writer task.
pub struct OutgoingQueue {
    pub rx: mpsc::Receiver<Outgoing>,
    /// Fires when a close could not be queued behind pending messages.
    pub shutdown: Arc<Notify>,
}

impl QueuedChannel {
    pub fn new(capacity: usize) -> (Self, OutgoingQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let shutdown = Arc::new(Notify::new());
        let channel = Self {
            tx,
            closed: Arc::new(AtomicBool::new(false)),
            shutdown: shutdown.clone(),
        };
        (channel, OutgoingQueue { rx, shutdown })
    }
}

impl Channel for QueuedChannel {
    fn send(&self, message: ServerMessage) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.tx.try_send(Outgoing::Message(message)) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("dropping outbound message: {err}");
                false
            }
        }
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.tx.try_send(Outgoing::Close).is_err() {
            self.shutdown.notify_one();
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.tx.is_closed()
    }
}
