use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// A serialized envelope. Serialized once, shared by every recipient.
pub type Frame = Arc<str>;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outbound half of one client connection.
#[derive(Debug, Clone)]
pub struct ParticipantSink {
    connection: ConnectionId,
    tx: mpsc::UnboundedSender<Frame>,
}

impl ParticipantSink {
    pub fn new(connection: ConnectionId, tx: mpsc::UnboundedSender<Frame>) -> Self {
        Self { connection, tx }
    }

    /// Sink for a fresh connection plus the receiver its writer task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(ConnectionId::next(), tx), rx)
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Best-effort send. A closed sink is skipped, never queued.
    pub fn send(&self, frame: Frame) -> bool {
        self.is_open() && self.tx.send(frame).is_ok()
    }
}
