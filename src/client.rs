//! Connection handle definition
//!
//! The outbound side of a connected client: a bounded queue of lines drained
//! by the connection's writer task.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use crate::error::SendError;
use crate::types::ConnectionId;

/// Outbound sink for one connected client
///
/// Sending never waits on the socket. A full queue means the peer is not
/// reading fast enough and is reported as a failed send, same as a closed one.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Connection that owns this handle
    pub id: ConnectionId,
    /// Server → Client line queue
    sender: mpsc::Sender<String>,
}

impl ConnectionHandle {
    /// Create a handle for the given connection and queue
    pub fn new(id: ConnectionId, sender: mpsc::Sender<String>) -> Self {
        Self { id, sender }
    }

    /// Queue a line for this client
    pub fn send(&self, line: impl Into<String>) -> Result<(), SendError> {
        self.sender.try_send(line.into()).map_err(|e| {
            match e {
                TrySendError::Full(_) => debug!("Outbound queue for {} is full", self.id),
                TrySendError::Closed(_) => debug!("Outbound queue for {} is closed", self.id),
            }
            SendError::SendFailed
        })
    }

    /// Release the handle
    ///
    /// Once every handle is gone the writer task flushes what is queued and
    /// shuts the socket down.
    pub fn close(self) {
        debug!("Closing outbound queue for {}", self.id);
    }
}
