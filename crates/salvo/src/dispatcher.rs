//! Outbound message fan-out.

use std::collections::HashMap;

use salvo_protocol::{Codec, ProtocolError, ServerMessage};
use salvo_transport::ConnectionId;
use tokio::sync::mpsc;

/// Channel sender for delivering encoded frames to one connection's
/// writer task.
pub type OutboundSender = mpsc::UnboundedSender<Vec<u8>>;

/// Pushes server messages to one connection or to all of them.
///
/// The dispatcher never touches sockets. Each connection registers the
/// sending half of an unbounded channel; a writer task on the other end
/// moves frames onto the wire. Sends are fire-and-forget: a frame for a
/// connection whose writer has gone away is dropped.
#[derive(Debug)]
pub struct Dispatcher<C: Codec> {
    codec: C,
    outbound: HashMap<ConnectionId, OutboundSender>,
}

impl<C: Codec> Dispatcher<C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            outbound: HashMap::new(),
        }
    }

    /// Starts routing frames for `conn` into `sender`.
    pub fn attach(&mut self, conn: ConnectionId, sender: OutboundSender) {
        self.outbound.insert(conn, sender);
    }

    /// Stops routing frames for `conn`. Returns `false` if it wasn't attached.
    pub fn detach(&mut self, conn: ConnectionId) -> bool {
        self.outbound.remove(&conn).is_some()
    }

    /// A connection is open while it is attached and its writer still
    /// holds the receiving end.
    pub fn is_open(&self, conn: ConnectionId) -> bool {
        self.outbound.get(&conn).is_some_and(|tx| !tx.is_closed())
    }

    /// Number of attached connections, open or not.
    pub fn connection_count(&self) -> usize {
        self.outbound.len()
    }

    /// Sends one message to one connection.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] only if the message can't be encoded.
    /// Delivery failures are logged and swallowed.
    pub fn send_to(&self, conn: ConnectionId, msg: &ServerMessage) -> Result<(), ProtocolError> {
        let frame = msg.encode(&self.codec)?;
        self.push(conn, frame);
        Ok(())
    }

    /// Sends one message to every attached connection.
    ///
    /// The message is encoded once and the frame cloned per connection.
    pub fn broadcast(&self, msg: &ServerMessage) -> Result<(), ProtocolError> {
        let frame = msg.encode(&self.codec)?;
        for (&conn, tx) in &self.outbound {
            if tx.send(frame.clone()).is_err() {
                tracing::debug!(%conn, kind = %msg.kind(), "broadcast skipped closed connection");
            }
        }
        Ok(())
    }

    fn push(&self, conn: ConnectionId, frame: Vec<u8>) {
        match self.outbound.get(&conn) {
            Some(tx) => {
                if tx.send(frame).is_err() {
                    tracing::debug!(%conn, "dropping frame for closed connection");
                }
            }
            None => tracing::debug!(%conn, "dropping frame for unknown connection"),
        }
    }
}
