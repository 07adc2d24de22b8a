//! Coordinator actor: one Tokio task that owns all game state.
//!
//! Connection tasks never touch the stores. They push events into a
//! bounded mpsc channel and the actor applies them strictly one after
//! another, so every event sees the complete effects of the previous one.

use salvo_protocol::Codec;
use salvo_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::coordinator::Coordinator;
use crate::dispatcher::OutboundSender;
use crate::SalvoError;

/// Events sent to the coordinator actor through its channel.
#[derive(Debug)]
pub(crate) enum CoordinatorEvent {
    /// A connection opened. Its frames go to `outbound`.
    Connected {
        id: ConnectionId,
        outbound: OutboundSender,
    },

    /// One raw message arrived on a connection.
    Inbound { id: ConnectionId, bytes: Vec<u8> },

    /// A connection closed.
    Closed { id: ConnectionId },
}

/// Handle to the running coordinator actor.
///
/// Cheap to clone; every connection task holds one.
#[derive(Clone, Debug)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<CoordinatorEvent>,
}

impl CoordinatorHandle {
    /// Registers a new connection and where its outbound frames go.
    pub async fn connected(&self, id: ConnectionId, outbound: OutboundSender) -> Result<(), SalvoError> {
        self.send(CoordinatorEvent::Connected { id, outbound }).await
    }

    /// Queues one inbound message for processing.
    pub async fn inbound(&self, id: ConnectionId, bytes: Vec<u8>) -> Result<(), SalvoError> {
        self.send(CoordinatorEvent::Inbound { id, bytes }).await
    }

    /// Reports that a connection closed.
    pub async fn closed(&self, id: ConnectionId) -> Result<(), SalvoError> {
        self.send(CoordinatorEvent::Closed { id }).await
    }

    async fn send(&self, event: CoordinatorEvent) -> Result<(), SalvoError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| SalvoError::CoordinatorStopped)
    }
}

struct CoordinatorActor<C: Codec + Clone> {
    coordinator: Coordinator<C>,
    receiver: mpsc::Receiver<CoordinatorEvent>,
}

impl<C: Codec + Clone> CoordinatorActor<C> {
    /// Processes events until every handle has been dropped.
    async fn run(mut self) {
        tracing::debug!("coordinator started");

        while let Some(event) = self.receiver.recv().await {
            match event {
                CoordinatorEvent::Connected { id, outbound } => {
                    self.coordinator.connect(id, outbound);
                }
                CoordinatorEvent::Inbound { id, bytes } => {
                    self.coordinator.handle_message(id, &bytes);
                }
                CoordinatorEvent::Closed { id } => {
                    self.coordinator.disconnect(id);
                }
            }
        }

        tracing::debug!("coordinator stopped");
    }
}

/// Spawns the coordinator task and returns a handle to it.
///
/// `queue` bounds the event channel; when it fills up, connection tasks
/// wait. It must be at least 1.
pub fn spawn_coordinator<C: Codec + Clone>(codec: C, queue: usize) -> CoordinatorHandle {
    let (tx, rx) = mpsc::channel(queue.max(1));

    let actor = CoordinatorActor {
        coordinator: Coordinator::new(codec),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    CoordinatorHandle { sender: tx }
}
