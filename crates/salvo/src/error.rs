//! Unified error type for the Salvo server.

use salvo_battle::BattleError;
use salvo_identity::IdentityError;
use salvo_protocol::{PlayerId, ProtocolError};
use salvo_room::RoomError;
use salvo_transport::{ConnectionId, TransportError};

/// Failures that belong to the coordinator itself rather than to one of
/// the stores it drives.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The connection sent a message that needs a logged-in player, but
    /// it never registered.
    #[error("{0} is not bound to a player")]
    ClientConnectionNotFound(ConnectionId),

    /// The message names a player other than the one the connection is
    /// logged in as.
    #[error("{conn} is logged in as {bound} but sent a message for {claimed}")]
    PlayerMismatch {
        conn: ConnectionId,
        bound: PlayerId,
        claimed: PlayerId,
    },
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SalvoError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown type).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registration or player lookup error.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A room-level error (full, not found).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game-level error (unknown game, already started, off-board).
    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    /// The coordinator task is gone; the server is shutting down.
    #[error("coordinator has stopped")]
    CoordinatorStopped,
}
