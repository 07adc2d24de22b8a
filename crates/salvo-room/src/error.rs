//! Error types for the room layer.

use salvo_protocol::RoomId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room already has two players.
    #[error("room {0} is full")]
    RoomFull(RoomId),
}
