//! Error types for the battle layer.

use salvo_protocol::{GameId, PlayerId, Position};

/// Errors from game session lookups and board operations.
///
/// Rule violations that are part of normal play (attacking out of turn,
/// firing at the same cell twice) are not errors; see
/// [`IgnoreReason`](crate::IgnoreReason).
#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    /// No session has this id.
    #[error("game {0} not found")]
    GameNotFound(GameId),

    /// The player is not one of the session's two players.
    #[error("player {player} is not in game {game}")]
    PlayerNotFound { game: GameId, player: PlayerId },

    /// Both fleets are already placed; layouts are frozen.
    #[error("game {0} has already started")]
    GameAlreadyStarted(GameId),

    /// The target cell is off the board.
    #[error("position {0} is outside the board")]
    OutOfBounds(Position),
}
