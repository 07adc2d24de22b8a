//! One two-player match.

use std::collections::HashSet;

use salvo_protocol::{GameId, PlayerId, Position, ShipLayout};

use crate::Ship;

/// A player's side of a match: their fleet and where they have fired.
#[derive(Debug, Clone)]
pub struct PlayerInGame {
    pub player: PlayerId,

    /// Empty until the player submits a layout.
    pub(crate) ships: Vec<Ship>,

    /// Cells this player has fired at, plus cells revealed around ships
    /// they sank. Never contains a cell twice.
    pub(crate) attacks: HashSet<Position>,
}

impl PlayerInGame {
    fn new(player: PlayerId) -> Self {
        Self {
            player,
            ships: Vec::new(),
            attacks: HashSet::new(),
        }
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// The fleet as the player submitted it.
    pub fn layouts(&self) -> Vec<ShipLayout> {
        self.ships.iter().map(|s| s.layout().clone()).collect()
    }

    pub fn has_fleet(&self) -> bool {
        !self.ships.is_empty()
    }

    pub fn has_attacked(&self, pos: Position) -> bool {
        self.attacks.contains(&pos)
    }

    pub fn attack_count(&self) -> usize {
        self.attacks.len()
    }

    pub(crate) fn fleet_destroyed(&self) -> bool {
        self.ships.iter().all(Ship::is_sunk)
    }
}

/// A match between exactly two players.
///
/// ```text
///   create          both fleets in           last ship sunk
/// ─────────→ [placing] ─────────→ [started] ─────────────→ [finished]
/// ```
///
/// `finished` never goes back to `false`, and once it is set the boards
/// and the turn are frozen.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: GameId,
    pub(crate) players: [PlayerInGame; 2],

    /// The player allowed to fire next.
    pub(crate) turn: PlayerId,

    pub(crate) started: bool,
    pub(crate) finished: bool,
}

impl GameSession {
    /// Creates a session. The first player moves first.
    pub(crate) fn new(id: GameId, players: [PlayerId; 2]) -> Self {
        Self {
            id,
            players: players.map(PlayerInGame::new),
            turn: players[0],
            started: false,
            finished: false,
        }
    }

    pub fn player_ids(&self) -> [PlayerId; 2] {
        [self.players[0].player, self.players[1].player]
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.players.iter().any(|p| p.player == player)
    }

    pub fn player(&self, player: PlayerId) -> Option<&PlayerInGame> {
        self.players.iter().find(|p| p.player == player)
    }

    pub(crate) fn slot_index(&self, player: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.player == player)
    }

    /// The other player of the match.
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        let idx = self.slot_index(player)?;
        Some(self.players[1 - idx].player)
    }

    pub fn turn(&self) -> PlayerId {
        self.turn
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
