//! The game session store and attack resolution.

use std::collections::BTreeMap;

use rand::Rng;
use salvo_protocol::{AttackStatus, GameId, PlayerId, Position, ShipLayout};

use crate::geometry::{self, BOARD_SIZE};
use crate::{BattleError, GameSession, Ship};

/// What [`GameStore::add_ships`] did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The fleet was stored; the opponent hasn't placed theirs yet.
    Waiting,
    /// Both fleets are in and the game just started.
    Started,
}

/// Why an attack was accepted as a message but had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotStarted,
    Finished,
    NotYourTurn,
    AlreadyAttacked,
}

/// Everything that changed because of one resolved attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackReport {
    pub game: GameId,
    pub players: [PlayerId; 2],
    pub attacker: PlayerId,
    pub position: Position,
    pub status: AttackStatus,

    /// Cells around a just-sunk ship, now marked as attacked. Empty unless
    /// `status` is `Killed`.
    pub fringe: Vec<Position>,

    /// Who fires next. Unchanged after a hit, the defender after a miss.
    pub next_turn: PlayerId,

    /// Set when this attack sank the defender's last ship.
    pub winner: Option<PlayerId>,
}

/// Result of [`GameStore::attack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackOutcome {
    /// The attack broke a game rule and changed nothing.
    Ignored(IgnoreReason),
    Resolved(AttackReport),
}

/// Every game session on the server, keyed by id.
///
/// Sessions stay here after they finish. They are only removed when a
/// player walks out of an unfinished match (see [`forfeit_player`]).
///
/// [`forfeit_player`]: GameStore::forfeit_player
#[derive(Debug, Default)]
pub struct GameStore {
    games: BTreeMap<GameId, GameSession>,
    next_id: u64,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new match. `players[0]` moves first.
    pub fn create_game(&mut self, players: [PlayerId; 2]) -> GameId {
        let game_id = GameId(self.next_id);
        self.next_id += 1;
        self.games.insert(game_id, GameSession::new(game_id, players));
        tracing::info!(
            %game_id,
            first = %players[0],
            second = %players[1],
            "game created"
        );
        game_id
    }

    pub fn get(&self, game: GameId) -> Option<&GameSession> {
        self.games.get(&game)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Adds ships to a player's fleet.
    ///
    /// The ships are taken as placed: overlap, board edges, and fleet
    /// composition are not checked. When this call gives both players a
    /// fleet, the game starts.
    ///
    /// # Errors
    /// - [`BattleError::GameNotFound`] / [`BattleError::PlayerNotFound`]
    ///   for failed lookups.
    /// - [`BattleError::GameAlreadyStarted`] once both fleets are placed.
    pub fn add_ships(
        &mut self,
        game: GameId,
        player: PlayerId,
        layouts: Vec<ShipLayout>,
    ) -> Result<Placement, BattleError> {
        let session = self
            .games
            .get_mut(&game)
            .ok_or(BattleError::GameNotFound(game))?;
        if session.started {
            return Err(BattleError::GameAlreadyStarted(game));
        }
        let idx = session
            .slot_index(player)
            .ok_or(BattleError::PlayerNotFound { game, player })?;

        session.players[idx]
            .ships
            .extend(layouts.into_iter().map(Ship::new));
        tracing::debug!(
            game_id = %game,
            player_id = %player,
            ships = session.players[idx].ships.len(),
            "fleet placed"
        );

        if session.players.iter().all(|p| p.has_fleet()) {
            session.started = true;
            tracing::info!(game_id = %game, turn = %session.turn, "game started");
            Ok(Placement::Started)
        } else {
            Ok(Placement::Waiting)
        }
    }

    /// Fires `attacker`'s shot at `target` on the opponent's board.
    ///
    /// Rule violations (game not running, out of turn, repeated cell)
    /// return [`AttackOutcome::Ignored`] and leave the session untouched.
    ///
    /// # Errors
    /// - [`BattleError::GameNotFound`] / [`BattleError::PlayerNotFound`]
    ///   for failed lookups.
    /// - [`BattleError::OutOfBounds`] if `target` is off the board.
    pub fn attack(
        &mut self,
        game: GameId,
        attacker: PlayerId,
        target: Position,
    ) -> Result<AttackOutcome, BattleError> {
        let session = self
            .games
            .get_mut(&game)
            .ok_or(BattleError::GameNotFound(game))?;
        if !geometry::in_bounds(target) {
            return Err(BattleError::OutOfBounds(target));
        }
        let attacker_idx = session
            .slot_index(attacker)
            .ok_or(BattleError::PlayerNotFound { game, player: attacker })?;

        if session.finished {
            return Ok(AttackOutcome::Ignored(IgnoreReason::Finished));
        }
        if !session.started {
            return Ok(AttackOutcome::Ignored(IgnoreReason::NotStarted));
        }
        if session.turn != attacker {
            return Ok(AttackOutcome::Ignored(IgnoreReason::NotYourTurn));
        }
        if session.players[attacker_idx].has_attacked(target) {
            return Ok(AttackOutcome::Ignored(IgnoreReason::AlreadyAttacked));
        }

        let defender_idx = 1 - attacker_idx;
        let defender = session.players[defender_idx].player;

        let (status, fringe) = session.players[defender_idx]
            .ships
            .iter_mut()
            .find_map(|ship| {
                let status = ship.strike(target)?;
                let ring = match status {
                    AttackStatus::Killed => ship.fringe(),
                    _ => Vec::new(),
                };
                Some((status, ring))
            })
            .unwrap_or((AttackStatus::Miss, Vec::new()));

        let attacks = &mut session.players[attacker_idx].attacks;
        attacks.insert(target);
        attacks.extend(fringe.iter().copied());

        if status == AttackStatus::Miss {
            session.turn = defender;
        }

        let mut winner = None;
        if status == AttackStatus::Killed && session.players[defender_idx].fleet_destroyed() {
            session.finished = true;
            winner = Some(attacker);
            tracing::info!(game_id = %game, winner = %attacker, "game finished");
        }

        tracing::debug!(
            game_id = %game,
            player_id = %attacker,
            %target,
            ?status,
            "attack resolved"
        );

        Ok(AttackOutcome::Resolved(AttackReport {
            game,
            players: session.player_ids(),
            attacker,
            position: target,
            status,
            fringe,
            next_turn: session.turn,
            winner,
        }))
    }

    /// Picks a random cell `player` hasn't fired at yet.
    ///
    /// Returns `Ok(None)` when every cell on the board has been attacked.
    ///
    /// # Errors
    /// [`BattleError::GameNotFound`] / [`BattleError::PlayerNotFound`] for
    /// failed lookups.
    pub fn random_target<R: Rng + ?Sized>(
        &self,
        game: GameId,
        player: PlayerId,
        rng: &mut R,
    ) -> Result<Option<Position>, BattleError> {
        let session = self.games.get(&game).ok_or(BattleError::GameNotFound(game))?;
        let slot = session
            .player(player)
            .ok_or(BattleError::PlayerNotFound { game, player })?;

        let board_cells = usize::from(BOARD_SIZE) * usize::from(BOARD_SIZE);
        if slot.attack_count() >= board_cells {
            return Ok(None);
        }

        loop {
            let pos = Position::new(
                rng.random_range(0..BOARD_SIZE),
                rng.random_range(0..BOARD_SIZE),
            );
            if !slot.has_attacked(pos) {
                return Ok(Some(pos));
            }
        }
    }

    /// Removes every unfinished session `player` is part of.
    ///
    /// Finished sessions are kept. Returns the removed sessions so the
    /// caller can notify the remaining players.
    pub fn forfeit_player(&mut self, player: PlayerId) -> Vec<GameSession> {
        let doomed: Vec<GameId> = self
            .games
            .values()
            .filter(|g| !g.finished && g.contains(player))
            .map(|g| g.id)
            .collect();

        doomed
            .into_iter()
            .filter_map(|id| self.games.remove(&id))
            .inspect(|g| tracing::info!(game_id = %g.id, player_id = %player, "game abandoned"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use salvo_protocol::{Orientation, ShipKind};

    use super::*;

    const P1: PlayerId = PlayerId(0);
    const P2: PlayerId = PlayerId(1);

    fn layout(x: u8, y: u8, orientation: Orientation, length: u8) -> ShipLayout {
        ShipLayout {
            position: Position::new(x, y),
            orientation,
            length,
            kind: ShipKind::Small,
        }
    }

    /// A started game where each side has a single one-cell ship.
    fn started_game(store: &mut GameStore) -> GameId {
        let game = store.create_game([P1, P2]);
        store
            .add_ships(game, P1, vec![layout(0, 0, Orientation::Horizontal, 1)])
            .unwrap();
        store
            .add_ships(game, P2, vec![layout(9, 9, Orientation::Horizontal, 1), layout(5, 5, Orientation::Horizontal, 1)])
            .unwrap();
        game
    }

    #[test]
    fn test_create_game_ids_are_sequential() {
        let mut store = GameStore::new();
        assert_eq!(store.create_game([P1, P2]), GameId(0));
        assert_eq!(store.create_game([P2, P1]), GameId(1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_add_ships_starts_only_when_both_fleets_placed() {
        let mut store = GameStore::new();
        let game = store.create_game([P1, P2]);

        let first = store.add_ships(game, P1, vec![layout(0, 0, Orientation::Vertical, 2)]);
        assert_eq!(first.unwrap(), Placement::Waiting);
        assert!(!store.get(game).unwrap().is_started());

        let second = store.add_ships(game, P2, vec![layout(3, 3, Orientation::Vertical, 2)]);
        assert_eq!(second.unwrap(), Placement::Started);
        assert!(store.get(game).unwrap().is_started());
    }

    #[test]
    fn test_add_ships_after_start_returns_already_started() {
        let mut store = GameStore::new();
        let game = started_game(&mut store);

        let result = store.add_ships(game, P1, vec![layout(4, 4, Orientation::Vertical, 1)]);

        assert!(matches!(result, Err(BattleError::GameAlreadyStarted(g)) if g == game));
    }

    #[test]
    fn test_add_ships_unknown_game_or_player_fails() {
        let mut store = GameStore::new();
        let game = store.create_game([P1, P2]);

        assert!(matches!(
            store.add_ships(GameId(99), P1, vec![]),
            Err(BattleError::GameNotFound(GameId(99)))
        ));
        assert!(matches!(
            store.add_ships(game, PlayerId(7), vec![]),
            Err(BattleError::PlayerNotFound { .. })
        ));
    }

    #[test]
    fn test_add_ships_empty_list_does_not_start() {
        let mut store = GameStore::new();
        let game = store.create_game([P1, P2]);
        store.add_ships(game, P1, vec![layout(0, 0, Orientation::Vertical, 1)]).unwrap();

        let placement = store.add_ships(game, P2, vec![]).unwrap();

        assert_eq!(placement, Placement::Waiting);
    }

    #[test]
    fn test_attack_before_start_is_ignored() {
        let mut store = GameStore::new();
        let game = store.create_game([P1, P2]);

        let outcome = store.attack(game, P1, Position::new(0, 0)).unwrap();

        assert_eq!(outcome, AttackOutcome::Ignored(IgnoreReason::NotStarted));
    }

    #[test]
    fn test_attack_out_of_bounds_returns_error() {
        let mut store = GameStore::new();
        let game = started_game(&mut store);

        let result = store.attack(game, P1, Position::new(10, 3));

        assert!(matches!(result, Err(BattleError::OutOfBounds(_))));
    }

    #[test]
    fn test_attack_out_of_turn_is_ignored() {
        let mut store = GameStore::new();
        let game = started_game(&mut store);

        let outcome = store.attack(game, P2, Position::new(0, 0)).unwrap();

        assert_eq!(outcome, AttackOutcome::Ignored(IgnoreReason::NotYourTurn));
        assert_eq!(store.get(game).unwrap().turn(), P1);
    }

    #[test]
    fn test_attack_miss_passes_turn() {
        let mut store = GameStore::new();
        let game = started_game(&mut store);

        let AttackOutcome::Resolved(report) = store.attack(game, P1, Position::new(4, 4)).unwrap()
        else {
            panic!("expected a resolved attack");
        };

        assert_eq!(report.status, AttackStatus::Miss);
        assert_eq!(report.next_turn, P2);
        assert!(report.fringe.is_empty());
        assert_eq!(report.winner, None);
    }

    #[test]
    fn test_attack_kill_keeps_turn_and_marks_fringe() {
        let mut store = GameStore::new();
        let game = started_game(&mut store);

        let AttackOutcome::Resolved(report) = store.attack(game, P1, Position::new(5, 5)).unwrap()
        else {
            panic!("expected a resolved attack");
        };

        assert_eq!(report.status, AttackStatus::Killed);
        assert_eq!(report.next_turn, P1);
        assert_eq!(report.fringe.len(), 8);
        let slot = store.get(game).unwrap().player(P1).unwrap();
        assert!(report.fringe.iter().all(|c| slot.has_attacked(*c)));
        assert_eq!(slot.attack_count(), 9);
    }

    #[test]
    fn test_attack_same_cell_twice_is_ignored() {
        let mut store = GameStore::new();
        let game = started_game(&mut store);
        store.attack(game, P1, Position::new(4, 4)).unwrap();
        store.attack(game, P2, Position::new(3, 3)).unwrap();

        let outcome = store.attack(game, P1, Position::new(4, 4)).unwrap();

        assert_eq!(outcome, AttackOutcome::Ignored(IgnoreReason::AlreadyAttacked));
        assert_eq!(store.get(game).unwrap().turn(), P1);
    }

    #[test]
    fn test_attack_fringe_cell_counts_as_attacked() {
        let mut store = GameStore::new();
        let game = started_game(&mut store);
        store.attack(game, P1, Position::new(5, 5)).unwrap();

        let outcome = store.attack(game, P1, Position::new(4, 4)).unwrap();

        assert_eq!(outcome, AttackOutcome::Ignored(IgnoreReason::AlreadyAttacked));
    }

    #[test]
    fn test_attack_last_ship_finishes_game_once() {
        let mut store = GameStore::new();
        let game = started_game(&mut store);
        store.attack(game, P1, Position::new(5, 5)).unwrap();

        let AttackOutcome::Resolved(report) = store.attack(game, P1, Position::new(9, 9)).unwrap()
        else {
            panic!("expected a resolved attack");
        };
        assert_eq!(report.winner, Some(P1));
        assert!(store.get(game).unwrap().is_finished());

        let after = store.attack(game, P1, Position::new(0, 9)).unwrap();
        assert_eq!(after, AttackOutcome::Ignored(IgnoreReason::Finished));
    }

    #[test]
    fn test_random_target_avoids_attacked_cells() {
        let mut store = GameStore::new();
        let game = started_game(&mut store);
        store.attack(game, P1, Position::new(5, 5)).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let pos = store.random_target(game, P1, &mut rng).unwrap().unwrap();
            assert!(geometry::in_bounds(pos));
            assert!(!store.get(game).unwrap().player(P1).unwrap().has_attacked(pos));
        }
    }

    #[test]
    fn test_random_target_full_board_returns_none() {
        let mut store = GameStore::new();
        let game = store.create_game([P1, P2]);
        store.games.get_mut(&game).unwrap().players[0]
            .attacks
            .extend(geometry::all_cells());
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(store.random_target(game, P1, &mut rng).unwrap(), None);
    }

    #[test]
    fn test_random_target_finds_last_free_cell() {
        let mut store = GameStore::new();
        let game = store.create_game([P1, P2]);
        let last = Position::new(6, 2);
        store.games.get_mut(&game).unwrap().players[0]
            .attacks
            .extend(geometry::all_cells().filter(|c| *c != last));
        let mut rng = StdRng::seed_from_u64(9);

        assert_eq!(store.random_target(game, P1, &mut rng).unwrap(), Some(last));
    }

    #[test]
    fn test_forfeit_player_removes_only_unfinished_games() {
        let mut store = GameStore::new();
        let finished = started_game(&mut store);
        store.attack(finished, P1, Position::new(5, 5)).unwrap();
        store.attack(finished, P1, Position::new(9, 9)).unwrap();
        let running = started_game(&mut store);
        let unrelated = store.create_game([PlayerId(5), PlayerId(6)]);

        let removed = store.forfeit_player(P2);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, running);
        assert!(store.get(finished).is_some());
        assert!(store.get(running).is_none());
        assert!(store.get(unrelated).is_some());
    }
}
