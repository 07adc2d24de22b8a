//! The session coordinator: the protocol state machine.
//!
//! The coordinator owns every store (players, rooms, games) plus the
//! dispatcher, and applies one connection event at a time. It is plain
//! synchronous code; [`crate::actor`] puts it behind a channel so the
//! async side of the server can feed it.
//!
//! Message flow for one match:
//!
//! ```text
//! reg ──→ reg reply, update_room*, update_winners*
//! create_room ──→ update_room*
//! add_user_to_room ──→ create_game (each player), update_room*
//! add_ships ×2 ──→ start_game (each player), turn
//! attack / randomAttack ──→ attack, [fringe misses], turn, [finish, update_winners*]
//! (* = broadcast to every connection)
//! ```

use rand::Rng;
use salvo_battle::{AttackOutcome, AttackReport, GameStore, Placement};
use salvo_identity::{IdentityError, PlayerDirectory};
use salvo_protocol::{
    AddShipsRequest, AddUserToRoomRequest, AttackRequest, AttackResult, AttackStatus,
    ClientMessage, Codec, CreateGameData, FinishData, GameId, PlayerId, Position,
    RandomAttackRequest, RegRequest, RegResponse, ServerMessage, StartGameData, TurnData,
    WinnerEntry,
};
use salvo_room::{JoinOutcome, Room, RoomManager};
use salvo_transport::ConnectionId;

use crate::dispatcher::{Dispatcher, OutboundSender};
use crate::{CoordinatorError, SalvoError};

/// Drives registration, matchmaking, and games for every connection.
pub struct Coordinator<C: Codec + Clone> {
    codec: C,
    directory: PlayerDirectory,
    rooms: RoomManager,
    games: GameStore,
    dispatcher: Dispatcher<C>,
}

impl<C: Codec + Clone> Coordinator<C> {
    pub fn new(codec: C) -> Self {
        Self {
            dispatcher: Dispatcher::new(codec.clone()),
            codec,
            directory: PlayerDirectory::new(),
            rooms: RoomManager::new(),
            games: GameStore::new(),
        }
    }

    pub fn directory(&self) -> &PlayerDirectory {
        &self.directory
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub fn games(&self) -> &GameStore {
        &self.games
    }

    // =====================================================================
    // Connection events
    // =====================================================================

    /// A transport connection opened. Frames for it go to `outbound`.
    pub fn connect(&mut self, conn: ConnectionId, outbound: OutboundSender) {
        self.dispatcher.attach(conn, outbound);
        tracing::debug!(%conn, connections = self.dispatcher.connection_count(), "connection attached");
    }

    /// Handles one raw inbound frame.
    ///
    /// This is the single place where per-message errors end up: frames
    /// that don't decode are logged at `debug`, domain errors at `warn`.
    /// Either way the message is dropped and the connection stays open.
    pub fn handle_message(&mut self, conn: ConnectionId, bytes: &[u8]) {
        let msg = match ClientMessage::decode(&self.codec, bytes) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn, error = %e, "dropping undecodable message");
                return;
            }
        };

        let kind = msg.kind();
        if let Err(e) = self.dispatch(conn, msg) {
            tracing::warn!(%conn, %kind, error = %e, "message dropped");
        }
    }

    /// The transport connection closed.
    ///
    /// If the connection was logged in, the player's rooms are dropped,
    /// their unfinished games are abandoned with no winner, and everyone
    /// gets fresh room and leaderboard listings. The player record stays.
    pub fn disconnect(&mut self, conn: ConnectionId) {
        if let Err(e) = self.cleanup(conn) {
            tracing::warn!(%conn, error = %e, "disconnect cleanup failed");
        }
    }

    fn cleanup(&mut self, conn: ConnectionId) -> Result<(), SalvoError> {
        self.dispatcher.detach(conn);
        let Some(player) = self.directory.unbind(conn) else {
            tracing::debug!(%conn, "anonymous connection closed");
            return Ok(());
        };
        tracing::info!(%conn, player_id = %player, "player disconnected");

        self.take_offline(player)?;
        self.broadcast_rooms()?;
        self.broadcast_winners()
    }

    /// Drops an offline player's rooms and abandons their unfinished
    /// games. Each opponent gets `finish` with no winner.
    fn take_offline(&mut self, player: PlayerId) -> Result<(), SalvoError> {
        self.rooms.remove_player(player);

        let no_winner = ServerMessage::Finish(FinishData { win_player: None });
        for session in self.games.forfeit_player(player) {
            if let Some(peer) = session.opponent_of(player) {
                self.send_to_player(peer, &no_winner)?;
            }
        }
        Ok(())
    }

    /// Applies one decoded client message.
    ///
    /// # Errors
    /// Any lookup or rule failure from the stores, a message from a
    /// connection that isn't logged in, or a message on behalf of another
    /// player. Registration failures the client must hear about are
    /// answered here and are not errors.
    pub fn dispatch(&mut self, conn: ConnectionId, msg: ClientMessage) -> Result<(), SalvoError> {
        match msg {
            ClientMessage::Register(req) => self.register(conn, req),
            ClientMessage::CreateRoom => self.create_room(conn),
            ClientMessage::AddUserToRoom(req) => self.add_user_to_room(conn, req),
            ClientMessage::AddShips(req) => self.add_ships(conn, req),
            ClientMessage::Attack(req) => self.attack(conn, req),
            ClientMessage::RandomAttack(req) => self.random_attack(conn, req, &mut rand::rng()),
        }
    }

    // =====================================================================
    // Handlers
    // =====================================================================

    fn register(&mut self, conn: ConnectionId, req: RegRequest) -> Result<(), SalvoError> {
        let previous = self.directory.player_of(conn);
        let dispatcher = &self.dispatcher;
        let result = self
            .directory
            .register(&req.name, &req.password, conn, |c| dispatcher.is_open(c))
            .map(|player| (player.id, player.name.clone()));

        match result {
            Ok((id, name)) => {
                self.dispatcher
                    .send_to(conn, &ServerMessage::Registered(RegResponse::accepted(name, id)))?;
                // Logging in as someone else leaves the old identity offline.
                if let Some(old) = previous.filter(|&old| old != id) {
                    tracing::info!(%conn, player_id = %old, new_player_id = %id, "connection switched player");
                    self.take_offline(old)?;
                }
                self.broadcast_rooms()?;
                self.broadcast_winners()
            }
            Err(e) if e.is_user_facing() => {
                tracing::info!(%conn, name = %req.name, reason = %e, "registration refused");
                let reply = RegResponse::rejected(req.name, e.to_string());
                self.dispatcher.send_to(conn, &ServerMessage::Registered(reply))?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn create_room(&mut self, conn: ConnectionId) -> Result<(), SalvoError> {
        let (player, name) = self.logged_in(conn)?;
        self.rooms.create_room(player, &name);
        self.broadcast_rooms()
    }

    fn add_user_to_room(
        &mut self,
        conn: ConnectionId,
        req: AddUserToRoomRequest,
    ) -> Result<(), SalvoError> {
        let (player, name) = self.logged_in(conn)?;
        match self.rooms.join(player, &name, req.index_room)? {
            JoinOutcome::Matched(room) => {
                self.create_game(&room)?;
                self.broadcast_rooms()
            }
            JoinOutcome::AlreadyMember(room) => {
                tracing::debug!(room_id = %room.id, player_id = %player, "already in room");
                Ok(())
            }
        }
    }

    /// Opens a game for a freshly matched room and tells both players
    /// their ids.
    fn create_game(&mut self, room: &Room) -> Result<(), SalvoError> {
        let members: Vec<PlayerId> = room.player_ids().collect();
        let &[first, second] = members.as_slice() else {
            tracing::debug!(room_id = %room.id, members = members.len(), "room not ready for a game");
            return Ok(());
        };

        let game = self.games.create_game([first, second]);
        for player in [first, second] {
            let msg = ServerMessage::CreateGame(CreateGameData {
                id_game: game,
                id_player: player,
            });
            self.send_to_player(player, &msg)?;
        }
        Ok(())
    }

    fn add_ships(&mut self, conn: ConnectionId, req: AddShipsRequest) -> Result<(), SalvoError> {
        let player = self.acting_as(conn, req.index_player)?;
        match self.games.add_ships(req.game_id, player, req.ships)? {
            Placement::Waiting => Ok(()),
            Placement::Started => self.start_game(req.game_id),
        }
    }

    /// Sends each player their own fleet and who moves first, then the
    /// opening turn.
    fn start_game(&self, game: GameId) -> Result<(), SalvoError> {
        let session = self
            .games
            .get(game)
            .ok_or(salvo_battle::BattleError::GameNotFound(game))?;
        let players = session.player_ids();

        for player in players {
            let ships = session
                .player(player)
                .map(|slot| slot.layouts())
                .unwrap_or_default();
            let msg = ServerMessage::StartGame(StartGameData {
                ships,
                current_player_index: session.turn(),
            });
            self.send_to_player(player, &msg)?;
        }

        let turn = ServerMessage::Turn(TurnData {
            current_player: session.turn(),
        });
        self.send_to_players(&players, &turn)
    }

    fn attack(&mut self, conn: ConnectionId, req: AttackRequest) -> Result<(), SalvoError> {
        let player = self.acting_as(conn, req.index_player)?;
        self.fire(req.game_id, player, Position::new(req.x, req.y))
    }

    pub(crate) fn random_attack<R: Rng + ?Sized>(
        &mut self,
        conn: ConnectionId,
        req: RandomAttackRequest,
        rng: &mut R,
    ) -> Result<(), SalvoError> {
        let player = self.acting_as(conn, req.index_player)?;
        match self.games.random_target(req.game_id, player, rng)? {
            Some(target) => self.fire(req.game_id, player, target),
            None => {
                tracing::debug!(game_id = %req.game_id, player_id = %player, "no cells left to attack");
                Ok(())
            }
        }
    }

    fn fire(&mut self, game: GameId, player: PlayerId, target: Position) -> Result<(), SalvoError> {
        match self.games.attack(game, player, target)? {
            AttackOutcome::Resolved(report) => self.announce_attack(report),
            AttackOutcome::Ignored(reason) => {
                tracing::debug!(game_id = %game, player_id = %player, %target, ?reason, "attack ignored");
                Ok(())
            }
        }
    }

    /// Tells both players what an attack did: the shot, any cells revealed
    /// around a wreck, the next turn, and the result if the game is over.
    fn announce_attack(&mut self, report: AttackReport) -> Result<(), SalvoError> {
        let shot = ServerMessage::Attack(AttackResult {
            position: report.position,
            current_player: report.attacker,
            status: report.status,
        });
        self.send_to_players(&report.players, &shot)?;

        for &cell in &report.fringe {
            let miss = ServerMessage::Attack(AttackResult {
                position: cell,
                current_player: report.attacker,
                status: AttackStatus::Miss,
            });
            self.send_to_players(&report.players, &miss)?;
        }

        let turn = ServerMessage::Turn(TurnData {
            current_player: report.next_turn,
        });
        self.send_to_players(&report.players, &turn)?;

        if let Some(winner) = report.winner {
            self.directory.record_win(winner)?;
            let finish = ServerMessage::Finish(FinishData {
                win_player: Some(winner),
            });
            self.send_to_players(&report.players, &finish)?;
            self.broadcast_winners()?;
        }
        Ok(())
    }

    // =====================================================================
    // Helpers
    // =====================================================================

    /// The player this connection is logged in as, with their name.
    fn logged_in(&self, conn: ConnectionId) -> Result<(PlayerId, String), SalvoError> {
        let player = self
            .directory
            .player_of(conn)
            .ok_or(CoordinatorError::ClientConnectionNotFound(conn))?;
        let name = self
            .directory
            .get(player)
            .map(|p| p.name.clone())
            .ok_or(IdentityError::PlayerNotFound(player))?;
        Ok((player, name))
    }

    /// Checks that `conn` may act as `claimed`.
    fn acting_as(&self, conn: ConnectionId, claimed: PlayerId) -> Result<PlayerId, CoordinatorError> {
        let bound = self
            .directory
            .player_of(conn)
            .ok_or(CoordinatorError::ClientConnectionNotFound(conn))?;
        if bound != claimed {
            return Err(CoordinatorError::PlayerMismatch {
                conn,
                bound,
                claimed,
            });
        }
        Ok(bound)
    }

    /// Sends to a player's current connection. Offline players miss out.
    fn send_to_player(&self, player: PlayerId, msg: &ServerMessage) -> Result<(), SalvoError> {
        match self.directory.connection_of(player) {
            Some(conn) => self.dispatcher.send_to(conn, msg)?,
            None => tracing::debug!(player_id = %player, kind = %msg.kind(), "player offline, message dropped"),
        }
        Ok(())
    }

    fn send_to_players(&self, players: &[PlayerId], msg: &ServerMessage) -> Result<(), SalvoError> {
        for &player in players {
            self.send_to_player(player, msg)?;
        }
        Ok(())
    }

    fn broadcast_rooms(&self) -> Result<(), SalvoError> {
        let free = self.rooms.free_rooms().map(Room::to_entry).collect();
        self.dispatcher.broadcast(&ServerMessage::UpdateRoom(free))?;
        Ok(())
    }

    fn broadcast_winners(&self) -> Result<(), SalvoError> {
        let rows = self
            .directory
            .leaderboard()
            .into_iter()
            .map(|p| WinnerEntry {
                name: p.name.clone(),
                wins: p.wins,
            })
            .collect();
        self.dispatcher.broadcast(&ServerMessage::UpdateWinners(rows))?;
        Ok(())
    }
}
