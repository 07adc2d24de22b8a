//! The player directory: every known player plus live connection bindings.
//!
//! # Concurrency note
//!
//! `PlayerDirectory` is a plain single-owner struct. The coordinator task
//! owns it together with the room and game stores and applies one inbound
//! message at a time, so there is nothing to lock here.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use salvo_protocol::PlayerId;
use salvo_transport::ConnectionId;

use crate::{Credential, IdentityError, Player};

/// Registry of players and of which connection currently speaks for whom.
///
/// ```text
///             register()                    unbind()
/// [unknown] ─────────────→ [bound] ──────────────────→ [known, offline]
///                             ↑                              │
///                             └────────── register() ────────┘
/// ```
///
/// The two binding maps are kept as mirror images of each other so both
/// "who sent this?" and "where do I send this?" are single lookups.
#[derive(Debug, Default)]
pub struct PlayerDirectory {
    /// All players ever registered, ordered by id.
    players: BTreeMap<PlayerId, Player>,

    /// Name → id. Names are unique.
    names: HashMap<String, PlayerId>,

    /// Live connection → the player it is logged in as.
    by_connection: HashMap<ConnectionId, PlayerId>,

    /// Player → their live connection. Mirror of `by_connection`.
    by_player: HashMap<PlayerId, ConnectionId>,

    next_id: u64,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `connection` in as `name`, creating the player if the name is new.
    ///
    /// `is_open` tells the directory whether a previously bound connection
    /// can still be written to. A stale binding (the old connection died
    /// but its close hasn't been processed yet) doesn't block a new login.
    ///
    /// # Errors
    /// - [`IdentityError::CredentialMismatch`]: name exists, password differs.
    ///   Nothing is created or bound.
    /// - [`IdentityError::AlreadyConnected`]: the player is bound to another
    ///   connection that is still open.
    pub fn register(
        &mut self,
        name: &str,
        password: &str,
        connection: ConnectionId,
        is_open: impl Fn(ConnectionId) -> bool,
    ) -> Result<&Player, IdentityError> {
        let id = match self.names.get(name).copied() {
            Some(id) => {
                let player = self
                    .players
                    .get(&id)
                    .ok_or(IdentityError::PlayerNotFound(id))?;

                if !player.credential.matches(password) {
                    return Err(IdentityError::CredentialMismatch {
                        name: name.to_string(),
                    });
                }

                if let Some(&bound) = self.by_player.get(&id) {
                    if bound != connection && is_open(bound) {
                        return Err(IdentityError::AlreadyConnected {
                            id,
                            name: name.to_string(),
                        });
                    }
                }

                tracing::info!(player_id = %id, %connection, "player logged back in");
                id
            }
            None => {
                let id = PlayerId(self.next_id);
                self.next_id += 1;
                self.players.insert(
                    id,
                    Player {
                        id,
                        name: name.to_string(),
                        credential: Credential::new(password),
                        wins: 0,
                    },
                );
                self.names.insert(name.to_string(), id);
                tracing::info!(player_id = %id, %connection, name, "player registered");
                id
            }
        };

        self.bind(connection, id);
        self.players.get(&id).ok_or(IdentityError::PlayerNotFound(id))
    }

    /// Points `connection` and `player` at each other, dropping whatever
    /// either of them was bound to before.
    fn bind(&mut self, connection: ConnectionId, player: PlayerId) {
        if let Some(previous) = self.by_connection.insert(connection, player) {
            if previous != player {
                // The connection switched identities; the old player is
                // now offline.
                self.by_player.remove(&previous);
            }
        }
        if let Some(stale) = self.by_player.insert(player, connection) {
            if stale != connection {
                self.by_connection.remove(&stale);
            }
        }
    }

    /// Detaches a connection from its player, if it had one.
    ///
    /// Returns the player that went offline. The player record itself
    /// (name, password, wins) is kept.
    pub fn unbind(&mut self, connection: ConnectionId) -> Option<PlayerId> {
        let player = self.by_connection.remove(&connection)?;
        if self.by_player.get(&player) == Some(&connection) {
            self.by_player.remove(&player);
        }
        Some(player)
    }

    /// The player a connection is logged in as.
    pub fn player_of(&self, connection: ConnectionId) -> Option<PlayerId> {
        self.by_connection.get(&connection).copied()
    }

    /// The connection a player is currently using.
    pub fn connection_of(&self, player: PlayerId) -> Option<ConnectionId> {
        self.by_player.get(&player).copied()
    }

    pub fn get(&self, player: PlayerId) -> Option<&Player> {
        self.players.get(&player)
    }

    /// Credits a player with one more win. Returns the new total.
    ///
    /// # Errors
    /// Returns [`IdentityError::PlayerNotFound`] for an unknown id.
    pub fn record_win(&mut self, player: PlayerId) -> Result<u32, IdentityError> {
        let entry = self
            .players
            .get_mut(&player)
            .ok_or(IdentityError::PlayerNotFound(player))?;
        entry.wins += 1;
        tracing::info!(player_id = %player, wins = entry.wins, "win recorded");
        Ok(entry.wins)
    }

    /// Every known player, most wins first. Ties keep registration order.
    pub fn leaderboard(&self) -> Vec<&Player> {
        let mut rows: Vec<&Player> = self.players.values().collect();
        // `sort_by_key` is stable, so equal win counts stay in id order.
        rows.sort_by_key(|p| Reverse(p.wins));
        rows
    }

    /// Number of known players (online or not).
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
