//! Room manager: creates rooms, matches players, and lists free rooms.

use std::collections::BTreeMap;

use salvo_protocol::{PlayerId, RoomId};

use crate::{Room, RoomError};

/// What a successful [`RoomManager::join`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The player took the second seat. The room is now full and the
    /// caller should start a game for it.
    Matched(Room),

    /// The player was already in the room. Nothing changed.
    AlreadyMember(Room),
}

impl JoinOutcome {
    pub fn room(&self) -> &Room {
        match self {
            Self::Matched(room) | Self::AlreadyMember(room) => room,
        }
    }
}

/// Holds every room that is waiting for players or was just matched.
///
/// Rooms are never reopened: once a room fills it stays in storage but
/// is no longer listed as free.
#[derive(Debug, Default)]
pub struct RoomManager {
    /// Rooms keyed by id. Ids grow monotonically, so iteration order is
    /// creation order.
    rooms: BTreeMap<RoomId, Room>,

    next_id: u64,
}

impl RoomManager {
    /// Creates a new, empty room manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new room with `player` as its only member.
    pub fn create_room(&mut self, player: PlayerId, name: &str) -> RoomId {
        let room_id = RoomId(self.next_id);
        self.next_id += 1;
        self.rooms.insert(room_id, Room::new(room_id, player, name));
        tracing::info!(%room_id, player_id = %player, "room created");
        room_id
    }

    /// Adds a player to a room.
    ///
    /// Joining a room the player is already in is a no-op. When the join
    /// fills the room, every other free room owned by either member is
    /// withdrawn: a matched player is no longer waiting anywhere else.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if no room has that id.
    /// - [`RoomError::RoomFull`] if the room already has two other players.
    pub fn join(
        &mut self,
        player: PlayerId,
        name: &str,
        room_id: RoomId,
    ) -> Result<JoinOutcome, RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        if room.contains(player) {
            return Ok(JoinOutcome::AlreadyMember(room.clone()));
        }
        if room.is_full() {
            return Err(RoomError::RoomFull(room_id));
        }

        room.push(player, name);
        let matched = room.clone();

        let before = self.rooms.len();
        self.rooms.retain(|id, other| {
            *id == room_id
                || !(other.is_free() && matched.player_ids().any(|p| other.contains(p)))
        });
        let withdrawn = before - self.rooms.len();

        tracing::info!(
            %room_id,
            player_id = %player,
            withdrawn,
            "room matched"
        );
        Ok(JoinOutcome::Matched(matched))
    }

    /// Rooms with exactly one member, in creation order.
    ///
    /// Computed on every call, so it always reflects the latest joins.
    pub fn free_rooms(&self) -> impl Iterator<Item = &Room> + '_ {
        self.rooms.values().filter(|r| r.is_free())
    }

    /// Drops every room the player is a member of, matched or not.
    ///
    /// Returns the ids of the removed rooms.
    pub fn remove_player(&mut self, player: PlayerId) -> Vec<RoomId> {
        let removed: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|r| r.contains(player))
            .map(|r| r.id)
            .collect();
        for room_id in &removed {
            self.rooms.remove(room_id);
            tracing::debug!(%room_id, player_id = %player, "room dropped");
        }
        removed
    }

    /// Returns a room by id.
    pub fn get(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    /// Returns the number of stored rooms, free or matched.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
