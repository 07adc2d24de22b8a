//! A single room and its members.

use salvo_protocol::{PlayerId, RoomEntry, RoomId, RoomUser};

/// How many players a room holds once matched.
pub const ROOM_CAPACITY: usize = 2;

/// A waiting room for one match.
///
/// Members are kept in join order: the creator first, the joiner second.
/// That order later decides who moves first in the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    members: Vec<RoomUser>,
}

impl Room {
    pub(crate) fn new(id: RoomId, creator: PlayerId, name: &str) -> Self {
        Self {
            id,
            members: vec![RoomUser {
                name: name.to_string(),
                index: creator,
            }],
        }
    }

    pub fn members(&self) -> &[RoomUser] {
        &self.members
    }

    /// Member ids in join order.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.members.iter().map(|m| m.index)
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.members.iter().any(|m| m.index == player)
    }

    /// A free room has exactly one member and is open for joining.
    pub fn is_free(&self) -> bool {
        self.members.len() == 1
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }

    pub(crate) fn push(&mut self, player: PlayerId, name: &str) {
        self.members.push(RoomUser {
            name: name.to_string(),
            index: player,
        });
    }

    /// The room as it appears in an `update_room` listing.
    pub fn to_entry(&self) -> RoomEntry {
        RoomEntry {
            room_id: self.id,
            room_users: self.members.clone(),
        }
    }
}
