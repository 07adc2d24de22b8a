//! Identifiers and board types that travel inside message payloads.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A registered player's identifier.
///
/// Newtype wrapper around `u64` so a `PlayerId` can't be passed where a
/// `GameId` is expected, even though both are plain numbers on the wire.
/// `#[serde(transparent)]` serializes `PlayerId(3)` as just `3`.
///
/// Ids are handed out on first registration and stay with the player
/// name for the lifetime of the process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A matchmaking room's identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A game session's identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// Serde adapter for "a player, or nobody".
///
/// The protocol has no `null` for player slots: a missing player is the
/// number `-1` (a failed registration's `index`, a drawn game's
/// `winPlayer`). Any negative number decodes as `None`.
pub(crate) mod player_or_none {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<PlayerId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(id) => serializer.serialize_u64(id.0),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PlayerId>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(u64::try_from(raw).ok().map(PlayerId))
    }
}

// ---------------------------------------------------------------------------
// Board types
// ---------------------------------------------------------------------------

/// A cell on the board. `x` is the column, `y` the row, both from 0.
///
/// The protocol doesn't bound-check positions; the battle layer does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Which way a ship extends from its origin cell.
///
/// On the wire this is the boolean `direction` field: `true` means the
/// ship runs down the board (vertical), `false` means it runs to the
/// right (horizontal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl From<bool> for Orientation {
    fn from(vertical: bool) -> Self {
        if vertical {
            Self::Vertical
        } else {
            Self::Horizontal
        }
    }
}

impl From<Orientation> for bool {
    fn from(orientation: Orientation) -> Self {
        matches!(orientation, Orientation::Vertical)
    }
}

/// Size category the client attaches to each ship. Informational only:
/// the server trusts `length`, not the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipKind {
    Small,
    Medium,
    Large,
    Huge,
}

/// A ship as the client places it.
///
/// ```json
/// { "position": { "x": 2, "y": 4 }, "direction": false, "length": 3, "type": "large" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipLayout {
    /// Top-left-most occupied cell.
    pub position: Position,
    #[serde(rename = "direction")]
    pub orientation: Orientation,
    pub length: u8,
    #[serde(rename = "type")]
    pub kind: ShipKind,
}

/// Outcome of a single shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackStatus {
    /// Nothing there (also used for auto-revealed cells around a wreck).
    Miss,
    /// Hit a ship that still has live cells.
    Shot,
    /// Hit the last live cell of a ship.
    Killed,
}
